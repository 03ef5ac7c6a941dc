// Copyright 2025 eraflo
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use crate::gpu::api::{AdapterClass, AdapterInfo, ApiVersion};
use crate::gpu::error::GraphicsError;
use crate::gpu::log_target;
use crate::gpu::traits::NativeInstance;

/// Lists the adapters of `instance` that a device may be created on.
///
/// Every call re-queries the native stack. Each adapter is probed by creating
/// a throwaway device at the minimum level; adapters of class
/// [`AdapterClass::Other`], adapters whose probe fails and adapters below the
/// API's minimum version are left out. The native order is preserved.
pub fn enumerate_adapters(instance: &dyn NativeInstance) -> Result<Vec<AdapterInfo>, GraphicsError> {
    let api = instance.api();
    let target = log_target(api);
    let minimum = ApiVersion::minimum_for(api);

    let candidates = instance.adapters().map_err(|e| {
        log::error!(target: target, "Failed to enumerate adapters: {e}");
        GraphicsError::Native(e)
    })?;

    log::info!(target: target, "Enumerating {} adapters", api);
    let mut adapters = Vec::with_capacity(candidates.len());
    for mut adapter in candidates {
        if adapter.class == AdapterClass::Other {
            log::info!(target: target, "  Skipping adapter \"{}\": unsupported adapter class", adapter.name);
            continue;
        }

        let version = match instance.probe_adapter(&adapter) {
            Ok(version) => version,
            Err(e) => {
                log::warn!(target: target, "  Skipping adapter \"{}\": probe failed: {e}", adapter.name);
                continue;
            }
        };
        if version < minimum {
            log::info!(
                target: target,
                "  Skipping adapter \"{}\": API {version} is below the required {minimum}",
                adapter.name
            );
            continue;
        }

        adapter.api_version = version;
        log::info!(target: target, "  Adapter {}: {}", adapter.index, adapter);
        adapters.push(adapter);
    }
    Ok(adapters)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gpu::error::NativeError;
    use crate::gpu::mock::{MockAdapter, MockInstance};

    #[test]
    fn excluded_adapters_are_skipped_in_order() {
        let instance = MockInstance::new(vec![
            MockAdapter::new("Basic Render Driver", AdapterClass::Other, 0),
            MockAdapter::new("Integrated", AdapterClass::Integrated, 1024),
            MockAdapter::new("Broken", AdapterClass::Discrete, 8192)
                .probe(Err(NativeError::new("D3D12CreateDevice", "E_FAIL"))),
            MockAdapter::new("Discrete", AdapterClass::Discrete, 8192)
                .probe(Ok(ApiVersion::new(12, 1, 0))),
        ]);

        let adapters = enumerate_adapters(&instance).unwrap();
        let names: Vec<_> = adapters.iter().map(|a| a.name.as_str()).collect();
        assert_eq!(names, vec!["Integrated", "Discrete"]);
        assert_eq!(adapters[1].api_version, ApiVersion::new(12, 1, 0));
        assert_eq!(adapters[1].index, 3, "native index is kept");
    }

    #[test]
    fn every_call_enumerates_again() {
        let instance = MockInstance::new(vec![MockAdapter::new("GPU", AdapterClass::Discrete, 4096)]);
        assert_eq!(enumerate_adapters(&instance).unwrap(), enumerate_adapters(&instance).unwrap());
    }
}
