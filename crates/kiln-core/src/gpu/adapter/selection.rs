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

use crate::gpu::api::{AdapterClass, AdapterInfo};

/// The policy flags that drive adapter selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SelectionPolicy {
    /// Picks the discrete adapter with the most dedicated memory.
    pub prefer_discrete: bool,
    /// Allows software adapters at all.
    pub allow_software: bool,
}

impl Default for SelectionPolicy {
    fn default() -> Self {
        Self {
            prefer_discrete: true,
            allow_software: false,
        }
    }
}

/// Picks the adapter to create the device on.
///
/// 1. With `prefer_discrete`, the discrete adapter with the largest dedicated
///    memory (the first one on ties).
/// 2. Otherwise the first discrete adapter.
/// 3. Otherwise the first adapter of an allowed class.
///
/// Software adapters are never returned unless `allow_software` is set. The
/// result depends only on the order of `adapters` and on `policy`.
pub fn select_adapter(adapters: &[AdapterInfo], policy: SelectionPolicy) -> Option<&AdapterInfo> {
    let allowed = |adapter: &&AdapterInfo| match adapter.class {
        AdapterClass::Discrete | AdapterClass::Integrated => true,
        AdapterClass::Software => policy.allow_software,
        AdapterClass::Other => false,
    };
    let discrete = adapters
        .iter()
        .filter(|a| a.class == AdapterClass::Discrete);

    if policy.prefer_discrete {
        let largest = discrete.clone().fold(None, |best: Option<&AdapterInfo>, adapter| match best {
            Some(best) if best.dedicated_video_memory >= adapter.dedicated_video_memory => Some(best),
            _ => Some(adapter),
        });
        if largest.is_some() {
            return largest;
        }
    }

    discrete
        .clone()
        .next()
        .or_else(|| adapters.iter().find(allowed))
}
