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

//! Concrete native graphics backends.
//!
//! - [`headless`]: an in-process simulated GPU for CI, tests and machines
//!   without a graphics adapter.
//! - [`wgpu`]: real GPUs through wgpu, in a D3D12 and a Vulkan flavour.

pub mod headless;
#[cfg(feature = "graphics")]
pub mod wgpu;

use kiln_core::gpu::api::GraphicsApi;
use kiln_core::gpu::traits::NativeBackend;
use std::sync::Arc;

/// Returns the native backend implementing `api`.
///
/// Without the `graphics` feature only the headless backend is compiled in;
/// asking for another API then logs a warning and falls back to it.
pub fn create_backend(api: GraphicsApi) -> Arc<dyn NativeBackend> {
    match api {
        #[cfg(feature = "graphics")]
        GraphicsApi::D3D12 => Arc::new(self::wgpu::WgpuBackend::new(self::wgpu::WgpuFlavour::D3D12)),
        #[cfg(feature = "graphics")]
        GraphicsApi::Vulkan => Arc::new(self::wgpu::WgpuBackend::new(self::wgpu::WgpuFlavour::Vulkan)),
        GraphicsApi::Headless => Arc::new(headless::HeadlessBackend::new()),
        #[cfg(not(feature = "graphics"))]
        other => {
            log::warn!(
                target: kiln_core::gpu::LOG_GRAPHICS,
                "{other} support is not compiled in (enable the \"graphics\" feature), using the headless GPU"
            );
            Arc::new(headless::HeadlessBackend::new())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_api_maps_to_its_backend() {
        assert_eq!(create_backend(GraphicsApi::Headless).api(), GraphicsApi::Headless);
        #[cfg(feature = "graphics")]
        {
            assert_eq!(create_backend(GraphicsApi::D3D12).api(), GraphicsApi::D3D12);
            assert_eq!(create_backend(GraphicsApi::Vulkan).api(), GraphicsApi::Vulkan);
        }
    }
}
