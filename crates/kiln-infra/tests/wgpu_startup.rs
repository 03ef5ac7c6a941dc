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

#![cfg(feature = "graphics")]

mod common;

use kiln_core::gpu::api::{DeviceManagerConfig, GraphicsApi, ResourceState};
use kiln_core::gpu::{DeviceManager, DeviceManagerState, GraphicsError};
use kiln_core::platform::PlatformHandles;
use kiln_infra::create_backend;

fn try_start(api: GraphicsApi) -> Option<DeviceManager> {
    common::init_logging();
    let config = DeviceManagerConfig {
        graphics_api: api,
        back_buffer_width: 128,
        back_buffer_height: 72,
        allow_software_device: true,
        ..Default::default()
    };
    let mut manager = DeviceManager::new(config, PlatformHandles::headless(), create_backend(api));
    match manager.create_device_and_swap_chain() {
        Ok(()) => Some(manager),
        Err(GraphicsError::InstanceCreationFailed(e)) => {
            println!("Skipping test: {api} is not available ({e}).");
            None
        }
        Err(GraphicsError::NoSuitableAdapter) => {
            println!("Skipping test: no {api} adapter available.");
            None
        }
        Err(e) => panic!("{api} startup failed: {e}"),
    }
}

#[test]
fn offscreen_frames_render_on_a_real_gpu() {
    for api in [GraphicsApi::Vulkan, GraphicsApi::D3D12] {
        let Some(mut manager) = try_start(api) else {
            continue;
        };
        assert_eq!(manager.state(), DeviceManagerState::Ready);
        let device = common::device(&manager);

        for _ in 0..3 {
            manager.begin_frame().unwrap();
            let swap_chain = manager.swap_chain().unwrap();
            let back_buffer = swap_chain.current_back_buffer();
            let mut context = device.begin_graphics_context("Frame").unwrap();
            context.clear_color_with(back_buffer, [0.1, 0.2, 0.3, 1.0]).unwrap();
            context
                .transition_resource(back_buffer, ResourceState::PRESENT, false)
                .unwrap();
            let fence = context.finish(false).unwrap();
            manager.present(fence).unwrap();
        }

        drop(device);
        manager.shutdown();
        assert_eq!(manager.state(), DeviceManagerState::Uninitialized);
    }
}
