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

#![allow(dead_code)]

use kiln_core::gpu::api::{DeviceManagerConfig, GraphicsApi};
use kiln_core::gpu::{Device, DeviceManager};
use kiln_core::platform::PlatformHandles;
use kiln_infra::graphics::headless::{HeadlessBackend, HeadlessDevice};
use std::sync::Arc;

pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

pub fn config() -> DeviceManagerConfig {
    DeviceManagerConfig {
        app_name: "kiln-tests".to_string(),
        graphics_api: GraphicsApi::Headless,
        back_buffer_width: 64,
        back_buffer_height: 64,
        log_device_caps: false,
        ..Default::default()
    }
}

pub fn manager(backend: &HeadlessBackend) -> DeviceManager {
    DeviceManager::new(config(), PlatformHandles::headless(), Arc::new(backend.clone()))
}

/// Brings a manager over `backend` all the way to `Ready`.
pub fn start(backend: &HeadlessBackend) -> DeviceManager {
    init_logging();
    let mut manager = manager(backend);
    manager
        .create_device_and_swap_chain()
        .expect("headless startup should succeed");
    manager
}

pub fn device(manager: &DeviceManager) -> Arc<Device> {
    Arc::clone(manager.device().expect("manager should own a device"))
}

pub fn native(backend: &HeadlessBackend) -> Arc<HeadlessDevice> {
    backend.device().expect("headless device should be alive")
}
