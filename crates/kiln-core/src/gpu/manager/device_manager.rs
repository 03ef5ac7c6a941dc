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

use super::swap_chain::SwapChain;
use crate::gpu::adapter::{enumerate_adapters, resolve_queue_families, select_adapter, SelectionPolicy};
use crate::gpu::api::{
    AdapterInfo, DeviceManagerConfig, FenceValue, GraphicsApi, PresentMode, ResourceState,
    SwapChainDesc,
};
use crate::gpu::device::{Device, DeviceOptions};
use crate::gpu::error::GraphicsError;
use crate::gpu::log_target;
use crate::gpu::traits::{DeviceDesc, InstanceDesc, NativeBackend, NativeInstance};
use crate::platform::PlatformHandles;
use std::fmt;
use std::sync::Arc;

/// The startup stages of a [`DeviceManager`], in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum DeviceManagerState {
    /// Nothing created yet.
    Uninitialized,
    /// The native instance exists.
    InstanceCreated,
    /// An adapter was selected and the device exists.
    DeviceCreated,
    /// The swap chain exists.
    SwapChainCreated,
    /// Startup is complete; frames may be rendered.
    Ready,
}

impl fmt::Display for DeviceManagerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// Orchestrates startup: instance, then device, then swap chain.
///
/// Every stage must succeed before the next one runs. A failing stage logs a
/// `Fatal:` error and returns it; nothing is retried and no partially created
/// device is kept.
pub struct DeviceManager {
    config: DeviceManagerConfig,
    handles: PlatformHandles,
    backend: Arc<dyn NativeBackend>,
    state: DeviceManagerState,
    instance: Option<Arc<dyn NativeInstance>>,
    device: Option<Arc<Device>>,
    swap_chain: Option<SwapChain>,
}

impl DeviceManager {
    /// Creates a manager that will drive `backend`.
    ///
    /// # Arguments
    ///
    /// * `config`: The startup configuration.
    /// * `handles`: The window and module handles from the shell.
    /// * `backend`: The native backend selected for this run.
    pub fn new(
        config: DeviceManagerConfig,
        handles: PlatformHandles,
        backend: Arc<dyn NativeBackend>,
    ) -> Self {
        if backend.api() != config.graphics_api {
            log::warn!(
                target: log_target(backend.api()),
                "Configuration requests {} but the {} backend was supplied",
                config.graphics_api,
                backend.api()
            );
        }
        Self {
            config,
            handles,
            backend,
            state: DeviceManagerState::Uninitialized,
            instance: None,
            device: None,
            swap_chain: None,
        }
    }

    /// The API of the backend being driven.
    pub fn api(&self) -> GraphicsApi {
        self.backend.api()
    }

    fn log_target(&self) -> &'static str {
        log_target(self.backend.api())
    }

    /// The current startup stage.
    pub fn state(&self) -> DeviceManagerState {
        self.state
    }

    /// The configuration in use.
    pub fn config(&self) -> &DeviceManagerConfig {
        &self.config
    }

    /// The device, once created.
    pub fn device(&self) -> Option<&Arc<Device>> {
        self.device.as_ref()
    }

    /// The adapter the device runs on, once created.
    pub fn adapter(&self) -> Option<&AdapterInfo> {
        self.device.as_deref().map(Device::adapter)
    }

    /// The swap chain, once created.
    pub fn swap_chain(&self) -> Option<&SwapChain> {
        self.swap_chain.as_ref()
    }

    /// The swap chain, once created.
    pub fn swap_chain_mut(&mut self) -> Option<&mut SwapChain> {
        self.swap_chain.as_mut()
    }

    fn invalid_state(&self, operation: &'static str) -> GraphicsError {
        log::error!(target: self.log_target(), "Cannot {operation} in state {}", self.state);
        GraphicsError::InvalidState {
            operation,
            state: self.state.to_string(),
        }
    }

    fn require(&self, operation: &'static str, state: DeviceManagerState) -> Result<(), GraphicsError> {
        if self.state == state {
            Ok(())
        } else {
            Err(self.invalid_state(operation))
        }
    }

    /// Creates the native instance. Does nothing if it already exists.
    pub fn create_instance(&mut self) -> Result<(), GraphicsError> {
        if self.state >= DeviceManagerState::InstanceCreated {
            return Ok(());
        }

        let desc = InstanceDesc {
            app_name: self.config.app_name.clone(),
            enable_validation: self.config.enable_validation,
            enable_debug_markers: self.config.enable_debug_markers,
        };
        let instance = self.backend.create_instance(&desc).map_err(|e| {
            log::error!(target: self.log_target(), "Fatal: Failed to create {} instance: {e}", self.api());
            GraphicsError::InstanceCreationFailed(e)
        })?;

        log::info!(target: self.log_target(), "Created {} instance for '{}'", self.api(), desc.app_name);
        self.instance = Some(instance);
        self.state = DeviceManagerState::InstanceCreated;
        Ok(())
    }

    /// Enumerates and selects an adapter, resolves its queue families and
    /// creates the device on it.
    pub fn create_device(&mut self) -> Result<(), GraphicsError> {
        self.require("create device", DeviceManagerState::InstanceCreated)?;
        let target = self.log_target();
        let instance = match &self.instance {
            Some(instance) => Arc::clone(instance),
            None => return Err(self.invalid_state("create device")),
        };

        let adapters = enumerate_adapters(instance.as_ref()).map_err(|e| {
            log::error!(target: target, "Fatal: Adapter enumeration failed: {e}");
            e
        })?;
        let policy = SelectionPolicy {
            prefer_discrete: self.config.prefer_discrete_device,
            allow_software: self.config.allow_software_device,
        };
        let adapter = select_adapter(&adapters, policy).cloned().ok_or_else(|| {
            log::error!(target: target, "Fatal: No suitable {} adapter found", self.api());
            GraphicsError::NoSuitableAdapter
        })?;
        log::info!(target: target, "Selected adapter {}", adapter);

        let queue_families = match instance.queue_families(&adapter) {
            Some(families) => Some(resolve_queue_families(&families).map_err(|e| {
                log::error!(target: target, "Fatal: {e}");
                e
            })?),
            None => None,
        };

        let desc = DeviceDesc {
            name: format!("{} Device", self.config.app_name),
            queue_families,
            enable_validation: self.config.enable_validation,
            enable_debug_markers: self.config.enable_debug_markers,
        };
        let native = instance.create_device(&adapter, &desc).map_err(|e| {
            log::error!(target: target, "Fatal: Failed to create device on \"{}\": {e}", adapter.name);
            GraphicsError::DeviceCreationFailed(e)
        })?;

        let options = DeviceOptions {
            enable_debug_markers: self.config.enable_debug_markers,
            log_device_caps: self.config.log_device_caps,
        };
        let device = Device::new(self.api(), adapter, native, options).map_err(|e| {
            log::error!(target: target, "Fatal: {e}");
            e
        })?;

        self.device = Some(Arc::new(device));
        self.state = DeviceManagerState::DeviceCreated;
        Ok(())
    }

    /// Creates the swap chain: presentable when a window was supplied,
    /// offscreen otherwise.
    pub fn create_swap_chain(&mut self) -> Result<(), GraphicsError> {
        self.require("create swap chain", DeviceManagerState::DeviceCreated)?;
        let target = self.log_target();
        let device = match &self.device {
            Some(device) => Arc::clone(device),
            None => return Err(self.invalid_state("create swap chain")),
        };

        let format = match self.api() {
            GraphicsApi::Vulkan => self.config.swap_chain_format.swap_chain_format_vulkan(),
            _ => self.config.swap_chain_format,
        };
        let mut present_mode = PresentMode::from_vsync(self.config.enable_vsync);
        if present_mode == PresentMode::Immediate && !device.caps().supports_tearing {
            log::warn!(target: target, "Tearing is not supported, presenting with vsync");
            present_mode = PresentMode::Fifo;
        }
        let initial_state = match self.api() {
            GraphicsApi::Vulkan => ResourceState::UNDEFINED,
            _ => ResourceState::PRESENT,
        };

        let desc = SwapChainDesc {
            window: self.handles.window.clone(),
            width: self.config.back_buffer_width,
            height: self.config.back_buffer_height,
            buffer_count: self.config.num_swap_chain_buffers,
            format,
            sample_count: self.config.swap_chain_sample_count,
            sample_quality: self.config.swap_chain_sample_quality,
            present_mode,
            allow_mode_switch: self.config.allow_mode_switch,
            max_frame_latency: self.config.max_frames_in_flight,
        };
        let swap_chain = SwapChain::new(
            &device,
            &desc,
            self.config.num_frame_sync_slots(),
            initial_state,
        )?;

        self.swap_chain = Some(swap_chain);
        self.state = DeviceManagerState::SwapChainCreated;
        Ok(())
    }

    /// Runs every remaining startup stage and enters [`DeviceManagerState::Ready`].
    pub fn create_device_and_swap_chain(&mut self) -> Result<(), GraphicsError> {
        if self.state < DeviceManagerState::InstanceCreated {
            self.create_instance()?;
        }
        if self.state < DeviceManagerState::DeviceCreated {
            self.create_device()?;
        }
        if self.state < DeviceManagerState::SwapChainCreated {
            self.create_swap_chain()?;
        }
        if self.state == DeviceManagerState::SwapChainCreated {
            log::info!(target: self.log_target(), "Device manager ready");
            self.state = DeviceManagerState::Ready;
        }
        Ok(())
    }

    fn ready_swap_chain(&mut self, operation: &'static str) -> Result<&mut SwapChain, GraphicsError> {
        self.require(operation, DeviceManagerState::Ready)?;
        if self.swap_chain.is_none() {
            return Err(self.invalid_state(operation));
        }
        self.swap_chain.as_mut().ok_or(GraphicsError::InvalidState {
            operation,
            state: DeviceManagerState::Ready.to_string(),
        })
    }

    /// Starts a frame. See [`SwapChain::begin_frame`].
    pub fn begin_frame(&mut self) -> Result<u32, GraphicsError> {
        self.ready_swap_chain("begin frame")?.begin_frame()
    }

    /// Presents the current frame. See [`SwapChain::present`].
    pub fn present(&mut self, fence: FenceValue) -> Result<(), GraphicsError> {
        self.ready_swap_chain("present")?.present(fence)
    }

    /// Blocks until the GPU has finished every submission. A no-op before
    /// the device exists.
    pub fn wait_for_gpu_idle(&self) -> Result<(), GraphicsError> {
        match &self.device {
            Some(device) => device.wait_for_gpu_idle(),
            None => Ok(()),
        }
    }

    /// Waits for the GPU, then releases the swap chain, the device and the
    /// instance, in that order.
    pub fn shutdown(&mut self) {
        if self.state == DeviceManagerState::Uninitialized {
            return;
        }
        if let Err(e) = self.wait_for_gpu_idle() {
            log::error!(target: self.log_target(), "Failed to idle the GPU at shutdown: {e}");
        }
        self.swap_chain = None;
        if let Some(device) = self.device.take() {
            if Arc::strong_count(&device) > 1 {
                log::warn!(target: self.log_target(), "Device is still referenced at shutdown");
            }
        }
        self.instance = None;
        self.state = DeviceManagerState::Uninitialized;
        log::info!(target: self.log_target(), "Device manager shut down");
    }
}

impl Drop for DeviceManager {
    fn drop(&mut self) {
        self.shutdown();
    }
}

impl fmt::Debug for DeviceManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DeviceManager")
            .field("api", &self.api())
            .field("state", &self.state)
            .field("handles", &self.handles)
            .field("device", &self.device)
            .field("swap_chain", &self.swap_chain)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gpu::api::{AdapterClass, QueueFamilyFlags, QueueFamilyProperties, QueueType};
    use crate::gpu::mock::{MockAdapter, MockBackend};

    fn manager(backend: MockBackend, config: DeviceManagerConfig) -> DeviceManager {
        DeviceManager::new(config, PlatformHandles::headless(), Arc::new(backend))
    }

    fn config() -> DeviceManagerConfig {
        DeviceManagerConfig {
            graphics_api: GraphicsApi::Headless,
            back_buffer_width: 64,
            back_buffer_height: 64,
            ..Default::default()
        }
    }

    #[test]
    fn startup_walks_every_state() {
        let backend = MockBackend::new(vec![
            MockAdapter::new("Integrated", AdapterClass::Integrated, 1024),
            MockAdapter::new("Discrete", AdapterClass::Discrete, 8192),
        ]);
        let mut manager = manager(backend, config());
        assert_eq!(manager.state(), DeviceManagerState::Uninitialized);

        manager.create_instance().unwrap();
        assert_eq!(manager.state(), DeviceManagerState::InstanceCreated);
        manager.create_instance().unwrap();
        assert_eq!(manager.state(), DeviceManagerState::InstanceCreated);

        manager.create_device().unwrap();
        assert_eq!(manager.state(), DeviceManagerState::DeviceCreated);
        assert_eq!(manager.adapter().map(|a| a.name.as_str()), Some("Discrete"));

        manager.create_device_and_swap_chain().unwrap();
        assert_eq!(manager.state(), DeviceManagerState::Ready);
        assert_eq!(manager.swap_chain().map(SwapChain::buffer_count), Some(3));
        assert_eq!(manager.swap_chain().map(SwapChain::frame_sync_slots), Some(3));
    }

    #[test]
    fn stages_cannot_be_skipped() {
        let backend = MockBackend::new(vec![MockAdapter::new("GPU", AdapterClass::Discrete, 1024)]);
        let mut manager = manager(backend, config());
        let err = manager.create_device().unwrap_err();
        assert!(matches!(err, GraphicsError::InvalidState { .. }));
        assert!(manager.begin_frame().is_err());
    }

    #[test]
    fn no_qualifying_adapter_is_fatal() {
        let backend = MockBackend::new(vec![MockAdapter::new("WARP", AdapterClass::Software, 0)]);
        let mut manager = manager(backend, config());
        let err = manager.create_device_and_swap_chain().unwrap_err();
        assert!(matches!(err, GraphicsError::NoSuitableAdapter));
        assert!(err.is_fatal());
        assert!(manager.device().is_none());
        assert_eq!(manager.state(), DeviceManagerState::InstanceCreated);
    }

    #[test]
    fn instance_failure_is_fatal() {
        let mut backend = MockBackend::new(Vec::new());
        backend.fail_instance = true;
        let mut manager = manager(backend, config());
        let err = manager.create_instance().unwrap_err();
        assert!(matches!(err, GraphicsError::InstanceCreationFailed(_)));
        assert_eq!(manager.state(), DeviceManagerState::Uninitialized);
    }

    #[test]
    fn missing_queue_family_is_fatal() {
        let backend = MockBackend::new(vec![MockAdapter::new("GPU", AdapterClass::Discrete, 1024)])
            .with_queue_families(vec![QueueFamilyProperties {
                flags: QueueFamilyFlags::GRAPHICS,
                queue_count: 1,
                supports_present: true,
            }]);
        let mut manager = manager(backend, config());
        let err = manager.create_device_and_swap_chain().unwrap_err();
        assert!(matches!(err, GraphicsError::QueueFamilyUnavailable(QueueType::Compute)));
        assert!(manager.device().is_none());
    }

    #[test]
    fn vsync_off_presents_immediately_when_tearing_is_supported() {
        let backend = MockBackend::new(vec![MockAdapter::new("GPU", AdapterClass::Discrete, 1024)]);
        let mut manager = manager(
            backend,
            DeviceManagerConfig {
                enable_vsync: false,
                ..config()
            },
        );
        manager.create_device_and_swap_chain().unwrap();
        assert_eq!(manager.swap_chain().map(SwapChain::present_mode), Some(PresentMode::Immediate));
    }

    #[test]
    fn frames_render_and_shutdown_idles_the_gpu() {
        let backend = MockBackend::new(vec![MockAdapter::new("GPU", AdapterClass::Discrete, 1024)]);
        let mock = Arc::clone(&backend.device);
        let mut manager = manager(backend, config());
        manager.create_device_and_swap_chain().unwrap();

        for _ in 0..4 {
            let index = manager.begin_frame().unwrap();
            let device = Arc::clone(manager.device().unwrap());
            let swap_chain = manager.swap_chain().unwrap();
            let back_buffer = swap_chain.back_buffer(index).unwrap();
            let mut context = device.begin_graphics_context("Frame").unwrap();
            context.clear_color(back_buffer).unwrap();
            context
                .transition_resource(back_buffer, ResourceState::PRESENT, false)
                .unwrap();
            let fence = context.finish(false).unwrap();
            manager.present(fence).unwrap();
        }
        assert_eq!(mock.presents(), 4);

        manager.shutdown();
        assert_eq!(manager.state(), DeviceManagerState::Uninitialized);
        assert!(manager.device().is_none());
        assert_eq!(mock.submissions(QueueType::Graphics), 4);
    }
}
