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

use super::device::HeadlessDevice;
use super::journal::HeadlessJournal;
use super::timeline::{CompletionMode, Timeline};
use kiln_core::gpu::api::{
    AdapterClass, AdapterInfo, ApiVersion, DeviceCaps, GraphicsApi, HardwareVendor,
    QueueFamilyProperties,
};
use kiln_core::gpu::error::NativeError;
use kiln_core::gpu::traits::{DeviceDesc, InstanceDesc, NativeBackend, NativeDevice, NativeInstance};
use kiln_core::gpu::LOG_GRAPHICS;
use std::sync::{Arc, Mutex, PoisonError, Weak};
use std::time::Duration;

/// An adapter the headless instance reports.
#[derive(Debug, Clone)]
pub struct HeadlessAdapter {
    info: AdapterInfo,
    probe: Result<ApiVersion, String>,
}

impl HeadlessAdapter {
    /// An adapter of the given class that probes successfully at version 1.0.
    pub fn new(name: impl Into<String>, class: AdapterClass) -> Self {
        Self {
            info: AdapterInfo {
                name: name.into(),
                class,
                ..Default::default()
            },
            probe: Ok(ApiVersion::new(1, 0, 0)),
        }
    }

    /// Sets the dedicated video memory, in MiB.
    pub fn memory_mib(mut self, memory_mib: u64) -> Self {
        self.info.dedicated_video_memory = memory_mib << 20;
        self
    }

    /// Sets the PCI vendor and device ids.
    pub fn ids(mut self, vendor_id: u32, device_id: u32) -> Self {
        self.info.vendor_id = vendor_id;
        self.info.device_id = device_id;
        self.info.vendor = HardwareVendor::from_vendor_id(vendor_id);
        self
    }

    /// Sets the version the probe reports.
    pub fn api_version(mut self, version: ApiVersion) -> Self {
        self.probe = Ok(version);
        self
    }

    /// Makes the probe fail with `reason`.
    pub fn probe_failure(mut self, reason: impl Into<String>) -> Self {
        self.probe = Err(reason.into());
        self
    }

    /// The adapter as enumeration reports it.
    pub fn info(&self) -> &AdapterInfo {
        &self.info
    }
}

impl Default for HeadlessAdapter {
    fn default() -> Self {
        Self::new("Kiln Headless GPU", AdapterClass::Discrete).memory_mib(4096)
    }
}

#[derive(Debug, Clone)]
struct HeadlessConfig {
    adapters: Vec<HeadlessAdapter>,
    queue_families: Option<Vec<QueueFamilyProperties>>,
    caps: DeviceCaps,
    completion: CompletionMode,
    wait_timeout: Duration,
    instance_failure: Option<String>,
    device_failure: Option<String>,
    swap_chain_failure: Option<String>,
}

fn default_caps() -> DeviceCaps {
    DeviceCaps {
        api_version: ApiVersion::new(1, 0, 0),
        max_texture_dimension_2d: 16384,
        max_texture_array_layers: 2048,
        max_sample_count: 8,
        supports_timestamp_queries: true,
        supports_tearing: true,
        num_device_nodes: 1,
    }
}

/// Configures a [`HeadlessBackend`].
///
/// ```
/// use kiln_infra::graphics::headless::{CompletionMode, HeadlessAdapter, HeadlessBackend};
/// use kiln_core::gpu::api::AdapterClass;
///
/// let backend = HeadlessBackend::builder()
///     .adapter(HeadlessAdapter::new("iGPU", AdapterClass::Integrated).memory_mib(512))
///     .completion(CompletionMode::Manual)
///     .build();
/// assert_eq!(backend.adapters().len(), 1);
/// ```
#[derive(Debug, Clone)]
pub struct HeadlessBackendBuilder {
    config: HeadlessConfig,
    default_adapter: bool,
}

impl HeadlessBackendBuilder {
    /// Adds an adapter. The first call replaces the default adapter.
    pub fn adapter(mut self, adapter: HeadlessAdapter) -> Self {
        if self.default_adapter {
            self.config.adapters.clear();
            self.default_adapter = false;
        }
        self.config.adapters.push(adapter);
        self
    }

    /// Removes every adapter, including the default one.
    pub fn no_adapters(mut self) -> Self {
        self.config.adapters.clear();
        self.default_adapter = false;
        self
    }

    /// Exposes queue families, as a Vulkan-style API does.
    pub fn queue_families(mut self, families: Vec<QueueFamilyProperties>) -> Self {
        self.config.queue_families = Some(families);
        self
    }

    /// Sets the capabilities of created devices.
    pub fn caps(mut self, caps: DeviceCaps) -> Self {
        self.config.caps = caps;
        self
    }

    /// Chooses how submissions complete.
    pub fn completion(mut self, completion: CompletionMode) -> Self {
        self.config.completion = completion;
        self
    }

    /// Bounds fence waits in [`CompletionMode::Manual`], where nothing
    /// completes unless a test says so. A wait that runs out fails instead of
    /// hanging. Automatic waits always block until the timeline catches up.
    pub fn wait_timeout(mut self, timeout: Duration) -> Self {
        self.config.wait_timeout = timeout;
        self
    }

    /// Makes instance creation fail.
    pub fn instance_failure(mut self, reason: impl Into<String>) -> Self {
        self.config.instance_failure = Some(reason.into());
        self
    }

    /// Makes device creation fail.
    pub fn device_failure(mut self, reason: impl Into<String>) -> Self {
        self.config.device_failure = Some(reason.into());
        self
    }

    /// Makes swap-chain creation fail.
    pub fn swap_chain_failure(mut self, reason: impl Into<String>) -> Self {
        self.config.swap_chain_failure = Some(reason.into());
        self
    }

    /// Creates the backend.
    pub fn build(self) -> HeadlessBackend {
        HeadlessBackend {
            shared: Arc::new(Shared {
                config: self.config,
                journal: Arc::new(HeadlessJournal::new()),
                device: Mutex::new(Weak::new()),
            }),
        }
    }
}

impl Default for HeadlessBackendBuilder {
    fn default() -> Self {
        Self {
            config: HeadlessConfig {
                adapters: vec![HeadlessAdapter::default()],
                queue_families: None,
                caps: default_caps(),
                completion: CompletionMode::default(),
                wait_timeout: Duration::from_secs(5),
                instance_failure: None,
                device_failure: None,
                swap_chain_failure: None,
            },
            default_adapter: true,
        }
    }
}

#[derive(Debug)]
struct Shared {
    config: HeadlessConfig,
    journal: Arc<HeadlessJournal>,
    device: Mutex<Weak<HeadlessDevice>>,
}

/// The in-process simulated GPU.
///
/// Clones share the same journal and device slot.
#[derive(Debug, Clone)]
pub struct HeadlessBackend {
    shared: Arc<Shared>,
}

impl HeadlessBackend {
    /// A backend with one discrete 4 GiB adapter and automatic completion.
    pub fn new() -> Self {
        Self::builder().build()
    }

    /// Starts configuring a backend.
    pub fn builder() -> HeadlessBackendBuilder {
        HeadlessBackendBuilder::default()
    }

    /// The adapters the backend reports.
    pub fn adapters(&self) -> &[HeadlessAdapter] {
        &self.shared.config.adapters
    }

    /// The journal shared by every device of this backend.
    pub fn journal(&self) -> &Arc<HeadlessJournal> {
        &self.shared.journal
    }

    /// The device created last, while it is alive.
    pub fn device(&self) -> Option<Arc<HeadlessDevice>> {
        self.shared
            .device
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .upgrade()
    }
}

impl Default for HeadlessBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl NativeBackend for HeadlessBackend {
    fn api(&self) -> GraphicsApi {
        GraphicsApi::Headless
    }

    fn create_instance(&self, desc: &InstanceDesc) -> Result<Arc<dyn NativeInstance>, NativeError> {
        if let Some(reason) = &self.shared.config.instance_failure {
            return Err(NativeError::new("create_instance", reason.clone()));
        }
        log::debug!(
            target: LOG_GRAPHICS,
            "Headless instance for '{}' (validation: {})",
            desc.app_name,
            desc.enable_validation
        );
        Ok(Arc::new(HeadlessInstance {
            shared: Arc::clone(&self.shared),
        }))
    }
}

#[derive(Debug)]
struct HeadlessInstance {
    shared: Arc<Shared>,
}

impl HeadlessInstance {
    fn adapter(&self, info: &AdapterInfo) -> Result<&HeadlessAdapter, NativeError> {
        self.shared
            .config
            .adapters
            .get(info.index)
            .ok_or_else(|| NativeError::new("adapter", format!("no adapter at index {}", info.index)))
    }
}

impl NativeInstance for HeadlessInstance {
    fn api(&self) -> GraphicsApi {
        GraphicsApi::Headless
    }

    fn adapters(&self) -> Result<Vec<AdapterInfo>, NativeError> {
        Ok(self
            .shared
            .config
            .adapters
            .iter()
            .enumerate()
            .map(|(index, adapter)| AdapterInfo {
                index,
                ..adapter.info.clone()
            })
            .collect())
    }

    fn probe_adapter(&self, adapter: &AdapterInfo) -> Result<ApiVersion, NativeError> {
        self.adapter(adapter)?
            .probe
            .clone()
            .map_err(|reason| NativeError::new("probe_adapter", reason))
    }

    fn queue_families(&self, _adapter: &AdapterInfo) -> Option<Vec<QueueFamilyProperties>> {
        self.shared.config.queue_families.clone()
    }

    fn create_device(
        &self,
        adapter: &AdapterInfo,
        desc: &DeviceDesc,
    ) -> Result<Arc<dyn NativeDevice>, NativeError> {
        let config = &self.shared.config;
        if let Some(reason) = &config.device_failure {
            return Err(NativeError::new("create_device", reason.clone()));
        }
        self.adapter(adapter)?;

        let timeline = Timeline::new(
            config.completion,
            config.wait_timeout,
            Arc::clone(&self.shared.journal),
        )?;
        let caps = DeviceCaps {
            api_version: adapter.api_version,
            ..config.caps.clone()
        };
        let device = Arc::new(HeadlessDevice::new(
            desc.name.clone(),
            caps,
            Arc::clone(&self.shared.journal),
            timeline,
            config.swap_chain_failure.clone(),
        ));
        *self
            .shared
            .device
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = Arc::downgrade(&device);

        log::info!(
            target: LOG_GRAPHICS,
            "Headless device \"{}\" created on \"{}\" ({:?} completion)",
            desc.name,
            adapter.name,
            config.completion
        );
        Ok(device)
    }
}
