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

//! Instance creation and adapter enumeration through wgpu.
//!
//! Each flavour pins wgpu to a single native backend (DX12 or Vulkan), so the
//! adapters, feature levels and queue layout reported upward are the ones of
//! that API.

use super::conversions::adapter_class;
use super::device::WgpuDevice;
use anyhow::{anyhow, Context, Result};
use kiln_core::gpu::api::{
    AdapterInfo, ApiVersion, GraphicsApi, HardwareVendor, QueueFamilyFlags, QueueFamilyProperties,
};
use kiln_core::gpu::error::NativeError;
use kiln_core::gpu::log_target;
use kiln_core::gpu::traits::{DeviceDesc, InstanceDesc, NativeBackend, NativeDevice, NativeInstance};
use std::sync::{Arc, Mutex, PoisonError};

/// The native API a wgpu backend is pinned to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WgpuFlavour {
    /// wgpu's DX12 backend.
    D3D12,
    /// wgpu's Vulkan backend.
    Vulkan,
}

impl WgpuFlavour {
    /// The device-layer API this flavour implements.
    pub const fn api(&self) -> GraphicsApi {
        match self {
            Self::D3D12 => GraphicsApi::D3D12,
            Self::Vulkan => GraphicsApi::Vulkan,
        }
    }

    /// The wgpu backend set the instance is restricted to.
    pub fn backends(&self) -> wgpu::Backends {
        match self {
            Self::D3D12 => wgpu::Backends::DX12,
            Self::Vulkan => wgpu::Backends::VULKAN,
        }
    }

    fn wgpu_backend(&self) -> wgpu::Backend {
        match self {
            Self::D3D12 => wgpu::Backend::Dx12,
            Self::Vulkan => wgpu::Backend::Vulkan,
        }
    }

    /// Vendor whose adapters are software rasterizers (WARP) on this flavour.
    fn software_vendor(&self) -> Option<u32> {
        match self {
            Self::D3D12 => Some(0x1414),
            Self::Vulkan => None,
        }
    }

    /// The version reported for adapters that pass the probe.
    fn supported_version(&self) -> ApiVersion {
        match self {
            Self::D3D12 => ApiVersion::new(12, 0, 0),
            Self::Vulkan => ApiVersion::new(1, 3, 0),
        }
    }

    /// The version reported for adapters that only reach downlevel support.
    fn downlevel_version(&self) -> ApiVersion {
        match self {
            Self::D3D12 => ApiVersion::new(10, 0, 0),
            Self::Vulkan => ApiVersion::new(1, 0, 0),
        }
    }
}

/// A native backend driving the GPU through wgpu.
#[derive(Debug, Clone, Copy)]
pub struct WgpuBackend {
    flavour: WgpuFlavour,
}

impl WgpuBackend {
    /// Creates a backend pinned to `flavour`.
    pub fn new(flavour: WgpuFlavour) -> Self {
        Self { flavour }
    }

    /// The flavour this backend is pinned to.
    pub fn flavour(&self) -> WgpuFlavour {
        self.flavour
    }
}

impl NativeBackend for WgpuBackend {
    fn api(&self) -> GraphicsApi {
        self.flavour.api()
    }

    fn create_instance(&self, desc: &InstanceDesc) -> Result<Arc<dyn NativeInstance>, NativeError> {
        let instance = WgpuInstance::new(self.flavour, desc)
            .map_err(|e| NativeError::new("Instance::new", format!("{e:#}")))?;
        Ok(Arc::new(instance))
    }
}

/// A wgpu instance restricted to one flavour.
///
/// Keeps the `wgpu::Adapter` handles from the last enumeration so devices can
/// be created on the adapter an [`AdapterInfo`] describes.
#[derive(Debug)]
pub(crate) struct WgpuInstance {
    flavour: WgpuFlavour,
    app_name: String,
    instance: wgpu::Instance,
    adapters: Mutex<Vec<wgpu::Adapter>>,
}

impl WgpuInstance {
    fn new(flavour: WgpuFlavour, desc: &InstanceDesc) -> Result<Self> {
        let target = log_target(flavour.api());
        let compiled = wgpu::Instance::enabled_backend_features();
        if !compiled.contains(flavour.backends()) {
            return Err(anyhow!(
                "wgpu was built without the {:?} backend (available: {:?})",
                flavour.wgpu_backend(),
                compiled
            ));
        }

        let mut flags = wgpu::InstanceFlags::empty();
        if desc.enable_validation {
            flags |= wgpu::InstanceFlags::VALIDATION;
        }
        if desc.enable_debug_markers {
            flags |= wgpu::InstanceFlags::DEBUG;
        }

        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: flavour.backends(),
            flags,
            ..Default::default()
        });
        log::info!(
            target: target,
            "Created wgpu instance for \"{}\" (backends: {:?}, flags: {:?})",
            desc.app_name,
            flavour.backends(),
            flags
        );

        Ok(Self {
            flavour,
            app_name: desc.app_name.clone(),
            instance,
            adapters: Mutex::new(Vec::new()),
        })
    }

    /// Requests one adapter per power preference and keeps the distinct ones
    /// that belong to this flavour.
    fn request_adapters(&self) -> Vec<wgpu::Adapter> {
        let requests = [
            (wgpu::PowerPreference::HighPerformance, false),
            (wgpu::PowerPreference::LowPower, false),
            (wgpu::PowerPreference::None, true),
        ];

        let mut adapters: Vec<wgpu::Adapter> = Vec::new();
        for (power_preference, force_fallback_adapter) in requests {
            let request = self.instance.request_adapter(&wgpu::RequestAdapterOptions {
                power_preference,
                force_fallback_adapter,
                compatible_surface: None,
            });
            let Ok(adapter) = pollster::block_on(request) else {
                continue;
            };
            let info = adapter.get_info();
            if info.backend != self.flavour.wgpu_backend() {
                continue;
            }
            let known = adapters.iter().any(|existing| {
                let existing = existing.get_info();
                existing.name == info.name
                    && existing.vendor == info.vendor
                    && existing.device == info.device
            });
            if !known {
                adapters.push(adapter);
            }
        }
        adapters
    }

    /// Returns the adapter an [`AdapterInfo`] from the last enumeration refers to.
    fn adapter(&self, info: &AdapterInfo) -> Result<wgpu::Adapter> {
        let adapters = self.adapters.lock().unwrap_or_else(PoisonError::into_inner);
        adapters
            .get(info.index)
            .cloned()
            .with_context(|| format!("adapter {} ({}) was not enumerated", info.index, info.name))
    }

    fn probe(&self, adapter: &wgpu::Adapter) -> Result<ApiVersion> {
        let (device, _queue) = pollster::block_on(adapter.request_device(&wgpu::DeviceDescriptor {
            label: Some("Kiln Probe Device"),
            required_features: wgpu::Features::empty(),
            required_limits: wgpu::Limits::downlevel_defaults(),
            memory_hints: wgpu::MemoryHints::MemoryUsage,
            trace: wgpu::Trace::Off,
            ..Default::default()
        }))
        .context("failed to create probe device")?;
        drop(device);

        if adapter.get_downlevel_capabilities().is_webgpu_compliant() {
            Ok(self.flavour.supported_version())
        } else {
            Ok(self.flavour.downlevel_version())
        }
    }
}

impl NativeInstance for WgpuInstance {
    fn api(&self) -> GraphicsApi {
        self.flavour.api()
    }

    fn adapters(&self) -> Result<Vec<AdapterInfo>, NativeError> {
        let adapters = self.request_adapters();
        let infos = adapters
            .iter()
            .enumerate()
            .map(|(index, adapter)| {
                let info = adapter.get_info();
                AdapterInfo {
                    index,
                    name: info.name.clone(),
                    vendor_id: info.vendor,
                    device_id: info.device,
                    vendor: HardwareVendor::from_vendor_id(info.vendor),
                    class: adapter_class(info.device_type, info.vendor, self.flavour.software_vendor()),
                    // wgpu does not report adapter memory budgets.
                    dedicated_video_memory: 0,
                    dedicated_system_memory: 0,
                    shared_system_memory: 0,
                    api_version: ApiVersion::default(),
                }
            })
            .collect();

        *self.adapters.lock().unwrap_or_else(PoisonError::into_inner) = adapters;
        Ok(infos)
    }

    fn probe_adapter(&self, adapter: &AdapterInfo) -> Result<ApiVersion, NativeError> {
        self.adapter(adapter)
            .and_then(|native| self.probe(&native))
            .map_err(|e| NativeError::new("request_device", format!("{e:#}")))
    }

    fn queue_families(&self, _adapter: &AdapterInfo) -> Option<Vec<QueueFamilyProperties>> {
        match self.flavour {
            WgpuFlavour::D3D12 => None,
            // wgpu exposes a single universal queue.
            WgpuFlavour::Vulkan => Some(vec![QueueFamilyProperties {
                flags: QueueFamilyFlags::all(),
                queue_count: 1,
                supports_present: true,
            }]),
        }
    }

    fn create_device(
        &self,
        adapter: &AdapterInfo,
        desc: &DeviceDesc,
    ) -> Result<Arc<dyn NativeDevice>, NativeError> {
        let native = self
            .adapter(adapter)
            .map_err(|e| NativeError::new("request_device", format!("{e:#}")))?;
        let device = WgpuDevice::new(
            self.flavour,
            &self.app_name,
            self.instance.clone(),
            native,
            adapter.api_version,
            desc,
        )
        .map_err(|e| NativeError::new("request_device", format!("{e:#}")))?;
        Ok(Arc::new(device))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flavours_pin_a_single_backend() {
        assert_eq!(WgpuFlavour::D3D12.api(), GraphicsApi::D3D12);
        assert_eq!(WgpuFlavour::Vulkan.backends(), wgpu::Backends::VULKAN);
        assert!(WgpuFlavour::Vulkan.supported_version() >= ApiVersion::minimum_for(GraphicsApi::Vulkan));
        assert!(WgpuFlavour::D3D12.supported_version() >= ApiVersion::minimum_for(GraphicsApi::D3D12));
        assert!(WgpuFlavour::Vulkan.downlevel_version() < ApiVersion::minimum_for(GraphicsApi::Vulkan));
        assert!(WgpuFlavour::D3D12.downlevel_version() < ApiVersion::minimum_for(GraphicsApi::D3D12));
    }

    #[test]
    fn vulkan_reports_one_universal_family() {
        let backend = WgpuBackend::new(WgpuFlavour::Vulkan);
        let Ok(instance) = backend.create_instance(&InstanceDesc::default()) else {
            println!("Skipping test: wgpu was built without Vulkan.");
            return;
        };
        let families = instance
            .queue_families(&AdapterInfo::default())
            .expect("Vulkan exposes queue families");
        assert_eq!(families.len(), 1);
        assert!(families[0].flags.contains(QueueFamilyFlags::GRAPHICS | QueueFamilyFlags::TRANSFER));
    }

    #[test]
    fn enumeration_reports_adapters_in_order() {
        let backend = WgpuBackend::new(WgpuFlavour::Vulkan);
        let Ok(instance) = backend.create_instance(&InstanceDesc::default()) else {
            println!("Skipping test: wgpu was built without Vulkan.");
            return;
        };
        let adapters = instance.adapters().unwrap();
        if adapters.is_empty() {
            println!("Skipping test: no Vulkan adapter available.");
            return;
        }
        for (position, adapter) in adapters.iter().enumerate() {
            assert_eq!(adapter.index, position);
            assert_eq!(adapter.vendor, HardwareVendor::from_vendor_id(adapter.vendor_id));
        }
        let version = instance.probe_adapter(&adapters[0]).unwrap();
        assert!(version.major >= 1);
    }
}
