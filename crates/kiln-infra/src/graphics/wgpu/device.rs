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

use super::backend::WgpuFlavour;
use super::command::{WgpuCommandAllocator, WgpuCommandList};
use super::conversions::IntoWgpu;
use super::image::{WgpuImage, WgpuImageView};
use super::swap_chain::WgpuSwapChain;
use anyhow::{Context, Result};
use kiln_core::gpu::api::{
    ApiVersion, CommandListType, DeviceCaps, FenceValue, ImageDesc, ImageViewDesc, QueueType,
    SwapChainDesc,
};
use kiln_core::gpu::error::NativeError;
use kiln_core::gpu::log_target;
use kiln_core::gpu::traits::{
    DeviceDesc, NativeCommandAllocator, NativeCommandList, NativeDevice, NativeImage,
    NativeImageView, NativeQueue, NativeSwapChain,
};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// A logical device created through wgpu.
///
/// wgpu hands out a single queue per device. Every queue type of the device
/// layer submits through it, each with its own completion counter.
#[derive(Debug)]
pub struct WgpuDevice {
    flavour: WgpuFlavour,
    instance: wgpu::Instance,
    adapter: wgpu::Adapter,
    device: wgpu::Device,
    queue: wgpu::Queue,
    caps: DeviceCaps,
}

impl WgpuDevice {
    pub(crate) fn new(
        flavour: WgpuFlavour,
        app_name: &str,
        instance: wgpu::Instance,
        adapter: wgpu::Adapter,
        api_version: ApiVersion,
        desc: &DeviceDesc,
    ) -> Result<Self> {
        let target = log_target(flavour.api());
        let info = adapter.get_info();
        log::info!(target: target, "Creating device \"{}\" on \"{}\" for {}", desc.name, info.name, app_name);

        let required_features = adapter.features() & wgpu::Features::TIMESTAMP_QUERY;
        let (device, queue) = pollster::block_on(adapter.request_device(&wgpu::DeviceDescriptor {
            label: Some(&desc.name),
            required_features,
            required_limits: adapter.limits(),
            memory_hints: wgpu::MemoryHints::default(),
            trace: wgpu::Trace::default(),
            ..Default::default()
        }))
        .with_context(|| format!("failed to create logical device on \"{}\"", info.name))?;

        device.on_uncaptured_error(Arc::new(move |e| {
            log::error!(target: target, "wgpu uncaptured error: {e}");
        }));

        let limits = device.limits();
        let sample_flags = adapter
            .get_texture_format_features(wgpu::TextureFormat::Rgba8Unorm)
            .flags;
        let max_sample_count = [16, 8, 4, 2]
            .into_iter()
            .find(|&count| sample_flags.sample_count_supported(count))
            .unwrap_or(1);

        let caps = DeviceCaps {
            api_version,
            max_texture_dimension_2d: limits.max_texture_dimension_2d,
            max_texture_array_layers: limits.max_texture_array_layers,
            max_sample_count,
            supports_timestamp_queries: device.features().contains(wgpu::Features::TIMESTAMP_QUERY),
            // Confirmed per surface when the swap chain is configured.
            supports_tearing: true,
            num_device_nodes: 1,
        };

        Ok(Self {
            flavour,
            instance,
            adapter,
            device,
            queue,
            caps,
        })
    }

    /// The flavour the device was created with.
    pub fn flavour(&self) -> WgpuFlavour {
        self.flavour
    }

    /// The underlying wgpu device.
    pub fn wgpu_device(&self) -> &wgpu::Device {
        &self.device
    }

    fn target(&self) -> &'static str {
        log_target(self.flavour.api())
    }

    fn texture_usages(&self, format: wgpu::TextureFormat, requested: wgpu::TextureUsages) -> wgpu::TextureUsages {
        let allowed = self.adapter.get_texture_format_features(format).allowed_usages;
        let usages = (requested | wgpu::TextureUsages::COPY_SRC | wgpu::TextureUsages::COPY_DST) & allowed;
        if usages != requested | wgpu::TextureUsages::COPY_SRC | wgpu::TextureUsages::COPY_DST {
            log::debug!(
                target: self.target(),
                "{format:?} does not allow {:?}; creating with {usages:?}",
                requested - allowed
            );
        }
        usages
    }
}

impl NativeDevice for WgpuDevice {
    fn caps(&self) -> DeviceCaps {
        self.caps.clone()
    }

    fn create_queue(&self, queue_type: QueueType) -> Result<Box<dyn NativeQueue>, NativeError> {
        if queue_type == QueueType::Present {
            return Err(NativeError::new(
                "create_queue",
                "present work runs on the graphics queue",
            ));
        }
        Ok(Box::new(WgpuQueue {
            target_log: self.target(),
            queue_type,
            device: self.device.clone(),
            queue: self.queue.clone(),
            completed: Arc::new(AtomicU64::new(FenceValue::initial_completed(queue_type).0)),
        }))
    }

    fn create_command_allocator(
        &self,
        list_type: CommandListType,
    ) -> Result<Box<dyn NativeCommandAllocator>, NativeError> {
        Ok(Box::new(WgpuCommandAllocator::new(list_type)))
    }

    fn create_command_list(
        &self,
        list_type: CommandListType,
    ) -> Result<Box<dyn NativeCommandList>, NativeError> {
        Ok(Box::new(WgpuCommandList::new(list_type, self.device.clone())))
    }

    fn create_image(&self, desc: &ImageDesc) -> Result<Arc<dyn NativeImage>, NativeError> {
        let format: wgpu::TextureFormat = desc.format.into_wgpu().ok_or_else(|| {
            NativeError::new("create_texture", format!("\"{}\" has no format", desc.name))
        })?;
        if desc.width == 0 || desc.height == 0 || desc.array_size_or_depth == 0 {
            return Err(NativeError::new(
                "create_texture",
                format!("\"{}\" has a zero extent", desc.name),
            ));
        }
        let usage = self.texture_usages(format, desc.usage.into_wgpu());

        let texture = self.device.create_texture(&wgpu::TextureDescriptor {
            label: Some(&desc.name),
            size: wgpu::Extent3d {
                width: desc.width,
                height: desc.height,
                depth_or_array_layers: desc.array_size_or_depth,
            },
            mip_level_count: desc.num_mips.max(1),
            sample_count: desc.num_samples.max(1),
            dimension: desc.resource_type.into_wgpu(),
            format,
            usage,
            view_formats: &[],
        });
        log::debug!(
            target: self.target(),
            "Created texture \"{}\" {} x {} x {} {:?}",
            desc.name,
            desc.width,
            desc.height,
            desc.array_size_or_depth,
            format
        );
        Ok(Arc::new(WgpuImage::new(desc.name.clone(), desc.format, texture)))
    }

    fn create_image_view(
        &self,
        image: &Arc<dyn NativeImage>,
        desc: &ImageViewDesc,
    ) -> Result<Arc<dyn NativeImageView>, NativeError> {
        let image = image
            .as_any()
            .downcast_ref::<WgpuImage>()
            .ok_or_else(|| NativeError::new("create_view", "image belongs to another backend"))?;
        let view = image.texture().create_view(&wgpu::TextureViewDescriptor {
            label: Some(&desc.name),
            format: None,
            dimension: Some(desc.resource_type.into_wgpu()),
            aspect: desc.aspect.into_wgpu(),
            base_mip_level: desc.base_mip_level,
            mip_level_count: Some(desc.mip_count),
            base_array_layer: if desc.resource_type.is_volume() { 0 } else { desc.base_array_slice },
            array_layer_count: if desc.resource_type.is_volume() { None } else { Some(desc.array_size) },
            ..Default::default()
        });
        Ok(Arc::new(WgpuImageView::new(desc.clone(), image.texture().clone(), view)))
    }

    fn create_swap_chain(&self, desc: &SwapChainDesc) -> Result<Box<dyn NativeSwapChain>, NativeError> {
        let swap_chain = WgpuSwapChain::new(
            self.flavour,
            &self.instance,
            &self.adapter,
            &self.device,
            &self.queue,
            desc,
        )
        .map_err(|e| NativeError::new("create_swap_chain", format!("{e:#}")))?;
        Ok(Box::new(swap_chain))
    }

    fn wait_idle(&self) -> Result<(), NativeError> {
        self.device
            .poll(wgpu::PollType::wait_indefinitely())
            .map(|_| ())
            .map_err(|e| NativeError::new("poll", e.to_string()))
    }
}

/// One queue type's view of the wgpu queue.
///
/// The completion counter advances from `on_submitted_work_done` callbacks,
/// which run while the device is polled.
#[derive(Debug)]
pub struct WgpuQueue {
    target_log: &'static str,
    queue_type: QueueType,
    device: wgpu::Device,
    queue: wgpu::Queue,
    completed: Arc<AtomicU64>,
}

impl NativeQueue for WgpuQueue {
    fn queue_type(&self) -> QueueType {
        self.queue_type
    }

    fn submit(&self, list: &mut dyn NativeCommandList, signal: FenceValue) -> Result<(), NativeError> {
        if list.list_type().queue_type() != Some(self.queue_type) {
            return Err(NativeError::new(
                "submit",
                format!("{} list submitted to the {} queue", list.list_type(), self.queue_type),
            ));
        }
        let list = list
            .as_any_mut()
            .downcast_mut::<WgpuCommandList>()
            .ok_or_else(|| NativeError::new("submit", "command list belongs to another backend"))?;
        let buffer = list
            .take_finished()
            .ok_or_else(|| NativeError::new("submit", "command list was not closed"))?;

        self.queue.submit(std::iter::once(buffer));
        let completed = Arc::clone(&self.completed);
        self.queue.on_submitted_work_done(move || {
            completed.fetch_max(signal.0, Ordering::AcqRel);
        });
        Ok(())
    }

    fn completed_value(&self) -> FenceValue {
        // Runs pending completion callbacks without blocking.
        if let Err(e) = self.device.poll(wgpu::PollType::Poll) {
            log::warn!(target: self.target_log, "Failed to poll the {} queue: {e}", self.queue_type);
        }
        FenceValue(self.completed.load(Ordering::Acquire))
    }

    fn wait_for_value(&self, value: FenceValue) -> Result<(), NativeError> {
        while self.completed.load(Ordering::Acquire) < value.0 {
            self.device
                .poll(wgpu::PollType::wait_indefinitely())
                .map_err(|e| NativeError::new("poll", e.to_string()))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::super::backend::WgpuBackend;
    use super::*;
    use kiln_core::gpu::api::{Format, GpuImageUsage, ResourceState, ResourceType};
    use kiln_core::gpu::traits::{InstanceDesc, NativeBackend};

    fn device() -> Option<Arc<dyn NativeDevice>> {
        for flavour in [WgpuFlavour::Vulkan, WgpuFlavour::D3D12] {
            let Ok(instance) = WgpuBackend::new(flavour).create_instance(&InstanceDesc::default()) else {
                continue;
            };
            let Ok(adapters) = instance.adapters() else {
                continue;
            };
            if let Some(adapter) = adapters.first() {
                return instance.create_device(adapter, &DeviceDesc::default()).ok();
            }
        }
        None
    }

    #[test]
    fn submissions_complete_in_order() {
        let Some(device) = device() else {
            println!("Skipping test: no GPU adapter available.");
            return;
        };
        let queue = device.create_queue(QueueType::Graphics).unwrap();
        let mut allocator = device.create_command_allocator(CommandListType::Direct).unwrap();
        let mut list = device.create_command_list(CommandListType::Direct).unwrap();

        let mut value = FenceValue::initial_completed(QueueType::Graphics);
        for _ in 0..3 {
            value = value.next();
            list.reset(allocator.as_mut()).unwrap();
            list.set_marker("test");
            list.close().unwrap();
            queue.submit(list.as_mut(), value).unwrap();
        }
        queue.wait_for_value(value).unwrap();
        assert!(queue.completed_value() >= value);
        device.wait_idle().unwrap();
    }

    #[test]
    fn idle_queue_polls_report_the_initial_value() {
        let Some(device) = device() else {
            println!("Skipping test: no GPU adapter available.");
            return;
        };
        let queue = device.create_queue(QueueType::Compute).unwrap();
        for _ in 0..3 {
            assert_eq!(
                queue.completed_value(),
                FenceValue::initial_completed(QueueType::Compute)
            );
        }
    }

    #[test]
    fn images_and_views_are_created() {
        let Some(device) = device() else {
            println!("Skipping test: no GPU adapter available.");
            return;
        };
        let image = device
            .create_image(&ImageDesc {
                name: "Test Target".into(),
                resource_type: ResourceType::TEXTURE_2D,
                width: 16,
                height: 16,
                array_size_or_depth: 1,
                num_mips: 1,
                num_samples: 1,
                format: Format::RGBA8_UNorm,
                usage: GpuImageUsage::RENDER_TARGET | GpuImageUsage::SHADER_RESOURCE,
                initial_state: ResourceState::COMMON,
                clear_value: None,
            })
            .unwrap();
        assert_eq!(image.extent(), (16, 16, 1));
        assert_eq!(image.format(), Format::RGBA8_UNorm);
    }
}
