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

use super::descriptor::DescriptorAllocator;
use super::queue::{Queue, QueueSet};
use crate::gpu::api::{
    AdapterInfo, ColorBufferDesc, CommandListType, DepthBufferDesc, DeviceCaps, FenceValue,
    GraphicsApi, QueueType,
};
use crate::gpu::context::{CommandContext, ComputeContext, ContextManager, ContextPoolStats, GraphicsContext};
use crate::gpu::error::{ContractViolation, GraphicsError};
use crate::gpu::log_target;
use crate::gpu::resource::{ColorBuffer, DepthBuffer};
use crate::gpu::traits::NativeDevice;
use std::fmt;
use std::sync::Arc;

/// Device-level switches taken from the configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DeviceOptions {
    /// Records debug events and markers into command lists.
    pub enable_debug_markers: bool,
    /// Logs the capability table once the device exists.
    pub log_device_caps: bool,
}

/// The logical device: the queues, the context pools and the descriptor heaps
/// built on one native device.
///
/// The device is created once per run. Dropping it blocks until every queue is
/// idle.
pub struct Device {
    api: GraphicsApi,
    adapter: AdapterInfo,
    caps: DeviceCaps,
    native: Arc<dyn NativeDevice>,
    queues: QueueSet,
    contexts: Arc<ContextManager>,
    descriptors: DescriptorAllocator,
}

impl Device {
    /// Builds the device layer on top of a freshly created native device.
    ///
    /// # Arguments
    ///
    /// * `api`: The API the native device belongs to.
    /// * `adapter`: The adapter the native device was created on.
    /// * `native`: The native device.
    /// * `options`: Debug-marker and logging switches.
    pub fn new(
        api: GraphicsApi,
        adapter: AdapterInfo,
        native: Arc<dyn NativeDevice>,
        options: DeviceOptions,
    ) -> Result<Self, GraphicsError> {
        let target = log_target(api);
        let caps = native.caps();
        if options.log_device_caps {
            caps.log_caps(target);
        }

        let queues = QueueSet::new(&native, api)?;
        let contexts = Arc::new(ContextManager::new(
            Arc::clone(&native),
            queues.clone(),
            options.enable_debug_markers,
            target,
        ));
        let descriptors = DescriptorAllocator::new(&queues);

        log::info!(target: target, "Created {} device on {}", api, adapter.name);

        Ok(Self {
            api,
            adapter,
            caps,
            native,
            queues,
            contexts,
            descriptors,
        })
    }

    /// The API the device runs on.
    pub fn api(&self) -> GraphicsApi {
        self.api
    }

    /// The adapter the device was created on.
    pub fn adapter(&self) -> &AdapterInfo {
        &self.adapter
    }

    /// Capabilities read at creation.
    pub fn caps(&self) -> &DeviceCaps {
        &self.caps
    }

    /// The native device.
    pub fn native(&self) -> &Arc<dyn NativeDevice> {
        &self.native
    }

    /// The descriptor heaps.
    pub fn descriptors(&self) -> &DescriptorAllocator {
        &self.descriptors
    }

    /// Returns the queue serving `queue_type`.
    pub fn queue(&self, queue_type: QueueType) -> &Arc<Queue> {
        self.queues.get(queue_type)
    }

    /// Starts recording a context of `list_type`.
    ///
    /// A non-empty `id` opens a debug event that `finish` closes.
    pub fn begin_context(
        &self,
        id: &str,
        list_type: CommandListType,
    ) -> Result<CommandContext, GraphicsError> {
        ContextManager::allocate(&self.contexts, list_type, id)
    }

    /// Starts recording a graphics context on the graphics queue.
    pub fn begin_graphics_context(&self, id: &str) -> Result<GraphicsContext, GraphicsError> {
        self.begin_context(id, CommandListType::Direct)
            .map(GraphicsContext::new)
    }

    /// Starts recording a compute context, on the compute queue when
    /// `async_compute` is set and on the graphics queue otherwise.
    pub fn begin_compute_context(
        &self,
        id: &str,
        async_compute: bool,
    ) -> Result<ComputeContext, GraphicsError> {
        let list_type = if async_compute {
            CommandListType::Compute
        } else {
            CommandListType::Direct
        };
        self.begin_context(id, list_type).map(ComputeContext::new)
    }

    /// Counters of the context pool for `list_type`.
    pub fn context_stats(&self, list_type: CommandListType) -> ContextPoolStats {
        self.contexts.stats(list_type)
    }

    /// Creates a color buffer.
    pub fn create_color_buffer(&self, desc: &ColorBufferDesc) -> Result<ColorBuffer, GraphicsError> {
        ColorBuffer::create(self, desc)
    }

    /// Creates a depth buffer.
    pub fn create_depth_buffer(&self, desc: &DepthBufferDesc) -> Result<DepthBuffer, GraphicsError> {
        DepthBuffer::create(self, desc)
    }

    fn queue_for_fence(&self, value: FenceValue) -> Result<&Arc<Queue>, GraphicsError> {
        match value.queue_type() {
            Some(queue_type) if queue_type != QueueType::Present => Ok(self.queues.get(queue_type)),
            _ => Err(ContractViolation::InvalidCreationParams(format!(
                "fence value {:#x} does not encode a submission queue",
                value.0
            ))
            .into()),
        }
    }

    /// Returns `true` if the queue that produced `value` has completed it.
    pub fn is_fence_complete(&self, value: FenceValue) -> bool {
        match self.queue_for_fence(value) {
            Ok(queue) => queue.is_fence_complete(value),
            Err(e) => {
                log::error!(target: log_target(self.api), "{e}");
                false
            }
        }
    }

    /// Blocks until the queue that produced `value` has completed it.
    pub fn wait_for_fence(&self, value: FenceValue) -> Result<(), GraphicsError> {
        self.queue_for_fence(value)?.wait_for_fence(value)
    }

    /// Blocks until every queue has finished its submitted work.
    pub fn wait_for_gpu_idle(&self) -> Result<(), GraphicsError> {
        for queue in self.queues.iter() {
            queue.wait_for_idle()?;
        }
        self.native.wait_idle().map_err(GraphicsError::Native)
    }
}

impl Drop for Device {
    fn drop(&mut self) {
        if let Err(e) = self.wait_for_gpu_idle() {
            log::error!(target: log_target(self.api), "Failed to idle the GPU before device destruction: {e}");
        }
        log::debug!(target: log_target(self.api), "Destroyed {} device", self.api);
    }
}

impl fmt::Debug for Device {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Device")
            .field("api", &self.api)
            .field("adapter", &self.adapter.name)
            .field("caps", &self.caps)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gpu::mock::MockDevice;

    fn device(mock: &Arc<MockDevice>, debug_markers: bool) -> Device {
        Device::new(
            GraphicsApi::Headless,
            AdapterInfo {
                name: "Mock".to_owned(),
                ..Default::default()
            },
            mock.clone(),
            DeviceOptions {
                enable_debug_markers: debug_markers,
                log_device_caps: true,
            },
        )
        .unwrap()
    }

    #[test]
    fn fences_route_to_their_producing_queue() {
        let mock = MockDevice::new();
        let device = device(&mock, false);

        let compute = device.begin_compute_context("", true).unwrap();
        let fence = compute.finish(false).unwrap();
        assert_eq!(fence.queue_type(), Some(QueueType::Compute));
        assert_eq!(mock.submissions(QueueType::Compute), 1);
        assert!(!device.is_fence_complete(fence));

        device.wait_for_fence(fence).unwrap();
        assert!(device.is_fence_complete(fence));
        assert_eq!(mock.waits(QueueType::Compute), 1);
        assert_eq!(mock.waits(QueueType::Graphics), 0);
    }

    #[test]
    fn compute_without_async_runs_on_the_graphics_queue() {
        let mock = MockDevice::new();
        let device = device(&mock, false);
        let fence = device.begin_compute_context("", false).unwrap().finish(false).unwrap();
        assert_eq!(fence.queue_type(), Some(QueueType::Graphics));
    }

    #[test]
    fn bundle_contexts_are_rejected() {
        let mock = MockDevice::new();
        let device = device(&mock, false);
        let err = device.begin_context("", CommandListType::Bundle).unwrap_err();
        assert!(matches!(err, GraphicsError::Contract(_)));
    }

    #[test]
    fn malformed_fence_values_are_rejected() {
        let mock = MockDevice::new();
        let device = device(&mock, false);
        let bogus = FenceValue(0xff << QueueType::FENCE_SHIFT);
        assert!(!device.is_fence_complete(bogus));
        assert!(device.wait_for_fence(bogus).is_err());
    }

    #[test]
    fn idle_waits_on_every_queue_with_work() {
        let mock = MockDevice::new();
        let device = device(&mock, false);
        device.begin_graphics_context("").unwrap().finish(false).unwrap();
        device.begin_context("", CommandListType::Copy).unwrap().finish(false).unwrap();

        device.wait_for_gpu_idle().unwrap();
        assert_eq!(mock.waits(QueueType::Graphics), 1);
        assert_eq!(mock.waits(QueueType::Copy), 1);
        assert_eq!(mock.waits(QueueType::Compute), 0);
    }

    #[test]
    fn context_id_opens_a_debug_event_when_markers_are_enabled() {
        let mock = MockDevice::new();
        let device = device(&mock, true);
        device.begin_graphics_context("Frame").unwrap().finish(false).unwrap();
        assert_eq!(mock.commands(), vec!["begin_event Frame".to_owned(), "end_event".to_owned()]);
    }

    #[test]
    fn debug_events_are_dropped_when_markers_are_disabled() {
        let mock = MockDevice::new();
        let device = device(&mock, false);
        let mut context = device.begin_graphics_context("Frame").unwrap();
        context.set_marker("ignored").unwrap();
        context.finish(false).unwrap();
        assert!(mock.commands().is_empty());
    }
}
