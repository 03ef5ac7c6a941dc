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

//! In-memory native backend used by the unit tests of this crate.
//!
//! Submitted work never completes on its own: tests release fences with
//! [`MockDevice::complete`], or implicitly through a blocking wait.

use crate::gpu::api::*;
use crate::gpu::error::NativeError;
use crate::gpu::traits::*;
use std::any::Any;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// A barrier as seen by the mock command list.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct RecordedBarrier {
    pub image: String,
    pub kind: BarrierKind,
}

#[derive(Debug)]
pub(crate) struct MockState {
    completed: [AtomicU64; 3],
    submissions: [AtomicUsize; 3],
    waits: [AtomicUsize; 3],
    allocators_created: AtomicUsize,
    allocator_resets: AtomicUsize,
    images_created: AtomicUsize,
    presents: AtomicUsize,
    fail_allocator_reset: AtomicBool,
    barrier_batches: Mutex<Vec<Vec<RecordedBarrier>>>,
    commands: Mutex<Vec<String>>,
}

impl MockState {
    fn new() -> Self {
        Self {
            completed: QueueType::SUBMISSION.map(|q| AtomicU64::new(q.fence_base())),
            submissions: Default::default(),
            waits: Default::default(),
            allocators_created: AtomicUsize::new(0),
            allocator_resets: AtomicUsize::new(0),
            images_created: AtomicUsize::new(0),
            presents: AtomicUsize::new(0),
            fail_allocator_reset: AtomicBool::new(false),
            barrier_batches: Mutex::new(Vec::new()),
            commands: Mutex::new(Vec::new()),
        }
    }

    fn record(&self, command: String) {
        self.commands.lock().unwrap().push(command);
    }
}

/// A logical device whose GPU only progresses when a test says so.
#[derive(Debug)]
pub(crate) struct MockDevice {
    state: Arc<MockState>,
    caps: DeviceCaps,
}

impl MockDevice {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            state: Arc::new(MockState::new()),
            caps: DeviceCaps {
                api_version: ApiVersion::new(1, 0, 0),
                max_texture_dimension_2d: 16384,
                max_texture_array_layers: 2048,
                max_sample_count: 8,
                supports_timestamp_queries: true,
                supports_tearing: true,
                num_device_nodes: 1,
            },
        })
    }

    /// A closed command list recording into this device's journal.
    pub fn command_list(&self) -> MockCommandList {
        MockCommandList {
            state: Arc::clone(&self.state),
            list_type: CommandListType::Direct,
            recording: false,
        }
    }

    /// Marks every submission up to `value` on `queue` as executed.
    pub fn complete(&self, queue: QueueType, value: FenceValue) {
        self.state.completed[queue.index()].fetch_max(value.0, Ordering::SeqCst);
    }

    pub fn submissions(&self, queue: QueueType) -> usize {
        self.state.submissions[queue.index()].load(Ordering::SeqCst)
    }

    pub fn waits(&self, queue: QueueType) -> usize {
        self.state.waits[queue.index()].load(Ordering::SeqCst)
    }

    pub fn allocators_created(&self) -> usize {
        self.state.allocators_created.load(Ordering::SeqCst)
    }

    pub fn allocator_resets(&self) -> usize {
        self.state.allocator_resets.load(Ordering::SeqCst)
    }

    pub fn images_created(&self) -> usize {
        self.state.images_created.load(Ordering::SeqCst)
    }

    pub fn presents(&self) -> usize {
        self.state.presents.load(Ordering::SeqCst)
    }

    pub fn fail_allocator_resets(&self, fail: bool) {
        self.state.fail_allocator_reset.store(fail, Ordering::SeqCst);
    }

    /// Every `resource_barriers` call, in order.
    pub fn barrier_batches(&self) -> Vec<Vec<RecordedBarrier>> {
        self.state.barrier_batches.lock().unwrap().clone()
    }

    /// Every other recorded command, in order.
    pub fn commands(&self) -> Vec<String> {
        self.state.commands.lock().unwrap().clone()
    }
}

impl NativeDevice for MockDevice {
    fn caps(&self) -> DeviceCaps {
        self.caps.clone()
    }

    fn create_queue(&self, queue_type: QueueType) -> Result<Box<dyn NativeQueue>, NativeError> {
        Ok(Box::new(MockQueue {
            state: Arc::clone(&self.state),
            queue_type,
        }))
    }

    fn create_command_allocator(
        &self,
        list_type: CommandListType,
    ) -> Result<Box<dyn NativeCommandAllocator>, NativeError> {
        self.state.allocators_created.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(MockAllocator {
            state: Arc::clone(&self.state),
            list_type,
        }))
    }

    fn create_command_list(
        &self,
        list_type: CommandListType,
    ) -> Result<Box<dyn NativeCommandList>, NativeError> {
        Ok(Box::new(MockCommandList {
            state: Arc::clone(&self.state),
            list_type,
            recording: false,
        }))
    }

    fn create_image(&self, desc: &ImageDesc) -> Result<Arc<dyn NativeImage>, NativeError> {
        if desc.width == 0 || desc.height == 0 {
            return Err(NativeError::new("create_image", "zero-sized image"));
        }
        self.state.images_created.fetch_add(1, Ordering::SeqCst);
        Ok(Arc::new(MockImage {
            name: desc.name.clone(),
            format: desc.format,
            extent: (desc.width, desc.height, desc.array_size_or_depth),
        }))
    }

    fn create_image_view(
        &self,
        _image: &Arc<dyn NativeImage>,
        desc: &ImageViewDesc,
    ) -> Result<Arc<dyn NativeImageView>, NativeError> {
        Ok(Arc::new(MockImageView { desc: desc.clone() }))
    }

    fn create_swap_chain(&self, desc: &SwapChainDesc) -> Result<Box<dyn NativeSwapChain>, NativeError> {
        let buffers = (0..desc.buffer_count)
            .map(|i| {
                Arc::new(MockImage {
                    name: format!("Mock Back Buffer {i}"),
                    format: desc.format,
                    extent: (desc.width, desc.height, 1),
                }) as Arc<dyn NativeImage>
            })
            .collect();
        Ok(Box::new(MockSwapChain {
            state: Arc::clone(&self.state),
            buffers,
            format: desc.format,
            extent: (desc.width, desc.height),
            present_mode: desc.present_mode,
            next: 0,
        }))
    }

    fn wait_idle(&self) -> Result<(), NativeError> {
        Ok(())
    }
}

#[derive(Debug)]
pub(crate) struct MockQueue {
    state: Arc<MockState>,
    queue_type: QueueType,
}

impl NativeQueue for MockQueue {
    fn queue_type(&self) -> QueueType {
        self.queue_type
    }

    fn submit(&self, _list: &mut dyn NativeCommandList, _signal: FenceValue) -> Result<(), NativeError> {
        self.state.submissions[self.queue_type.index()].fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn completed_value(&self) -> FenceValue {
        FenceValue(self.state.completed[self.queue_type.index()].load(Ordering::SeqCst))
    }

    fn wait_for_value(&self, value: FenceValue) -> Result<(), NativeError> {
        self.state.waits[self.queue_type.index()].fetch_add(1, Ordering::SeqCst);
        self.state.completed[self.queue_type.index()].fetch_max(value.0, Ordering::SeqCst);
        Ok(())
    }
}

#[derive(Debug)]
pub(crate) struct MockAllocator {
    state: Arc<MockState>,
    list_type: CommandListType,
}

impl NativeCommandAllocator for MockAllocator {
    fn list_type(&self) -> CommandListType {
        self.list_type
    }

    fn reset(&mut self) -> Result<(), NativeError> {
        if self.state.fail_allocator_reset.load(Ordering::SeqCst) {
            return Err(NativeError::new("reset", "device removed"));
        }
        self.state.allocator_resets.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

#[derive(Debug)]
pub(crate) struct MockCommandList {
    state: Arc<MockState>,
    list_type: CommandListType,
    recording: bool,
}

impl NativeCommandList for MockCommandList {
    fn list_type(&self) -> CommandListType {
        self.list_type
    }

    fn reset(&mut self, _allocator: &mut dyn NativeCommandAllocator) -> Result<(), NativeError> {
        self.recording = true;
        Ok(())
    }

    fn close(&mut self) -> Result<(), NativeError> {
        self.recording = false;
        Ok(())
    }

    fn resource_barriers(&mut self, barriers: &[ResourceBarrier]) {
        let batch = barriers
            .iter()
            .map(|b| RecordedBarrier {
                image: b.image.name().to_owned(),
                kind: b.kind,
            })
            .collect();
        self.state.barrier_batches.lock().unwrap().push(batch);
    }

    fn copy_image(&mut self, dst: &dyn NativeImage, src: &dyn NativeImage) {
        self.state.record(format!("copy {} -> {}", src.name(), dst.name()));
    }

    fn clear_color(&mut self, view: &dyn NativeImageView, color: [f32; 4]) {
        self.state.record(format!("clear_color {} {:?}", view.desc().name, color));
    }

    fn clear_depth_stencil(&mut self, view: &dyn NativeImageView, depth: Option<f32>, stencil: Option<u8>) {
        self.state.record(format!(
            "clear_depth_stencil {} {:?} {:?}",
            view.desc().name,
            depth,
            stencil
        ));
    }

    fn clear_unordered_access(&mut self, image: &dyn NativeImage) {
        self.state.record(format!("clear_uav {}", image.name()));
    }

    fn begin_event(&mut self, label: &str) {
        self.state.record(format!("begin_event {label}"));
    }

    fn end_event(&mut self) {
        self.state.record("end_event".to_owned());
    }

    fn set_marker(&mut self, label: &str) {
        self.state.record(format!("marker {label}"));
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

#[derive(Debug)]
pub(crate) struct MockImage {
    name: String,
    format: Format,
    extent: (u32, u32, u32),
}

impl MockImage {
    pub fn shared(name: &str, format: Format) -> Arc<dyn NativeImage> {
        Arc::new(Self {
            name: name.to_owned(),
            format,
            extent: (64, 64, 1),
        })
    }
}

impl NativeImage for MockImage {
    fn name(&self) -> &str {
        &self.name
    }

    fn format(&self) -> Format {
        self.format
    }

    fn extent(&self) -> (u32, u32, u32) {
        self.extent
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

#[derive(Debug)]
pub(crate) struct MockImageView {
    desc: ImageViewDesc,
}

impl NativeImageView for MockImageView {
    fn desc(&self) -> &ImageViewDesc {
        &self.desc
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

#[derive(Debug)]
pub(crate) struct MockSwapChain {
    state: Arc<MockState>,
    buffers: Vec<Arc<dyn NativeImage>>,
    format: Format,
    extent: (u32, u32),
    present_mode: PresentMode,
    next: u32,
}

impl NativeSwapChain for MockSwapChain {
    fn buffer_count(&self) -> u32 {
        self.buffers.len() as u32
    }

    fn format(&self) -> Format {
        self.format
    }

    fn extent(&self) -> (u32, u32) {
        self.extent
    }

    fn present_mode(&self) -> PresentMode {
        self.present_mode
    }

    fn buffer(&self, index: u32) -> Result<Arc<dyn NativeImage>, NativeError> {
        self.buffers
            .get(index as usize)
            .cloned()
            .ok_or_else(|| NativeError::new("buffer", format!("no back buffer {index}")))
    }

    fn acquire_next_image(&mut self) -> Result<u32, NativeError> {
        Ok(self.next)
    }

    fn present(&mut self, index: u32) -> Result<(), NativeError> {
        self.state.presents.fetch_add(1, Ordering::SeqCst);
        self.next = (index + 1) % self.buffer_count();
        Ok(())
    }
}

/// An adapter the mock instance reports, with the outcome of its probe.
#[derive(Debug, Clone)]
pub(crate) struct MockAdapter {
    pub info: AdapterInfo,
    pub probe: Result<ApiVersion, NativeError>,
}

impl MockAdapter {
    pub fn new(name: &str, class: AdapterClass, memory_mib: u64) -> Self {
        Self {
            info: AdapterInfo {
                name: name.to_owned(),
                class,
                dedicated_video_memory: memory_mib << 20,
                ..Default::default()
            },
            probe: Ok(ApiVersion::new(1, 0, 0)),
        }
    }

    pub fn probe(mut self, probe: Result<ApiVersion, NativeError>) -> Self {
        self.probe = probe;
        self
    }
}

#[derive(Debug)]
pub(crate) struct MockBackend {
    adapters: Vec<MockAdapter>,
    queue_families: Option<Vec<QueueFamilyProperties>>,
    pub device: Arc<MockDevice>,
    pub fail_instance: bool,
}

impl MockBackend {
    pub fn new(adapters: Vec<MockAdapter>) -> Self {
        Self {
            adapters,
            queue_families: None,
            device: MockDevice::new(),
            fail_instance: false,
        }
    }

    pub fn with_queue_families(mut self, families: Vec<QueueFamilyProperties>) -> Self {
        self.queue_families = Some(families);
        self
    }
}

impl NativeBackend for MockBackend {
    fn api(&self) -> GraphicsApi {
        GraphicsApi::Headless
    }

    fn create_instance(&self, _desc: &InstanceDesc) -> Result<Arc<dyn NativeInstance>, NativeError> {
        if self.fail_instance {
            return Err(NativeError::new("create_instance", "loader missing"));
        }
        let adapters = self
            .adapters
            .iter()
            .enumerate()
            .map(|(index, adapter)| {
                let mut adapter = adapter.clone();
                adapter.info.index = index;
                adapter
            })
            .collect();
        Ok(Arc::new(MockInstance {
            adapters,
            queue_families: self.queue_families.clone(),
            device: Arc::clone(&self.device),
        }))
    }
}

#[derive(Debug)]
pub(crate) struct MockInstance {
    adapters: Vec<MockAdapter>,
    queue_families: Option<Vec<QueueFamilyProperties>>,
    device: Arc<MockDevice>,
}

impl MockInstance {
    pub fn new(adapters: Vec<MockAdapter>) -> Self {
        let backend = MockBackend::new(adapters);
        Self {
            adapters: backend
                .adapters
                .into_iter()
                .enumerate()
                .map(|(index, mut adapter)| {
                    adapter.info.index = index;
                    adapter
                })
                .collect(),
            queue_families: None,
            device: backend.device,
        }
    }
}

impl NativeInstance for MockInstance {
    fn api(&self) -> GraphicsApi {
        GraphicsApi::Headless
    }

    fn adapters(&self) -> Result<Vec<AdapterInfo>, NativeError> {
        Ok(self.adapters.iter().map(|a| a.info.clone()).collect())
    }

    fn probe_adapter(&self, adapter: &AdapterInfo) -> Result<ApiVersion, NativeError> {
        self.adapters
            .get(adapter.index)
            .ok_or_else(|| NativeError::new("probe_adapter", "unknown adapter"))?
            .probe
            .clone()
    }

    fn queue_families(&self, _adapter: &AdapterInfo) -> Option<Vec<QueueFamilyProperties>> {
        self.queue_families.clone()
    }

    fn create_device(
        &self,
        _adapter: &AdapterInfo,
        _desc: &DeviceDesc,
    ) -> Result<Arc<dyn NativeDevice>, NativeError> {
        Ok(self.device.clone())
    }
}
