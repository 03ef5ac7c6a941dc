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

use super::command::{HeadlessCommandAllocator, HeadlessCommandList};
use super::image::{HeadlessImage, HeadlessImageView};
use super::journal::{HeadlessJournal, JournalEvent};
use super::swap_chain::HeadlessSwapChain;
use super::timeline::Timeline;
use kiln_core::gpu::api::{
    CommandListType, DeviceCaps, FenceValue, Format, ImageDesc, ImageViewDesc, QueueType,
    SwapChainDesc,
};
use kiln_core::gpu::error::NativeError;
use kiln_core::gpu::traits::{
    NativeCommandAllocator, NativeCommandList, NativeDevice, NativeImage, NativeImageView,
    NativeQueue, NativeSwapChain,
};
use kiln_core::gpu::LOG_GRAPHICS;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// The logical device of the headless GPU.
///
/// Validates what a real driver would reject (zero-sized images, unknown
/// formats, lists submitted while recording) and journals everything else.
#[derive(Debug)]
pub struct HeadlessDevice {
    name: String,
    caps: DeviceCaps,
    journal: Arc<HeadlessJournal>,
    timeline: Arc<Timeline>,
    swap_chain_failure: Option<String>,
    next_allocator_id: AtomicU64,
    images_created: AtomicU64,
}

impl HeadlessDevice {
    pub(crate) fn new(
        name: String,
        caps: DeviceCaps,
        journal: Arc<HeadlessJournal>,
        timeline: Timeline,
        swap_chain_failure: Option<String>,
    ) -> Self {
        Self {
            name,
            caps,
            journal,
            timeline: Arc::new(timeline),
            swap_chain_failure,
            next_allocator_id: AtomicU64::new(0),
            images_created: AtomicU64::new(0),
        }
    }

    /// Debug name of the device.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The journal this device records into.
    pub fn journal(&self) -> &Arc<HeadlessJournal> {
        &self.journal
    }

    /// Completes every submission on `queue_type` up to `value`.
    ///
    /// Used with [`CompletionMode::Manual`](super::CompletionMode::Manual);
    /// values beyond the last submission are clamped to it.
    pub fn complete(&self, queue_type: QueueType, value: FenceValue) {
        self.timeline.complete(queue_type, value);
    }

    /// Completes everything submitted so far on every queue.
    pub fn complete_all(&self) {
        self.timeline.complete_all();
    }

    /// The last value the simulated GPU signalled on `queue_type`.
    pub fn completed_value(&self, queue_type: QueueType) -> FenceValue {
        self.timeline.fence(queue_type).completed()
    }

    /// The last value submitted to `queue_type`.
    pub fn last_submitted(&self, queue_type: QueueType) -> FenceValue {
        self.timeline.fence(queue_type).last_submitted()
    }

    /// Number of images created so far, swap-chain buffers excluded.
    pub fn images_created(&self) -> u64 {
        self.images_created.load(Ordering::Relaxed)
    }
}

impl NativeDevice for HeadlessDevice {
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
        Ok(Box::new(HeadlessQueue {
            queue_type,
            timeline: Arc::clone(&self.timeline),
            journal: Arc::clone(&self.journal),
        }))
    }

    fn create_command_allocator(
        &self,
        list_type: CommandListType,
    ) -> Result<Box<dyn NativeCommandAllocator>, NativeError> {
        let id = self.next_allocator_id.fetch_add(1, Ordering::Relaxed);
        Ok(Box::new(HeadlessCommandAllocator::new(
            id,
            list_type,
            Arc::clone(&self.journal),
        )))
    }

    fn create_command_list(
        &self,
        list_type: CommandListType,
    ) -> Result<Box<dyn NativeCommandList>, NativeError> {
        Ok(Box::new(HeadlessCommandList::new(
            list_type,
            Arc::clone(&self.journal),
        )))
    }

    fn create_image(&self, desc: &ImageDesc) -> Result<Arc<dyn NativeImage>, NativeError> {
        if desc.width == 0 || desc.height == 0 || desc.array_size_or_depth == 0 {
            return Err(NativeError::new(
                "create_image",
                format!("\"{}\" has a zero extent", desc.name),
            ));
        }
        if desc.format == Format::Unknown {
            return Err(NativeError::new(
                "create_image",
                format!("\"{}\" has no format", desc.name),
            ));
        }
        self.images_created.fetch_add(1, Ordering::Relaxed);
        log::debug!(
            target: LOG_GRAPHICS,
            "Headless: created image \"{}\" {} x {} x {} {}",
            desc.name,
            desc.width,
            desc.height,
            desc.array_size_or_depth,
            desc.format
        );
        Ok(Arc::new(HeadlessImage::new(desc)))
    }

    fn create_image_view(
        &self,
        image: &Arc<dyn NativeImage>,
        desc: &ImageViewDesc,
    ) -> Result<Arc<dyn NativeImageView>, NativeError> {
        let (_, _, layers) = image.extent();
        if desc.mip_count == 0 || desc.array_size == 0 {
            return Err(NativeError::new(
                "create_image_view",
                format!("\"{}\" covers no subresource", desc.name),
            ));
        }
        if !desc.resource_type.is_volume() && desc.base_array_slice + desc.array_size > layers {
            return Err(NativeError::new(
                "create_image_view",
                format!("\"{}\" reaches past the last array slice", desc.name),
            ));
        }
        Ok(Arc::new(HeadlessImageView::new(image.as_ref(), desc)))
    }

    fn create_swap_chain(&self, desc: &SwapChainDesc) -> Result<Box<dyn NativeSwapChain>, NativeError> {
        if let Some(reason) = &self.swap_chain_failure {
            return Err(NativeError::new("create_swap_chain", reason.clone()));
        }
        Ok(Box::new(HeadlessSwapChain::new(desc, Arc::clone(&self.journal))?))
    }

    fn wait_idle(&self) -> Result<(), NativeError> {
        self.timeline.wait_idle()
    }
}

/// A submission queue of the headless GPU.
#[derive(Debug)]
pub struct HeadlessQueue {
    queue_type: QueueType,
    timeline: Arc<Timeline>,
    journal: Arc<HeadlessJournal>,
}

impl NativeQueue for HeadlessQueue {
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
            .downcast_mut::<HeadlessCommandList>()
            .ok_or_else(|| NativeError::new("submit", "command list belongs to another backend"))?;
        if list.is_recording() {
            return Err(NativeError::new("submit", "command list is still recording"));
        }
        self.journal.record(JournalEvent::Submitted {
            queue: self.queue_type,
            fence: signal,
        });
        self.timeline.submit(self.queue_type, signal);
        Ok(())
    }

    fn completed_value(&self) -> FenceValue {
        self.timeline.fence(self.queue_type).completed()
    }

    fn wait_for_value(&self, value: FenceValue) -> Result<(), NativeError> {
        self.timeline
            .fence(self.queue_type)
            .wait(value, self.timeline.wait_timeout())
    }
}
