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

use crate::gpu::api::{FenceValue, Format, PresentMode, QueueType, ResourceState, SwapChainDesc};
use crate::gpu::device::{Device, Queue};
use crate::gpu::error::{ContractViolation, GraphicsError, NativeError};
use crate::gpu::log_target;
use crate::gpu::resource::ColorBuffer;
use crate::gpu::traits::NativeSwapChain;
use std::fmt;
use std::sync::Arc;

/// The presentable back buffers and the frame pacing around them.
///
/// Each back buffer is wrapped in a [`ColorBuffer`]. Frames cycle through
/// `max_frames_in_flight + 1` sync slots; starting a frame waits until the
/// work last submitted from its slot has completed.
pub struct SwapChain {
    native: Box<dyn NativeSwapChain>,
    buffers: Vec<ColorBuffer>,
    frame_fences: Vec<Option<FenceValue>>,
    frame_slot: usize,
    current_buffer: u32,
    queue: Arc<Queue>,
    log_target: &'static str,
}

impl SwapChain {
    /// Creates the native swap chain on `device` and wraps its back buffers.
    ///
    /// # Arguments
    ///
    /// * `device`: The device presenting.
    /// * `desc`: The native creation request.
    /// * `frame_sync_slots`: Number of frame-sync slots, at least 2.
    /// * `initial_state`: The state back buffers are handed out in.
    pub fn new(
        device: &Device,
        desc: &SwapChainDesc,
        frame_sync_slots: u32,
        initial_state: ResourceState,
    ) -> Result<Self, GraphicsError> {
        let target = log_target(device.api());
        let native = device.native().create_swap_chain(desc).map_err(|e| {
            log::error!(target: target, "Fatal: Failed to create swap chain: {e}");
            GraphicsError::SwapChainCreationFailed(e)
        })?;

        if native.buffer_count() == 0 {
            log::error!(target: target, "Fatal: Swap chain has no back buffers");
            return Err(GraphicsError::SwapChainCreationFailed(NativeError::new(
                "create_swap_chain",
                "no back buffers",
            )));
        }
        let mut buffers = Vec::with_capacity(native.buffer_count() as usize);
        for index in 0..native.buffer_count() {
            let image = native
                .buffer(index)
                .map_err(GraphicsError::SwapChainCreationFailed)?;
            buffers.push(ColorBuffer::from_swap_chain(device, index, image, initial_state)?);
        }

        let (width, height) = native.extent();
        log::info!(
            target: target,
            "Created {} swap chain: {} x {} {}, {} buffers, {:?}",
            if desc.window.is_some() { "windowed" } else { "offscreen" },
            width,
            height,
            native.format(),
            buffers.len(),
            native.present_mode()
        );

        Ok(Self {
            native,
            buffers,
            frame_fences: vec![None; frame_sync_slots.max(2) as usize],
            frame_slot: 0,
            current_buffer: 0,
            queue: Arc::clone(device.queue(QueueType::Present)),
            log_target: target,
        })
    }

    /// Waits until the current frame slot is free, then acquires the next
    /// back buffer.
    ///
    /// # Returns
    ///
    /// The index of the back buffer to render into.
    pub fn begin_frame(&mut self) -> Result<u32, GraphicsError> {
        if let Some(fence) = self.frame_fences[self.frame_slot] {
            self.queue.wait_for_fence(fence)?;
        }
        self.current_buffer = self.native.acquire_next_image().map_err(|e| {
            log::error!(target: self.log_target, "Failed to acquire a back buffer: {e}");
            GraphicsError::Native(e)
        })?;
        Ok(self.current_buffer)
    }

    /// Presents the current back buffer and records `fence`, the last value
    /// submitted for this frame, in the frame slot.
    pub fn present(&mut self, fence: FenceValue) -> Result<(), GraphicsError> {
        if fence.queue_type() != Some(QueueType::Graphics) {
            return Err(ContractViolation::QueueMismatch {
                expected: QueueType::Graphics,
                value: fence.0,
            }
            .into());
        }
        self.frame_fences[self.frame_slot] = Some(fence);
        self.native.present(self.current_buffer).map_err(|e| {
            log::error!(target: self.log_target, "Present failed: {e}");
            GraphicsError::Native(e)
        })?;
        self.frame_slot = (self.frame_slot + 1) % self.frame_fences.len();
        Ok(())
    }

    /// The back buffer acquired by the last [`begin_frame`](Self::begin_frame).
    pub fn current_back_buffer(&self) -> &ColorBuffer {
        &self.buffers[self.current_buffer as usize % self.buffers.len()]
    }

    /// Back buffer `index`.
    pub fn back_buffer(&self, index: u32) -> Option<&ColorBuffer> {
        self.buffers.get(index as usize)
    }

    /// Index of the back buffer acquired last.
    pub fn current_buffer_index(&self) -> u32 {
        self.current_buffer
    }

    /// Number of back buffers.
    pub fn buffer_count(&self) -> u32 {
        self.buffers.len() as u32
    }

    /// Number of frame-sync slots.
    pub fn frame_sync_slots(&self) -> usize {
        self.frame_fences.len()
    }

    /// Index of the current frame-sync slot.
    pub fn frame_slot(&self) -> usize {
        self.frame_slot
    }

    /// Back-buffer format.
    pub fn format(&self) -> Format {
        self.native.format()
    }

    /// Back-buffer extent.
    pub fn extent(&self) -> (u32, u32) {
        self.native.extent()
    }

    /// Presentation pacing in use.
    pub fn present_mode(&self) -> PresentMode {
        self.native.present_mode()
    }
}

impl fmt::Debug for SwapChain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SwapChain")
            .field("native", &self.native)
            .field("buffers", &self.buffers.len())
            .field("frame_slot", &self.frame_slot)
            .field("current_buffer", &self.current_buffer)
            .finish()
    }
}
