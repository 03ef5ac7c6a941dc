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

use super::image::HeadlessImage;
use super::journal::{HeadlessJournal, JournalEvent};
use kiln_core::gpu::api::{Format, PresentMode, SwapChainDesc};
use kiln_core::gpu::error::NativeError;
use kiln_core::gpu::traits::{NativeImage, NativeSwapChain};
use kiln_core::gpu::LOG_GRAPHICS;
use std::sync::Arc;

/// An offscreen swap chain cycling its back buffers round-robin.
#[derive(Debug)]
pub struct HeadlessSwapChain {
    buffers: Vec<Arc<dyn NativeImage>>,
    format: Format,
    extent: (u32, u32),
    present_mode: PresentMode,
    next: u32,
    acquired: Option<u32>,
    journal: Arc<HeadlessJournal>,
}

impl HeadlessSwapChain {
    pub(crate) fn new(desc: &SwapChainDesc, journal: Arc<HeadlessJournal>) -> Result<Self, NativeError> {
        if desc.buffer_count < 2 {
            return Err(NativeError::new(
                "create_swap_chain",
                format!("{} back buffers requested, at least 2 are needed", desc.buffer_count),
            ));
        }
        if desc.width == 0 || desc.height == 0 {
            return Err(NativeError::new("create_swap_chain", "zero back-buffer extent"));
        }
        if desc.window.is_some() {
            log::info!(target: LOG_GRAPHICS, "Headless GPU ignores the window and presents offscreen");
        }

        let buffers = (0..desc.buffer_count)
            .map(|index| {
                Arc::new(HeadlessImage::back_buffer(index, desc.format, desc.width, desc.height))
                    as Arc<dyn NativeImage>
            })
            .collect();
        Ok(Self {
            buffers,
            format: desc.format,
            extent: (desc.width, desc.height),
            present_mode: desc.present_mode,
            next: 0,
            acquired: None,
            journal,
        })
    }
}

impl NativeSwapChain for HeadlessSwapChain {
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
        self.acquired = Some(self.next);
        Ok(self.next)
    }

    fn present(&mut self, index: u32) -> Result<(), NativeError> {
        if self.acquired.take() != Some(index) {
            return Err(NativeError::new(
                "present",
                format!("back buffer {index} was not acquired"),
            ));
        }
        self.journal.record(JournalEvent::Presented { buffer: index });
        self.next = (index + 1) % self.buffer_count();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn desc(buffer_count: u32) -> SwapChainDesc {
        SwapChainDesc {
            window: None,
            width: 8,
            height: 8,
            buffer_count,
            format: Format::SRGBA8_UNorm,
            sample_count: 1,
            sample_quality: 0,
            present_mode: PresentMode::Fifo,
            allow_mode_switch: false,
            max_frame_latency: 2,
        }
    }

    #[test]
    fn buffers_cycle_round_robin() {
        let journal = Arc::new(HeadlessJournal::new());
        let mut swap_chain = HeadlessSwapChain::new(&desc(3), Arc::clone(&journal)).unwrap();
        let mut order = Vec::new();
        for _ in 0..4 {
            let index = swap_chain.acquire_next_image().unwrap();
            swap_chain.present(index).unwrap();
            order.push(index);
        }
        assert_eq!(order, vec![0, 1, 2, 0]);
        assert_eq!(journal.presents(), 4);
    }

    #[test]
    fn presenting_without_acquiring_fails() {
        let journal = Arc::new(HeadlessJournal::new());
        let mut swap_chain = HeadlessSwapChain::new(&desc(2), journal).unwrap();
        assert!(swap_chain.present(0).is_err());
    }

    #[test]
    fn single_buffer_swap_chains_are_rejected() {
        let err = HeadlessSwapChain::new(&desc(1), Arc::new(HeadlessJournal::new())).unwrap_err();
        assert_eq!(err.call, "create_swap_chain");
    }
}
