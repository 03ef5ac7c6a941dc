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

//! CPU-visible descriptor heaps with fence-tagged retirement.
//!
//! Heaps are persistent: they grow one page at a time and never rotate per
//! frame. A released descriptor is parked with the last fence value of every
//! queue at release time, and returns to the free list only once all of those
//! fences are complete, so no in-flight command list can still reference it.

use super::queue::QueueSet;
use crate::gpu::api::FenceValue;
use std::collections::VecDeque;
use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};

/// Number of descriptors in one heap page.
pub const DESCRIPTORS_PER_PAGE: u32 = 256;

/// The kinds of CPU-visible descriptor heaps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DescriptorHeapKind {
    /// Shader-resource, unordered-access and constant-buffer views.
    Resource,
    /// Samplers.
    Sampler,
    /// Render-target views.
    RenderTarget,
    /// Depth-stencil views.
    DepthStencil,
}

impl DescriptorHeapKind {
    /// Every heap kind, in heap order.
    pub const ALL: [DescriptorHeapKind; 4] = [
        DescriptorHeapKind::Resource,
        DescriptorHeapKind::Sampler,
        DescriptorHeapKind::RenderTarget,
        DescriptorHeapKind::DepthStencil,
    ];

    const fn index(&self) -> usize {
        match self {
            Self::Resource => 0,
            Self::Sampler => 1,
            Self::RenderTarget => 2,
            Self::DepthStencil => 3,
        }
    }
}

impl fmt::Display for DescriptorHeapKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// Counters describing one heap.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DescriptorHeapStats {
    /// Pages allocated so far.
    pub pages: u32,
    /// Descriptors currently held by handles.
    pub live: u32,
    /// Descriptors ready for reuse.
    pub free: u32,
    /// Descriptors waiting for their fences.
    pub retired: u32,
}

#[derive(Default)]
struct HeapInner {
    pages: u32,
    next_unused: u32,
    free: Vec<u32>,
    retired: VecDeque<([FenceValue; 3], u32)>,
    live: u32,
}

pub(crate) struct DescriptorHeap {
    kind: DescriptorHeapKind,
    queues: QueueSet,
    inner: Mutex<HeapInner>,
}

impl DescriptorHeap {
    fn new(kind: DescriptorHeapKind, queues: QueueSet) -> Self {
        Self {
            kind,
            queues,
            inner: Mutex::new(HeapInner::default()),
        }
    }

    fn allocate(self: &Arc<Self>) -> DescriptorHandle {
        let mut inner = self.inner.lock().unwrap_or_else(PoisonError::into_inner);

        // Retirement snapshots only grow, so the completed ones form a prefix.
        while let Some((fences, _)) = inner.retired.front() {
            if !self.queues.all_complete(fences) {
                break;
            }
            if let Some((_, index)) = inner.retired.pop_front() {
                inner.free.push(index);
            }
        }

        let index = match inner.free.pop() {
            Some(index) => index,
            None => {
                if inner.next_unused == inner.pages * DESCRIPTORS_PER_PAGE {
                    inner.pages += 1;
                    log::debug!(
                        "Allocated {} descriptor page #{} ({} descriptors)",
                        self.kind,
                        inner.pages,
                        DESCRIPTORS_PER_PAGE
                    );
                }
                let index = inner.next_unused;
                inner.next_unused += 1;
                index
            }
        };
        inner.live += 1;

        DescriptorHandle {
            heap: Arc::clone(self),
            index,
        }
    }

    fn retire(&self, index: u32) {
        let fences = self.queues.last_signaled();
        let mut inner = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        inner.live = inner.live.saturating_sub(1);
        inner.retired.push_back((fences, index));
    }

    fn stats(&self) -> DescriptorHeapStats {
        let inner = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        DescriptorHeapStats {
            pages: inner.pages,
            live: inner.live,
            free: inner.free.len() as u32,
            retired: inner.retired.len() as u32,
        }
    }
}

/// One descriptor slot. Dropping the handle retires the slot.
pub struct DescriptorHandle {
    heap: Arc<DescriptorHeap>,
    index: u32,
}

impl DescriptorHandle {
    /// The heap the descriptor lives in.
    pub fn kind(&self) -> DescriptorHeapKind {
        self.heap.kind
    }

    /// Heap-wide index of the descriptor.
    pub fn index(&self) -> u32 {
        self.index
    }

    /// The page holding the descriptor.
    pub fn page(&self) -> u32 {
        self.index / DESCRIPTORS_PER_PAGE
    }
}

impl Drop for DescriptorHandle {
    fn drop(&mut self) {
        self.heap.retire(self.index);
    }
}

impl fmt::Debug for DescriptorHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DescriptorHandle")
            .field("kind", &self.heap.kind)
            .field("index", &self.index)
            .finish()
    }
}

/// One persistent heap per [`DescriptorHeapKind`].
pub struct DescriptorAllocator {
    heaps: [Arc<DescriptorHeap>; 4],
}

impl DescriptorAllocator {
    pub(crate) fn new(queues: &QueueSet) -> Self {
        Self {
            heaps: DescriptorHeapKind::ALL
                .map(|kind| Arc::new(DescriptorHeap::new(kind, queues.clone()))),
        }
    }

    /// Allocates a descriptor from the heap of `kind`.
    pub fn allocate(&self, kind: DescriptorHeapKind) -> DescriptorHandle {
        self.heaps[kind.index()].allocate()
    }

    /// Returns the counters of the heap of `kind`.
    pub fn stats(&self, kind: DescriptorHeapKind) -> DescriptorHeapStats {
        self.heaps[kind.index()].stats()
    }
}

impl fmt::Debug for DescriptorAllocator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut list = f.debug_map();
        for kind in DescriptorHeapKind::ALL {
            list.entry(&kind, &self.stats(kind));
        }
        list.finish()
    }
}
