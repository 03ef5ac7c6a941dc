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

//! A record of the native traffic the headless GPU receives.

use kiln_core::gpu::api::{
    BarrierKind, CommandListType, FenceValue, QueueType, ResourceBarrier, SubresourceRange,
};
use kiln_core::gpu::traits::NativeImage;
use std::sync::{Mutex, PoisonError};

/// A barrier as seen by the headless command list.
#[derive(Debug, Clone, PartialEq)]
pub struct JournalBarrier {
    /// Name of the image the barrier applies to.
    pub image: String,
    /// The synchronization performed.
    pub kind: BarrierKind,
    /// The subresources covered.
    pub range: SubresourceRange,
}

impl From<&ResourceBarrier> for JournalBarrier {
    fn from(barrier: &ResourceBarrier) -> Self {
        Self {
            image: barrier.image.name().to_owned(),
            kind: barrier.kind,
            range: barrier.range,
        }
    }
}

/// A command recorded into a headless command list.
#[derive(Debug, Clone, PartialEq)]
pub enum HeadlessCommand {
    /// Whole-image copy.
    Copy {
        /// Destination image.
        dst: String,
        /// Source image.
        src: String,
    },
    /// Render-target clear.
    ClearColor {
        /// Name of the view cleared.
        view: String,
        /// Clear color.
        color: [f32; 4],
    },
    /// Depth-stencil clear.
    ClearDepthStencil {
        /// Name of the view cleared.
        view: String,
        /// Depth value, if depth is cleared.
        depth: Option<f32>,
        /// Stencil value, if stencil is cleared.
        stencil: Option<u8>,
    },
    /// Unordered-access clear.
    ClearUnorderedAccess {
        /// Image cleared.
        image: String,
    },
    /// Opens a debug region.
    BeginEvent(String),
    /// Closes a debug region.
    EndEvent,
    /// Debug marker.
    Marker(String),
}

/// One entry of the [`HeadlessJournal`].
#[derive(Debug, Clone, PartialEq)]
pub enum JournalEvent {
    /// A command allocator was created.
    AllocatorCreated {
        /// The list type it records for.
        list_type: CommandListType,
        /// Allocator id, unique per device.
        allocator: u64,
    },
    /// A command allocator was reset for reuse.
    AllocatorReset {
        /// The list type it records for.
        list_type: CommandListType,
        /// Allocator id.
        allocator: u64,
    },
    /// One native barrier call.
    BarrierBatch {
        /// The list the batch was recorded into.
        list_type: CommandListType,
        /// The barriers, in submission order.
        barriers: Vec<JournalBarrier>,
    },
    /// A non-barrier command.
    Command {
        /// The list the command was recorded into.
        list_type: CommandListType,
        /// The command.
        command: HeadlessCommand,
    },
    /// A command list was submitted.
    Submitted {
        /// The queue that received it.
        queue: QueueType,
        /// The value the queue signals when the list completes.
        fence: FenceValue,
    },
    /// The simulated GPU finished a submission.
    Completed {
        /// The queue that finished.
        queue: QueueType,
        /// The value signalled.
        fence: FenceValue,
    },
    /// A back buffer was presented.
    Presented {
        /// Index of the back buffer.
        buffer: u32,
    },
}

/// Shared, append-only log of everything the headless backend was asked to
/// do. Tests read it to observe native traffic.
#[derive(Debug, Default)]
pub struct HeadlessJournal {
    events: Mutex<Vec<JournalEvent>>,
}

impl HeadlessJournal {
    /// Creates an empty journal.
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn record(&self, event: JournalEvent) {
        log::trace!(target: kiln_core::gpu::LOG_GRAPHICS, "Headless: {event:?}");
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(event);
    }

    /// A snapshot of every event so far.
    pub fn events(&self) -> Vec<JournalEvent> {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Forgets every event recorded so far.
    pub fn clear(&self) {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }

    /// Every native barrier call, in order.
    pub fn barrier_batches(&self) -> Vec<Vec<JournalBarrier>> {
        self.events()
            .into_iter()
            .filter_map(|event| match event {
                JournalEvent::BarrierBatch { barriers, .. } => Some(barriers),
                _ => None,
            })
            .collect()
    }

    /// Every non-barrier command, in order.
    pub fn commands(&self) -> Vec<HeadlessCommand> {
        self.events()
            .into_iter()
            .filter_map(|event| match event {
                JournalEvent::Command { command, .. } => Some(command),
                _ => None,
            })
            .collect()
    }

    /// The fence values submitted to `queue`, in submission order.
    pub fn submissions(&self, queue: QueueType) -> Vec<FenceValue> {
        self.events()
            .into_iter()
            .filter_map(|event| match event {
                JournalEvent::Submitted { queue: q, fence } if q == queue => Some(fence),
                _ => None,
            })
            .collect()
    }

    /// Number of allocators created for `list_type`.
    pub fn allocators_created(&self, list_type: CommandListType) -> usize {
        self.count(|event| {
            matches!(event, JournalEvent::AllocatorCreated { list_type: t, .. } if *t == list_type)
        })
    }

    /// Number of allocator resets for `list_type`.
    pub fn allocator_resets(&self, list_type: CommandListType) -> usize {
        self.count(|event| {
            matches!(event, JournalEvent::AllocatorReset { list_type: t, .. } if *t == list_type)
        })
    }

    /// Number of presents.
    pub fn presents(&self) -> usize {
        self.count(|event| matches!(event, JournalEvent::Presented { .. }))
    }

    fn count(&self, predicate: impl Fn(&JournalEvent) -> bool) -> usize {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .filter(|event| predicate(event))
            .count()
    }
}
