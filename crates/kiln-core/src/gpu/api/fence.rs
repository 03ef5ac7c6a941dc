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

//! Fence values and their queue encoding.

use super::enums::QueueType;
use std::fmt;

/// A value signalled on a queue's fence once the GPU finishes a submission.
///
/// The top byte holds the index of the producing [`QueueType`], the lower 56
/// bits a per-queue counter. Values from different queues therefore never
/// collide, and any value can be routed back to its queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FenceValue(pub u64);

impl FenceValue {
    const COUNTER_MASK: u64 = (1 << QueueType::FENCE_SHIFT) - 1;

    /// The value a queue reports as completed before any submission.
    pub const fn initial_completed(queue: QueueType) -> Self {
        Self(queue.fence_base())
    }

    /// The first value a queue signals.
    pub const fn first_signal(queue: QueueType) -> Self {
        Self(queue.fence_base() | 1)
    }

    /// Returns the queue type encoded in the high bits, if valid.
    pub const fn queue_type(&self) -> Option<QueueType> {
        QueueType::from_index(self.0 >> QueueType::FENCE_SHIFT)
    }

    /// Returns the per-queue counter part of the value.
    pub const fn counter(&self) -> u64 {
        self.0 & Self::COUNTER_MASK
    }

    /// Returns the following value on the same queue.
    pub const fn next(&self) -> Self {
        Self(self.0 + 1)
    }

    /// Returns the preceding value on the same queue.
    pub const fn previous(&self) -> Self {
        Self(self.0 - 1)
    }
}

impl fmt::Display for FenceValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.queue_type() {
            Some(queue) => write!(f, "{}#{}", queue, self.counter()),
            None => write!(f, "{:#x}", self.0),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fence_values_encode_their_queue() {
        for queue in QueueType::SUBMISSION {
            let first = FenceValue::first_signal(queue);
            assert_eq!(first.queue_type(), Some(queue));
            assert_eq!(first.counter(), 1);
            assert_eq!(FenceValue::initial_completed(queue).counter(), 0);
            assert!(first > FenceValue::initial_completed(queue));
        }
    }

    #[test]
    fn fence_values_never_collide_across_queues() {
        let gfx = FenceValue::first_signal(QueueType::Graphics);
        let compute = FenceValue::first_signal(QueueType::Compute);
        let copy = FenceValue::first_signal(QueueType::Copy);
        assert_ne!(gfx, compute);
        assert_ne!(compute, copy);
        assert_eq!(gfx.counter(), compute.counter());
    }

    #[test]
    fn display_names_the_queue() {
        let value = FenceValue::first_signal(QueueType::Compute).next();
        assert_eq!(value.to_string(), "Compute#2");
    }
}
