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

//! Command queues and fence-based CPU/GPU synchronization.

use super::allocator_pool::{AllocatorPoolStats, CommandAllocator, CommandAllocatorPool};
use crate::gpu::api::{FenceValue, GraphicsApi, QueueType};
use crate::gpu::error::{ContractViolation, GraphicsError};
use crate::gpu::log_target;
use crate::gpu::traits::{NativeCommandList, NativeDevice, NativeQueue};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

/// One native command queue with its fence counter and allocator pool.
///
/// Fence values returned by [`Queue::execute_command_list`] are strictly
/// increasing and carry the queue type in their high bits. Submission and the
/// allocator pool are safe to use from any number of threads.
pub struct Queue {
    queue_type: QueueType,
    native: Box<dyn NativeQueue>,
    device: Arc<dyn NativeDevice>,
    next_fence_value: Mutex<FenceValue>,
    last_completed_fence_value: AtomicU64,
    allocator_pool: CommandAllocatorPool,
    log_target: &'static str,
}

impl Queue {
    /// Creates the native queue for `queue_type` on `device`.
    pub fn new(
        queue_type: QueueType,
        device: Arc<dyn NativeDevice>,
        api: GraphicsApi,
    ) -> Result<Self, GraphicsError> {
        let target = log_target(api);
        let native = device.create_queue(queue_type).map_err(|e| {
            log::error!(target: target, "Failed to create {queue_type} queue: {e}");
            GraphicsError::DeviceCreationFailed(e)
        })?;
        log::debug!(target: target, "Created {queue_type} queue");

        Ok(Self {
            queue_type,
            native,
            device,
            next_fence_value: Mutex::new(FenceValue::first_signal(queue_type)),
            last_completed_fence_value: AtomicU64::new(
                FenceValue::initial_completed(queue_type).0,
            ),
            allocator_pool: CommandAllocatorPool::new(queue_type.command_list_type()),
            log_target: target,
        })
    }

    /// The queue type.
    pub fn queue_type(&self) -> QueueType {
        self.queue_type
    }

    /// Submits a closed command list and returns the fence value that will be
    /// signalled once the GPU has executed it.
    pub fn execute_command_list(
        &self,
        list: &mut dyn NativeCommandList,
    ) -> Result<FenceValue, GraphicsError> {
        let mut next = self
            .next_fence_value
            .lock()
            .unwrap_or_else(PoisonError::into_inner);

        let signal = *next;
        self.native.submit(list, signal).map_err(|e| {
            log::error!(target: self.log_target, "{} queue submission failed: {e}", self.queue_type);
            GraphicsError::Native(e)
        })?;
        *next = signal.next();
        Ok(signal)
    }

    /// The value the next submission will signal.
    pub fn next_fence_value(&self) -> FenceValue {
        *self
            .next_fence_value
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// The value signalled by the most recent submission, or the initial
    /// completed value if nothing was submitted yet.
    pub fn last_signaled_fence_value(&self) -> FenceValue {
        self.next_fence_value().previous()
    }

    /// The last completed value observed, without querying the GPU.
    pub fn last_completed_fence_value(&self) -> FenceValue {
        FenceValue(self.last_completed_fence_value.load(Ordering::Acquire))
    }

    /// Queries the GPU and returns the last completed value.
    pub fn poll_completed_fence_value(&self) -> FenceValue {
        let native = self.native.completed_value();
        let previous = self
            .last_completed_fence_value
            .fetch_max(native.0, Ordering::AcqRel);
        FenceValue(previous.max(native.0))
    }

    /// Returns `true` if the GPU has reached `value`. Never blocks.
    pub fn is_fence_complete(&self, value: FenceValue) -> bool {
        if value.queue_type() != Some(self.queue_type) {
            log::error!(
                target: self.log_target,
                "Fence {value} queried on the {} queue",
                self.queue_type
            );
            debug_assert!(false, "fence {value} queried on the {} queue", self.queue_type);
            return false;
        }

        if value <= self.last_completed_fence_value() {
            return true;
        }
        value <= self.poll_completed_fence_value()
    }

    /// Blocks the calling thread until the GPU has reached `value`.
    pub fn wait_for_fence(&self, value: FenceValue) -> Result<(), GraphicsError> {
        if value.queue_type() != Some(self.queue_type) {
            return Err(ContractViolation::QueueMismatch {
                expected: self.queue_type,
                value: value.0,
            }
            .into());
        }
        if self.is_fence_complete(value) {
            return Ok(());
        }
        if value > self.last_signaled_fence_value() {
            return Err(ContractViolation::UnsignaledFence { value: value.0 }.into());
        }

        log::trace!(target: self.log_target, "Waiting for fence {value}");
        self.native.wait_for_value(value).map_err(|e| {
            log::error!(target: self.log_target, "Waiting for fence {value} failed: {e}");
            GraphicsError::Native(e)
        })?;
        self.last_completed_fence_value
            .fetch_max(value.0, Ordering::AcqRel);
        Ok(())
    }

    /// Blocks until every submission made so far has completed.
    pub fn wait_for_idle(&self) -> Result<(), GraphicsError> {
        self.wait_for_fence(self.last_signaled_fence_value())
    }

    /// Returns an allocator that is safe to record into.
    pub fn request_allocator(&self) -> Result<CommandAllocator, GraphicsError> {
        let completed = self.poll_completed_fence_value();
        self.allocator_pool
            .request(completed, self.device.as_ref())
            .map_err(|e| {
                log::error!(
                    target: self.log_target,
                    "Failed to create a command allocator for the {} queue: {e}",
                    self.queue_type
                );
                GraphicsError::Native(e)
            })
    }

    /// Returns `allocator` to the pool, reusable once `fence` completes.
    pub fn discard_allocator(&self, fence: FenceValue, allocator: CommandAllocator) {
        self.allocator_pool.discard(fence, allocator);
    }

    /// The allocator pool's counters.
    pub fn allocator_stats(&self) -> AllocatorPoolStats {
        self.allocator_pool.stats()
    }
}

impl fmt::Debug for Queue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Queue")
            .field("queue_type", &self.queue_type)
            .field("next_fence_value", &self.next_fence_value())
            .field("last_completed_fence_value", &self.last_completed_fence_value())
            .finish()
    }
}

/// The graphics, compute and copy queues of a device.
#[derive(Debug, Clone)]
pub struct QueueSet {
    queues: [Arc<Queue>; 3],
}

impl QueueSet {
    /// Creates one queue per submission queue type.
    pub fn new(device: &Arc<dyn NativeDevice>, api: GraphicsApi) -> Result<Self, GraphicsError> {
        let graphics = Queue::new(QueueType::Graphics, Arc::clone(device), api)?;
        let compute = Queue::new(QueueType::Compute, Arc::clone(device), api)?;
        let copy = Queue::new(QueueType::Copy, Arc::clone(device), api)?;
        Ok(Self {
            queues: [Arc::new(graphics), Arc::new(compute), Arc::new(copy)],
        })
    }

    /// Returns the queue serving `queue_type`. Presentation runs on the
    /// graphics queue.
    pub fn get(&self, queue_type: QueueType) -> &Arc<Queue> {
        match queue_type {
            QueueType::Graphics | QueueType::Present => &self.queues[0],
            QueueType::Compute => &self.queues[1],
            QueueType::Copy => &self.queues[2],
        }
    }

    /// Iterates over the queues.
    pub fn iter(&self) -> impl Iterator<Item = &Arc<Queue>> {
        self.queues.iter()
    }

    /// The last value each queue has signalled, indexed by queue type.
    pub fn last_signaled(&self) -> [FenceValue; 3] {
        [
            self.queues[0].last_signaled_fence_value(),
            self.queues[1].last_signaled_fence_value(),
            self.queues[2].last_signaled_fence_value(),
        ]
    }

    /// Returns `true` if every value in `fences` is complete.
    pub fn all_complete(&self, fences: &[FenceValue; 3]) -> bool {
        self.queues
            .iter()
            .zip(fences.iter())
            .all(|(queue, fence)| queue.is_fence_complete(*fence))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gpu::mock::MockDevice;

    fn graphics_queue(device: &Arc<MockDevice>) -> Queue {
        let native: Arc<dyn NativeDevice> = device.clone();
        Queue::new(QueueType::Graphics, native, GraphicsApi::Headless).unwrap()
    }

    #[test]
    fn fence_values_strictly_increase() {
        let device = MockDevice::new();
        let queue = graphics_queue(&device);
        let mut list = device.command_list();

        let mut previous = queue.last_signaled_fence_value();
        for _ in 0..32 {
            let value = queue.execute_command_list(&mut list).unwrap();
            assert!(value > previous, "{value} should follow {previous}");
            assert_eq!(value.queue_type(), Some(QueueType::Graphics));
            previous = value;
        }
        assert_eq!(device.submissions(QueueType::Graphics), 32);
    }

    #[test]
    fn completion_is_observed_through_the_native_fence() {
        let device = MockDevice::new();
        let queue = graphics_queue(&device);
        let mut list = device.command_list();
        let first = queue.execute_command_list(&mut list).unwrap();
        let second = queue.execute_command_list(&mut list).unwrap();

        assert!(!queue.is_fence_complete(first));
        device.complete(QueueType::Graphics, first);
        assert!(queue.is_fence_complete(first));
        assert!(!queue.is_fence_complete(second));
        assert_eq!(queue.last_completed_fence_value(), first);
    }

    #[test]
    fn wait_for_fence_blocks_until_completion() {
        let device = MockDevice::new();
        let queue = graphics_queue(&device);
        let mut list = device.command_list();
        let value = queue.execute_command_list(&mut list).unwrap();

        queue.wait_for_fence(value).unwrap();
        assert!(queue.is_fence_complete(value));
        assert_eq!(device.waits(QueueType::Graphics), 1);
    }

    #[test]
    fn waiting_on_an_unsignaled_value_is_rejected() {
        let device = MockDevice::new();
        let queue = graphics_queue(&device);
        let future = queue.next_fence_value();
        let err = queue.wait_for_fence(future).unwrap_err();
        assert!(matches!(
            err,
            GraphicsError::Contract(ContractViolation::UnsignaledFence { .. })
        ));
    }

    #[test]
    fn waiting_on_another_queues_fence_is_rejected() {
        let device = MockDevice::new();
        let queue = graphics_queue(&device);
        let err = queue
            .wait_for_fence(FenceValue::first_signal(QueueType::Copy))
            .unwrap_err();
        assert!(matches!(
            err,
            GraphicsError::Contract(ContractViolation::QueueMismatch { .. })
        ));
    }

    #[test]
    fn idle_queue_waits_without_touching_the_gpu() {
        let device = MockDevice::new();
        let queue = graphics_queue(&device);
        queue.wait_for_idle().unwrap();
        assert_eq!(device.waits(QueueType::Graphics), 0);
    }

    #[test]
    fn discarded_allocator_waits_for_its_fence() {
        let device = MockDevice::new();
        let queue = graphics_queue(&device);
        let mut list = device.command_list();

        let allocator = queue.request_allocator().unwrap();
        let allocator_id = allocator.id();
        let fence = queue.execute_command_list(&mut list).unwrap();
        queue.discard_allocator(fence, allocator);

        let fresh = queue.request_allocator().unwrap();
        assert_ne!(fresh.id(), allocator_id);

        device.complete(QueueType::Graphics, fence);
        let recycled = queue.request_allocator().unwrap();
        assert_eq!(recycled.id(), allocator_id);
    }
}
