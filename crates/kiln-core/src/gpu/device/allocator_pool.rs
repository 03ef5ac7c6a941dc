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

//! Recycling of command allocators once the GPU is done with them.

use crate::gpu::api::{CommandListType, FenceValue};
use crate::gpu::error::NativeError;
use crate::gpu::traits::{NativeCommandAllocator, NativeDevice};
use std::collections::VecDeque;
use std::fmt;
use std::sync::{Mutex, PoisonError};

/// A command allocator owned by the device layer.
///
/// Ownership is exclusive: an allocator lives either in its pool or in the
/// one context recording into it.
pub struct CommandAllocator {
    id: u64,
    native: Box<dyn NativeCommandAllocator>,
}

impl CommandAllocator {
    /// Pool-unique identifier of the allocator.
    pub fn id(&self) -> u64 {
        self.id
    }

    /// The native allocator.
    pub fn native_mut(&mut self) -> &mut dyn NativeCommandAllocator {
        self.native.as_mut()
    }
}

impl fmt::Debug for CommandAllocator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommandAllocator")
            .field("id", &self.id)
            .field("list_type", &self.native.list_type())
            .finish()
    }
}

/// Counters describing a pool's activity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct AllocatorPoolStats {
    /// Allocators created since the pool was made.
    pub created: u64,
    /// Requests served by a recycled allocator.
    pub recycled: u64,
    /// Allocators waiting for their fence.
    pub pending: usize,
}

#[derive(Default)]
struct PoolInner {
    ready: VecDeque<(FenceValue, CommandAllocator)>,
    created: u64,
    recycled: u64,
}

/// A per-queue pool of allocators, each tagged with the fence after which it
/// may be reused.
///
/// Discarded allocators queue up in submission order, so only the front entry
/// ever needs checking.
pub struct CommandAllocatorPool {
    list_type: CommandListType,
    inner: Mutex<PoolInner>,
}

impl CommandAllocatorPool {
    /// Creates an empty pool for lists of `list_type`.
    pub fn new(list_type: CommandListType) -> Self {
        Self {
            list_type,
            inner: Mutex::new(PoolInner::default()),
        }
    }

    /// The list type served by this pool.
    pub fn list_type(&self) -> CommandListType {
        self.list_type
    }

    /// Returns an allocator whose tagged fence is at most `completed`,
    /// or a new one if none qualifies.
    pub fn request(
        &self,
        completed: FenceValue,
        device: &dyn NativeDevice,
    ) -> Result<CommandAllocator, NativeError> {
        let mut inner = self.inner.lock().unwrap_or_else(PoisonError::into_inner);

        let reusable = matches!(inner.ready.front(), Some((fence, _)) if *fence <= completed);
        if reusable {
            if let Some((fence, mut allocator)) = inner.ready.pop_front() {
                match allocator.native.reset() {
                    Ok(()) => {
                        inner.recycled += 1;
                        log::trace!(
                            "Recycled command allocator #{} (fence {fence} <= {completed})",
                            allocator.id
                        );
                        return Ok(allocator);
                    }
                    Err(e) => {
                        log::warn!(
                            "Dropping command allocator #{} that failed to reset: {e}",
                            allocator.id
                        );
                    }
                }
            }
        }

        let native = device.create_command_allocator(self.list_type)?;
        inner.created += 1;
        let id = inner.created;
        log::debug!("Created command allocator #{id} for {} lists", self.list_type);
        Ok(CommandAllocator { id, native })
    }

    /// Returns `allocator` to the pool; it becomes reusable once `fence` is
    /// complete.
    pub fn discard(&self, fence: FenceValue, allocator: CommandAllocator) {
        let mut inner = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        inner.ready.push_back((fence, allocator));
    }

    /// Returns the pool's counters.
    pub fn stats(&self) -> AllocatorPoolStats {
        let inner = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        AllocatorPoolStats {
            created: inner.created,
            recycled: inner.recycled,
            pending: inner.ready.len(),
        }
    }
}

impl fmt::Debug for CommandAllocatorPool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommandAllocatorPool")
            .field("list_type", &self.list_type)
            .field("stats", &self.stats())
            .finish()
    }
}
