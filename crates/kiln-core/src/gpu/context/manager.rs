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

use super::command_context::{CommandContext, ContextCore, ContextState};
use crate::gpu::api::CommandListType;
use crate::gpu::device::QueueSet;
use crate::gpu::error::{ContractViolation, GraphicsError};
use crate::gpu::traits::NativeDevice;
use std::fmt;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

/// Counters of one context pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ContextPoolStats {
    /// Contexts created for this list type.
    pub created: usize,
    /// Contexts idle in the pool.
    pub free: usize,
}

/// Pools of command contexts, one per command-list type.
pub(crate) struct ContextManager {
    device: Arc<dyn NativeDevice>,
    queues: QueueSet,
    pools: [Mutex<Vec<ContextCore>>; 4],
    created: [AtomicUsize; 4],
    next_id: AtomicU64,
    debug_markers: bool,
    log_target: &'static str,
}

impl ContextManager {
    pub(crate) fn new(
        device: Arc<dyn NativeDevice>,
        queues: QueueSet,
        debug_markers: bool,
        log_target: &'static str,
    ) -> Self {
        Self {
            device,
            queues,
            pools: Default::default(),
            created: Default::default(),
            next_id: AtomicU64::new(0),
            debug_markers,
            log_target,
        }
    }

    /// Takes a free context of `list_type`, or creates one, and starts
    /// recording into it.
    pub(crate) fn allocate(
        this: &Arc<Self>,
        list_type: CommandListType,
        name: &str,
    ) -> Result<CommandContext, GraphicsError> {
        let queue_type = list_type.queue_type().ok_or_else(|| {
            ContractViolation::InvalidCreationParams(format!(
                "{list_type} command lists cannot be recorded as contexts"
            ))
        })?;

        let pooled = this.pools[list_type.index()]
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pop();

        let mut core = match pooled {
            Some(core) => core,
            None => {
                let list = this.device.create_command_list(list_type).map_err(|e| {
                    log::error!(target: this.log_target, "Failed to create a {list_type} command list: {e}");
                    GraphicsError::Native(e)
                })?;
                this.created[list_type.index()].fetch_add(1, Ordering::Relaxed);
                let id = this.next_id.fetch_add(1, Ordering::Relaxed);
                log::debug!(target: this.log_target, "Created {list_type} command context #{id}");
                ContextCore::new(
                    id,
                    Arc::clone(this.queues.get(queue_type)),
                    list,
                    this.debug_markers,
                    this.log_target,
                )
            }
        };
        debug_assert_ne!(core.state(), ContextState::Recording, "pooled context is still recording");

        if let Err(e) = core.reset(name) {
            this.release(core);
            return Err(e);
        }
        Ok(CommandContext::new(core, Arc::clone(this)))
    }

    /// Returns a context to its pool. A context still recording is abandoned
    /// first, so the pool never holds one.
    pub(crate) fn release(&self, mut core: ContextCore) {
        if core.state() == ContextState::Recording {
            log::error!(target: self.log_target, "Recording context returned to its pool: {core:?}");
            core.abandon();
        }
        core.mark_free();
        self.pools[core.list_type().index()]
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(core);
    }

    pub(crate) fn stats(&self, list_type: CommandListType) -> ContextPoolStats {
        ContextPoolStats {
            created: self.created[list_type.index()].load(Ordering::Relaxed),
            free: self.pools[list_type.index()]
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .len(),
        }
    }
}

impl fmt::Debug for ContextManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut map = f.debug_map();
        for list_type in CommandListType::ALL {
            map.entry(&list_type, &self.stats(list_type));
        }
        map.finish()
    }
}

#[cfg(test)]
mod tests {
    use crate::gpu::api::{AdapterInfo, CommandListType, GraphicsApi, QueueType};
    use crate::gpu::context::ContextState;
    use crate::gpu::device::{Device, DeviceOptions};
    use crate::gpu::mock::MockDevice;

    #[test]
    fn finished_contexts_are_reused() {
        let mock = MockDevice::new();
        let device = Device::new(
            GraphicsApi::Headless,
            AdapterInfo::default(),
            mock.clone(),
            DeviceOptions::default(),
        )
        .unwrap();

        for _ in 0..4 {
            let context = device.begin_graphics_context("").unwrap();
            assert_eq!(context.state(), ContextState::Recording);
            context.finish(false).unwrap();
        }

        let stats = device.context_stats(CommandListType::Direct);
        assert_eq!(stats.created, 1);
        assert_eq!(stats.free, 1);
        assert_eq!(mock.submissions(QueueType::Graphics), 4);
    }

    #[test]
    fn concurrent_contexts_each_get_their_own_allocator() {
        let mock = MockDevice::new();
        let device = Device::new(
            GraphicsApi::Headless,
            AdapterInfo::default(),
            mock.clone(),
            DeviceOptions::default(),
        )
        .unwrap();

        let a = device.begin_graphics_context("").unwrap();
        let b = device.begin_graphics_context("").unwrap();
        assert_eq!(device.context_stats(CommandListType::Direct).created, 2);
        assert_eq!(mock.allocators_created(), 2);
        a.finish(false).unwrap();
        b.finish(false).unwrap();
        assert_eq!(device.context_stats(CommandListType::Direct).free, 2);
    }

    #[test]
    fn each_list_type_has_its_own_pool() {
        let mock = MockDevice::new();
        let device = Device::new(
            GraphicsApi::Headless,
            AdapterInfo::default(),
            mock,
            DeviceOptions::default(),
        )
        .unwrap();

        device.begin_context("", CommandListType::Copy).unwrap().finish(false).unwrap();
        device.begin_compute_context("", true).unwrap().finish(false).unwrap();
        assert_eq!(device.context_stats(CommandListType::Copy).created, 1);
        assert_eq!(device.context_stats(CommandListType::Compute).created, 1);
        assert_eq!(device.context_stats(CommandListType::Direct).created, 0);
    }
}
