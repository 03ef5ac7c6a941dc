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

use super::manager::ContextManager;
use crate::gpu::api::{BarrierKind, CommandListType, FenceValue, ResourceBarrier, ResourceState};
use crate::gpu::device::{CommandAllocator, Queue};
use crate::gpu::error::{ContractViolation, GraphicsError};
use crate::gpu::resource::GpuResource;
use crate::gpu::traits::NativeCommandList;
use std::fmt;
use std::sync::Arc;

/// Number of queued barriers that triggers an automatic flush.
pub const MAX_PENDING_BARRIERS: usize = 16;

/// Where a context is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContextState {
    /// Idle in its pool.
    Free,
    /// Holding an allocator and recording commands.
    Recording,
    /// Submitted; about to go back to its pool.
    Submitted,
}

struct PendingBarrier {
    resource: GpuResource,
    kind: BarrierKind,
}

/// The poolable part of a command context: the native list and everything
/// recorded into it.
pub(crate) struct ContextCore {
    id: u64,
    list_type: CommandListType,
    queue: Arc<Queue>,
    list: Box<dyn NativeCommandList>,
    allocator: Option<CommandAllocator>,
    pending: Vec<PendingBarrier>,
    state: ContextState,
    name: String,
    has_pending_debug_event: bool,
    debug_markers: bool,
    log_target: &'static str,
}

impl ContextCore {
    pub(crate) fn new(
        id: u64,
        queue: Arc<Queue>,
        list: Box<dyn NativeCommandList>,
        debug_markers: bool,
        log_target: &'static str,
    ) -> Self {
        Self {
            id,
            list_type: list.list_type(),
            queue,
            list,
            allocator: None,
            pending: Vec::with_capacity(MAX_PENDING_BARRIERS),
            state: ContextState::Free,
            name: String::new(),
            has_pending_debug_event: false,
            debug_markers,
            log_target,
        }
    }

    pub(crate) fn state(&self) -> ContextState {
        self.state
    }

    pub(crate) fn list_type(&self) -> CommandListType {
        self.list_type
    }

    /// Binds a fresh allocator and starts recording.
    pub(crate) fn reset(&mut self, name: &str) -> Result<(), GraphicsError> {
        if self.allocator.is_some() {
            log::error!(
                target: self.log_target,
                "Command context #{} reset while holding an allocator",
                self.id
            );
            debug_assert!(false, "command context reset while holding an allocator");
            return Err(ContractViolation::ContextStillHoldsAllocator.into());
        }

        let mut allocator = self.queue.request_allocator()?;
        if let Err(e) = self.list.reset(allocator.native_mut()) {
            log::error!(target: self.log_target, "Failed to reset command list: {e}");
            self.queue
                .discard_allocator(self.queue.last_completed_fence_value(), allocator);
            return Err(GraphicsError::Native(e));
        }

        self.allocator = Some(allocator);
        self.pending.clear();
        self.state = ContextState::Recording;
        self.name.clear();
        self.name.push_str(name);
        if !name.is_empty() && self.debug_markers {
            self.list.begin_event(name);
            self.has_pending_debug_event = true;
        }
        Ok(())
    }

    fn ensure_recording(&self) -> Result<(), ContractViolation> {
        if self.state == ContextState::Recording {
            Ok(())
        } else {
            Err(ContractViolation::ContextNotRecording)
        }
    }

    fn ensure_queue_accepts(&self, state: ResourceState) -> Result<(), ContractViolation> {
        let restricted = matches!(self.list_type, CommandListType::Compute | CommandListType::Copy);
        if restricted && !state.is_valid_on_compute_queue() {
            log::error!(
                target: self.log_target,
                "{:?} is not a valid state on a {} command list",
                state,
                self.list_type
            );
            return Err(ContractViolation::InvalidResourceState(format!(
                "{state:?} cannot be used on a {} command list",
                self.list_type
            )));
        }
        Ok(())
    }

    pub(crate) fn transition_resource(
        &mut self,
        resource: &GpuResource,
        new_state: ResourceState,
        flush_immediate: bool,
    ) -> Result<(), GraphicsError> {
        self.ensure_recording()?;
        self.ensure_queue_accepts(new_state)?;

        // Only the newest pending barrier of the resource may absorb the
        // transition. A UAV barrier in between pins the earlier state.
        let newest = self
            .pending
            .iter()
            .rposition(|p| p.resource.ptr_eq(resource));
        let mergeable = newest.and_then(|index| match self.pending[index].kind {
            BarrierKind::Transition { before, .. } => Some((index, before)),
            BarrierKind::UnorderedAccess => None,
        });

        match mergeable {
            Some((index, before)) => {
                if new_state == before {
                    self.pending.remove(index);
                    let settled = resource.usage_state();
                    resource.set_transitioning_state((before != settled).then_some(before));
                } else {
                    self.pending[index].kind = BarrierKind::Transition {
                        before,
                        after: new_state,
                    };
                    resource.set_transitioning_state(Some(new_state));
                }
            }
            None => {
                let current = resource
                    .transitioning_state()
                    .unwrap_or_else(|| resource.usage_state());
                if new_state == current {
                    log::trace!(
                        target: self.log_target,
                        "Elided redundant transition of '{}' to {:?}",
                        resource.name(),
                        new_state
                    );
                } else {
                    self.pending.push(PendingBarrier {
                        resource: resource.clone(),
                        kind: BarrierKind::Transition {
                            before: current,
                            after: new_state,
                        },
                    });
                    resource.set_transitioning_state(Some(new_state));
                }
            }
        }

        if flush_immediate || self.pending.len() >= MAX_PENDING_BARRIERS {
            self.flush_resource_barriers()?;
        }
        Ok(())
    }

    pub(crate) fn insert_uav_barrier(
        &mut self,
        resource: &GpuResource,
        flush_immediate: bool,
    ) -> Result<(), GraphicsError> {
        self.ensure_recording()?;
        let state = resource
            .transitioning_state()
            .unwrap_or_else(|| resource.usage_state());
        if !state.contains(ResourceState::UNORDERED_ACCESS) {
            return Err(ContractViolation::InvalidResourceState(format!(
                "UAV barrier on '{}' which is in {:?}",
                resource.name(),
                state
            ))
            .into());
        }

        self.pending.push(PendingBarrier {
            resource: resource.clone(),
            kind: BarrierKind::UnorderedAccess,
        });

        if flush_immediate || self.pending.len() >= MAX_PENDING_BARRIERS {
            self.flush_resource_barriers()?;
        }
        Ok(())
    }

    /// Records every pending barrier in one native call.
    pub(crate) fn flush_resource_barriers(&mut self) -> Result<(), GraphicsError> {
        self.ensure_recording()?;
        if self.pending.is_empty() {
            return Ok(());
        }

        let barriers: Vec<ResourceBarrier> = self
            .pending
            .iter()
            .map(|p| ResourceBarrier {
                image: Arc::clone(p.resource.native_image()),
                kind: p.kind,
                range: p.resource.whole_range(),
            })
            .collect();
        self.list.resource_barriers(&barriers);

        for barrier in self.pending.drain(..) {
            if let BarrierKind::Transition { after, .. } = barrier.kind {
                barrier.resource.complete_transition(after);
            }
        }
        Ok(())
    }

    /// Flushes pending barriers, then hands the native list to `record`.
    pub(crate) fn record<R>(
        &mut self,
        record: impl FnOnce(&mut dyn NativeCommandList) -> R,
    ) -> Result<R, GraphicsError> {
        self.flush_resource_barriers()?;
        Ok(record(self.list.as_mut()))
    }

    pub(crate) fn copy_resource(&mut self, dst: &GpuResource, src: &GpuResource) -> Result<(), GraphicsError> {
        self.transition_resource(dst, ResourceState::COPY_DEST, false)?;
        self.transition_resource(src, ResourceState::COPY_SOURCE, false)?;
        self.record(|list| list.copy_image(dst.native_image().as_ref(), src.native_image().as_ref()))
    }

    pub(crate) fn begin_event(&mut self, label: &str) -> Result<(), ContractViolation> {
        self.ensure_recording()?;
        if self.debug_markers {
            self.list.begin_event(label);
        }
        Ok(())
    }

    pub(crate) fn end_event(&mut self) -> Result<(), ContractViolation> {
        self.ensure_recording()?;
        if self.debug_markers {
            self.list.end_event();
        }
        Ok(())
    }

    pub(crate) fn set_marker(&mut self, label: &str) -> Result<(), ContractViolation> {
        self.ensure_recording()?;
        if self.debug_markers {
            self.list.set_marker(label);
        }
        Ok(())
    }

    pub(crate) fn queue(&self) -> &Arc<Queue> {
        &self.queue
    }

    pub(crate) fn pending_barrier_count(&self) -> usize {
        self.pending.len()
    }

    /// Flushes, closes and submits the list, then retires the allocator
    /// tagged with the returned fence value.
    pub(crate) fn submit(&mut self) -> Result<FenceValue, GraphicsError> {
        self.flush_resource_barriers()?;
        if self.has_pending_debug_event {
            self.list.end_event();
            self.has_pending_debug_event = false;
        }
        self.list.close().map_err(|e| {
            log::error!(target: self.log_target, "Failed to close command list: {e}");
            GraphicsError::Native(e)
        })?;

        let submitted = self.queue.execute_command_list(self.list.as_mut());
        if let Some(allocator) = self.allocator.take() {
            let fence = match &submitted {
                Ok(fence) => *fence,
                Err(_) => self.queue.last_signaled_fence_value(),
            };
            self.queue.discard_allocator(fence, allocator);
        }
        self.state = ContextState::Submitted;
        submitted
    }

    /// Drops everything recorded and releases the allocator without
    /// submitting.
    pub(crate) fn abandon(&mut self) {
        for barrier in self.pending.drain(..) {
            barrier.resource.set_transitioning_state(None);
        }
        if self.has_pending_debug_event {
            self.list.end_event();
            self.has_pending_debug_event = false;
        }
        if self.state == ContextState::Recording {
            if let Err(e) = self.list.close() {
                log::warn!(target: self.log_target, "Failed to close abandoned command list: {e}");
            }
        }
        if let Some(allocator) = self.allocator.take() {
            // Nothing recorded into it was submitted.
            self.queue
                .discard_allocator(self.queue.last_completed_fence_value(), allocator);
        }
        self.state = ContextState::Free;
    }

    pub(crate) fn mark_free(&mut self) {
        self.state = ContextState::Free;
    }
}

impl fmt::Debug for ContextCore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ContextCore")
            .field("id", &self.id)
            .field("list_type", &self.list_type)
            .field("state", &self.state)
            .field("name", &self.name)
            .field("pending_barriers", &self.pending.len())
            .finish()
    }
}

/// A single-writer handle that records GPU commands for one queue.
///
/// Obtained from the [`Device`](crate::gpu::Device). [`finish`](Self::finish)
/// submits the recorded work and returns the context to its pool. A context
/// dropped without `finish` discards its commands.
pub struct CommandContext {
    core: Option<ContextCore>,
    list_type: CommandListType,
    manager: Arc<ContextManager>,
}

impl CommandContext {
    pub(crate) fn new(core: ContextCore, manager: Arc<ContextManager>) -> Self {
        Self {
            list_type: core.list_type(),
            core: Some(core),
            manager,
        }
    }

    fn core_mut(&mut self) -> Result<&mut ContextCore, ContractViolation> {
        self.core.as_mut().ok_or(ContractViolation::ContextNotRecording)
    }

    /// The type of the command list being recorded.
    pub fn list_type(&self) -> CommandListType {
        self.list_type
    }

    /// The lifecycle state of the context.
    pub fn state(&self) -> ContextState {
        self.core.as_ref().map_or(ContextState::Free, ContextCore::state)
    }

    /// Number of barriers waiting for the next flush.
    pub fn pending_barrier_count(&self) -> usize {
        self.core.as_ref().map_or(0, ContextCore::pending_barrier_count)
    }

    /// Requests a transition of `resource` into `new_state`.
    ///
    /// The resource's usage state changes only when the barrier is flushed.
    /// A transition to the current state is elided; a second transition of a
    /// resource that already has a pending barrier replaces that barrier's
    /// target state.
    pub fn transition_resource(
        &mut self,
        resource: &impl AsRef<GpuResource>,
        new_state: ResourceState,
        flush_immediate: bool,
    ) -> Result<(), GraphicsError> {
        self.core_mut()?
            .transition_resource(resource.as_ref(), new_state, flush_immediate)
    }

    /// Orders unordered-access writes to `resource` before later accesses.
    pub fn insert_uav_barrier(
        &mut self,
        resource: &impl AsRef<GpuResource>,
        flush_immediate: bool,
    ) -> Result<(), GraphicsError> {
        self.core_mut()?
            .insert_uav_barrier(resource.as_ref(), flush_immediate)
    }

    /// Records every pending barrier.
    pub fn flush_resource_barriers(&mut self) -> Result<(), GraphicsError> {
        self.core_mut()?.flush_resource_barriers()
    }

    /// Copies the whole of `src` into `dst`.
    pub fn copy_resource(
        &mut self,
        dst: &impl AsRef<GpuResource>,
        src: &impl AsRef<GpuResource>,
    ) -> Result<(), GraphicsError> {
        self.core_mut()?.copy_resource(dst.as_ref(), src.as_ref())
    }

    /// Opens a debug region. A no-op when debug markers are disabled.
    pub fn begin_event(&mut self, label: &str) -> Result<(), GraphicsError> {
        Ok(self.core_mut()?.begin_event(label)?)
    }

    /// Closes the innermost debug region.
    pub fn end_event(&mut self) -> Result<(), GraphicsError> {
        Ok(self.core_mut()?.end_event()?)
    }

    /// Inserts a debug marker.
    pub fn set_marker(&mut self, label: &str) -> Result<(), GraphicsError> {
        Ok(self.core_mut()?.set_marker(label)?)
    }

    pub(crate) fn record<R>(
        &mut self,
        record: impl FnOnce(&mut dyn NativeCommandList) -> R,
    ) -> Result<R, GraphicsError> {
        self.core_mut()?.record(record)
    }

    /// Submits the recorded work and returns the context to its pool.
    ///
    /// # Arguments
    ///
    /// * `wait_for_completion`: Blocks until the GPU has executed the work.
    ///
    /// # Returns
    ///
    /// The fence value signalled once the work completes.
    pub fn finish(mut self, wait_for_completion: bool) -> Result<FenceValue, GraphicsError> {
        let mut core = self.core.take().ok_or(ContractViolation::ContextNotRecording)?;
        let queue = Arc::clone(core.queue());

        let submitted = core.submit();
        if submitted.is_err() {
            core.abandon();
        }
        self.manager.release(core);

        let fence = submitted?;
        if wait_for_completion {
            queue.wait_for_fence(fence)?;
        }
        Ok(fence)
    }
}

impl Drop for CommandContext {
    fn drop(&mut self) {
        if let Some(mut core) = self.core.take() {
            log::warn!(
                target: core.log_target,
                "Command context '{}' dropped without finish; its commands are discarded",
                core.name
            );
            core.abandon();
            self.manager.release(core);
        }
    }
}

impl fmt::Debug for CommandContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommandContext")
            .field("list_type", &self.list_type)
            .field("core", &self.core)
            .finish()
    }
}
