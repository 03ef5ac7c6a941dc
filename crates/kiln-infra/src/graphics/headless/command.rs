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

use super::journal::{HeadlessCommand, HeadlessJournal, JournalBarrier, JournalEvent};
use kiln_core::gpu::api::{CommandListType, ResourceBarrier};
use kiln_core::gpu::error::NativeError;
use kiln_core::gpu::traits::{NativeCommandAllocator, NativeCommandList, NativeImage, NativeImageView};
use std::any::Any;
use std::sync::Arc;

/// A command allocator of the headless GPU.
#[derive(Debug)]
pub struct HeadlessCommandAllocator {
    id: u64,
    list_type: CommandListType,
    lists_recorded: u32,
    journal: Arc<HeadlessJournal>,
}

impl HeadlessCommandAllocator {
    pub(crate) fn new(id: u64, list_type: CommandListType, journal: Arc<HeadlessJournal>) -> Self {
        journal.record(JournalEvent::AllocatorCreated {
            list_type,
            allocator: id,
        });
        Self {
            id,
            list_type,
            lists_recorded: 0,
            journal,
        }
    }

    /// Device-unique id of the allocator.
    pub fn id(&self) -> u64 {
        self.id
    }
}

impl NativeCommandAllocator for HeadlessCommandAllocator {
    fn list_type(&self) -> CommandListType {
        self.list_type
    }

    fn reset(&mut self) -> Result<(), NativeError> {
        self.lists_recorded = 0;
        self.journal.record(JournalEvent::AllocatorReset {
            list_type: self.list_type,
            allocator: self.id,
        });
        Ok(())
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// A command list of the headless GPU. Commands go straight to the journal.
#[derive(Debug)]
pub struct HeadlessCommandList {
    list_type: CommandListType,
    allocator: Option<u64>,
    recording: bool,
    journal: Arc<HeadlessJournal>,
}

impl HeadlessCommandList {
    pub(crate) fn new(list_type: CommandListType, journal: Arc<HeadlessJournal>) -> Self {
        Self {
            list_type,
            allocator: None,
            recording: false,
            journal,
        }
    }

    /// Returns `true` between `reset` and `close`.
    pub fn is_recording(&self) -> bool {
        self.recording
    }

    /// Id of the allocator the list last recorded into.
    pub fn allocator(&self) -> Option<u64> {
        self.allocator
    }

    fn command(&self, command: HeadlessCommand) {
        if !self.recording {
            log::error!(target: kiln_core::gpu::LOG_GRAPHICS, "Headless: {command:?} recorded into a closed list");
        }
        self.journal.record(JournalEvent::Command {
            list_type: self.list_type,
            command,
        });
    }
}

impl NativeCommandList for HeadlessCommandList {
    fn list_type(&self) -> CommandListType {
        self.list_type
    }

    fn reset(&mut self, allocator: &mut dyn NativeCommandAllocator) -> Result<(), NativeError> {
        if self.recording {
            return Err(NativeError::new("reset", "command list is still recording"));
        }
        if allocator.list_type() != self.list_type {
            return Err(NativeError::new(
                "reset",
                format!(
                    "{} allocator used for a {} list",
                    allocator.list_type(),
                    self.list_type
                ),
            ));
        }
        let allocator = allocator
            .as_any_mut()
            .downcast_mut::<HeadlessCommandAllocator>()
            .ok_or_else(|| NativeError::new("reset", "allocator belongs to another backend"))?;
        allocator.lists_recorded += 1;
        self.allocator = Some(allocator.id);
        self.recording = true;
        Ok(())
    }

    fn close(&mut self) -> Result<(), NativeError> {
        if !self.recording {
            return Err(NativeError::new("close", "command list is not recording"));
        }
        self.recording = false;
        Ok(())
    }

    fn resource_barriers(&mut self, barriers: &[ResourceBarrier]) {
        self.journal.record(JournalEvent::BarrierBatch {
            list_type: self.list_type,
            barriers: barriers.iter().map(JournalBarrier::from).collect(),
        });
    }

    fn copy_image(&mut self, dst: &dyn NativeImage, src: &dyn NativeImage) {
        self.command(HeadlessCommand::Copy {
            dst: dst.name().to_owned(),
            src: src.name().to_owned(),
        });
    }

    fn clear_color(&mut self, view: &dyn NativeImageView, color: [f32; 4]) {
        self.command(HeadlessCommand::ClearColor {
            view: view.desc().name.clone(),
            color,
        });
    }

    fn clear_depth_stencil(&mut self, view: &dyn NativeImageView, depth: Option<f32>, stencil: Option<u8>) {
        self.command(HeadlessCommand::ClearDepthStencil {
            view: view.desc().name.clone(),
            depth,
            stencil,
        });
    }

    fn clear_unordered_access(&mut self, image: &dyn NativeImage) {
        self.command(HeadlessCommand::ClearUnorderedAccess {
            image: image.name().to_owned(),
        });
    }

    fn begin_event(&mut self, label: &str) {
        self.command(HeadlessCommand::BeginEvent(label.to_owned()));
    }

    fn end_event(&mut self) {
        self.command(HeadlessCommand::EndEvent);
    }

    fn set_marker(&mut self, label: &str) {
        self.command(HeadlessCommand::Marker(label.to_owned()));
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}
