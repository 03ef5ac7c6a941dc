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

use super::command_context::CommandContext;
use crate::gpu::api::{FenceValue, ResourceState};
use crate::gpu::error::GraphicsError;
use crate::gpu::resource::ColorBuffer;
use std::ops::{Deref, DerefMut};

/// A command context for compute work, on the compute queue or on the
/// graphics queue.
#[derive(Debug)]
pub struct ComputeContext {
    context: CommandContext,
}

impl ComputeContext {
    pub(crate) fn new(context: CommandContext) -> Self {
        Self { context }
    }

    /// Clears every mip of `target` to zero through unordered access.
    pub fn clear_uav(&mut self, target: &ColorBuffer) -> Result<(), GraphicsError> {
        target.uav(0)?;
        self.context
            .transition_resource(target, ResourceState::UNORDERED_ACCESS, false)?;
        self.context
            .record(|list| list.clear_unordered_access(target.resource().native_image().as_ref()))
    }

    /// Submits the recorded work. See [`CommandContext::finish`].
    pub fn finish(self, wait_for_completion: bool) -> Result<FenceValue, GraphicsError> {
        self.context.finish(wait_for_completion)
    }
}

impl Deref for ComputeContext {
    type Target = CommandContext;

    fn deref(&self) -> &Self::Target {
        &self.context
    }
}

impl DerefMut for ComputeContext {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.context
    }
}
