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

//! Barrier descriptors handed to native command lists.

use super::state::ResourceState;
use crate::gpu::traits::NativeImage;
use std::fmt;
use std::sync::Arc;

/// The part of an image a barrier applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubresourceRange {
    /// First mip level.
    pub mip_level: u32,
    /// Number of mip levels.
    pub num_mips: u32,
    /// First array slice.
    pub array_slice: u32,
    /// Number of array slices, or the depth of a volume texture.
    pub array_size_or_depth: u32,
    /// Number of planes (2 for depth/stencil formats).
    pub plane_count: u32,
    /// Whether the range covers every subresource of the image.
    pub whole_resource: bool,
}

impl SubresourceRange {
    /// A range covering every subresource of an image.
    pub const fn whole(num_mips: u32, array_size_or_depth: u32, plane_count: u32) -> Self {
        Self {
            mip_level: 0,
            num_mips,
            array_slice: 0,
            array_size_or_depth,
            plane_count,
            whole_resource: true,
        }
    }
}

/// What a barrier synchronizes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BarrierKind {
    /// A state transition.
    Transition {
        /// State the resource is in before the barrier.
        before: ResourceState,
        /// State the resource is in after the barrier.
        after: ResourceState,
    },
    /// Orders unordered-access writes against later unordered-access work,
    /// without a state change.
    UnorderedAccess,
}

/// A barrier on one image.
#[derive(Clone)]
pub struct ResourceBarrier {
    /// The image the barrier applies to.
    pub image: Arc<dyn NativeImage>,
    /// The synchronization performed.
    pub kind: BarrierKind,
    /// The subresources covered.
    pub range: SubresourceRange,
}

impl ResourceBarrier {
    /// Returns the `(before, after)` pair of a transition barrier.
    pub fn transition_states(&self) -> Option<(ResourceState, ResourceState)> {
        match self.kind {
            BarrierKind::Transition { before, after } => Some((before, after)),
            BarrierKind::UnorderedAccess => None,
        }
    }
}

impl fmt::Debug for ResourceBarrier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResourceBarrier")
            .field("image", &self.image.name())
            .field("kind", &self.kind)
            .field("range", &self.range)
            .finish()
    }
}
