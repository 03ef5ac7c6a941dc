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

use super::resource::{NativeImage, NativeImageView};
use crate::gpu::api::{CommandListType, ResourceBarrier};
use crate::gpu::error::NativeError;
use std::any::Any;
use std::fmt::Debug;

/// Backing storage for recorded commands.
///
/// The device layer owns allocators exclusively and moves them between its
/// pool and the context recording into them.
pub trait NativeCommandAllocator: Send + Debug {
    /// The list type this allocator records for.
    fn list_type(&self) -> CommandListType;

    /// Releases everything recorded into the allocator.
    ///
    /// Only called once the GPU has finished every list recorded from it.
    fn reset(&mut self) -> Result<(), NativeError>;

    /// Allows downcasting to the backend's concrete type.
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

/// A native command list.
///
/// Lists move between the closed state (after creation and `close`) and the
/// recording state (after `reset`).
pub trait NativeCommandList: Send + Debug {
    /// The type of the list.
    fn list_type(&self) -> CommandListType;

    /// Starts recording into `allocator`.
    fn reset(&mut self, allocator: &mut dyn NativeCommandAllocator) -> Result<(), NativeError>;

    /// Stops recording.
    fn close(&mut self) -> Result<(), NativeError>;

    /// Records a batch of barriers as a single native call.
    fn resource_barriers(&mut self, barriers: &[ResourceBarrier]);

    /// Copies the whole of `src` into `dst`.
    fn copy_image(&mut self, dst: &dyn NativeImage, src: &dyn NativeImage);

    /// Clears a render-target view.
    fn clear_color(&mut self, view: &dyn NativeImageView, color: [f32; 4]);

    /// Clears a depth-stencil view. `None` leaves that aspect untouched.
    fn clear_depth_stencil(&mut self, view: &dyn NativeImageView, depth: Option<f32>, stencil: Option<u8>);

    /// Clears an image written through unordered access to zero.
    fn clear_unordered_access(&mut self, image: &dyn NativeImage);

    /// Opens a named debug region.
    fn begin_event(&mut self, label: &str);

    /// Closes the innermost debug region.
    fn end_event(&mut self);

    /// Inserts a named debug marker.
    fn set_marker(&mut self, label: &str);

    /// Allows downcasting to the backend's concrete type.
    fn as_any_mut(&mut self) -> &mut dyn Any;
}
