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

use super::command::{NativeCommandAllocator, NativeCommandList};
use super::queue::NativeQueue;
use super::resource::{NativeImage, NativeImageView};
use super::swap_chain::NativeSwapChain;
use crate::gpu::api::{CommandListType, DeviceCaps, ImageDesc, ImageViewDesc, QueueType, SwapChainDesc};
use crate::gpu::error::NativeError;
use std::fmt::Debug;
use std::sync::Arc;

/// A native logical device.
///
/// The device is shared (`Arc`) between the [`Device`](crate::gpu::Device),
/// its queues and its command contexts; every method takes `&self`.
pub trait NativeDevice: Send + Sync + Debug + 'static {
    /// Reads the device capabilities.
    fn caps(&self) -> DeviceCaps;

    /// Creates the native queue for `queue_type`.
    ///
    /// The returned queue reports [`FenceValue::initial_completed`] until its
    /// first submission completes.
    ///
    /// [`FenceValue::initial_completed`]: crate::gpu::api::FenceValue::initial_completed
    fn create_queue(&self, queue_type: QueueType) -> Result<Box<dyn NativeQueue>, NativeError>;

    /// Creates a command allocator for lists of `list_type`.
    fn create_command_allocator(
        &self,
        list_type: CommandListType,
    ) -> Result<Box<dyn NativeCommandAllocator>, NativeError>;

    /// Creates a command list of `list_type`, in the closed state.
    fn create_command_list(
        &self,
        list_type: CommandListType,
    ) -> Result<Box<dyn NativeCommandList>, NativeError>;

    /// Creates an image and its backing memory.
    fn create_image(&self, desc: &ImageDesc) -> Result<Arc<dyn NativeImage>, NativeError>;

    /// Creates a view onto `image`.
    fn create_image_view(
        &self,
        image: &Arc<dyn NativeImage>,
        desc: &ImageViewDesc,
    ) -> Result<Arc<dyn NativeImageView>, NativeError>;

    /// Creates a swap chain.
    fn create_swap_chain(&self, desc: &SwapChainDesc) -> Result<Box<dyn NativeSwapChain>, NativeError>;

    /// Blocks until the device has finished all submitted work.
    fn wait_idle(&self) -> Result<(), NativeError>;
}
