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

use super::resource::NativeImage;
use crate::gpu::api::{Format, PresentMode};
use crate::gpu::error::NativeError;
use std::fmt::Debug;
use std::sync::Arc;

/// A native swap chain.
pub trait NativeSwapChain: Send + Debug {
    /// Number of back buffers.
    fn buffer_count(&self) -> u32;

    /// Back-buffer format.
    fn format(&self) -> Format;

    /// Back-buffer extent.
    fn extent(&self) -> (u32, u32);

    /// Presentation pacing actually in use.
    fn present_mode(&self) -> PresentMode;

    /// Returns back buffer `index`.
    fn buffer(&self, index: u32) -> Result<Arc<dyn NativeImage>, NativeError>;

    /// Returns the index of the back buffer to render the next frame into.
    fn acquire_next_image(&mut self) -> Result<u32, NativeError>;

    /// Hands back buffer `index` to the presentation engine.
    fn present(&mut self, index: u32) -> Result<(), NativeError>;
}
