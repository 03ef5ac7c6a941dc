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

use crate::gpu::api::{Format, ImageViewDesc};
use std::any::Any;
use std::fmt::Debug;

/// A native image with its backing memory.
///
/// Shared (`Arc`) at the interop boundary: barriers, views and the owning
/// resource all refer to the same image.
pub trait NativeImage: Send + Sync + Debug {
    /// Debug name of the image.
    fn name(&self) -> &str;

    /// Pixel format.
    fn format(&self) -> Format;

    /// `(width, height, array_size_or_depth)`.
    fn extent(&self) -> (u32, u32, u32);

    /// Allows downcasting to the backend's concrete type.
    fn as_any(&self) -> &dyn Any;
}

/// A native view onto an image.
pub trait NativeImageView: Send + Sync + Debug {
    /// The description the view was created from.
    fn desc(&self) -> &ImageViewDesc;

    /// Allows downcasting to the backend's concrete type.
    fn as_any(&self) -> &dyn Any;
}
