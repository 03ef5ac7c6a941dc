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

//! GPU resources and their state tracking.
//!
//! [`GpuResource`] holds the execution state; [`PixelBuffer`] adds dimensions
//! and format; [`ColorBuffer`] and [`DepthBuffer`] add pre-built views.

mod color_buffer;
mod depth_buffer;
mod gpu_resource;
mod pixel_buffer;
mod view;

pub use self::color_buffer::ColorBuffer;
pub use self::depth_buffer::DepthBuffer;
pub use self::gpu_resource::GpuResource;
pub use self::pixel_buffer::PixelBuffer;
pub use self::view::ImageView;
