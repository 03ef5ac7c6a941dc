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

//! Creation parameters for images, views, pixel buffers and swap chains.

use super::enums::{GpuImageUsage, ImageAspect, PresentMode, ResourceType};
use super::format::Format;
use super::state::ResourceState;
use crate::platform::PlatformWindow;
use std::fmt;

/// Number of mip levels in a full chain for the given extent.
pub fn compute_num_mips(width: u32, height: u32) -> u32 {
    let bits = width | height;
    if bits == 0 {
        1
    } else {
        u32::BITS - bits.leading_zeros()
    }
}

/// Parameters shared by every pixel buffer.
#[derive(Debug, Clone, PartialEq)]
pub struct PixelBufferDesc {
    /// Debug name.
    pub name: String,
    /// Texture kind.
    pub resource_type: ResourceType,
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// Array size, or depth for volume textures.
    pub array_size_or_depth: u32,
    /// Number of mip levels.
    pub num_mips: u32,
    /// Multisample count.
    pub num_samples: u32,
    /// Pixel format.
    pub format: Format,
}

impl Default for PixelBufferDesc {
    fn default() -> Self {
        Self {
            name: String::new(),
            resource_type: ResourceType::TEXTURE_2D,
            width: 0,
            height: 0,
            array_size_or_depth: 1,
            num_mips: 1,
            num_samples: 1,
            format: Format::Unknown,
        }
    }
}

/// Parameters for a [`ColorBuffer`](crate::gpu::ColorBuffer).
#[derive(Debug, Clone, PartialEq)]
pub struct ColorBufferDesc {
    /// Shared pixel-buffer parameters. `num_mips == 0` requests a full chain.
    pub pixel: PixelBufferDesc,
    /// Fast-clear color.
    pub clear_color: [f32; 4],
    /// Number of fragments per pixel for MSAA compression.
    pub num_fragments: u32,
}

impl Default for ColorBufferDesc {
    fn default() -> Self {
        Self {
            pixel: PixelBufferDesc::default(),
            clear_color: [0.0, 0.0, 0.0, 1.0],
            num_fragments: 1,
        }
    }
}

impl ColorBufferDesc {
    /// Starts a description with a name.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            pixel: PixelBufferDesc {
                name: name.into(),
                ..Default::default()
            },
            ..Default::default()
        }
    }

    /// Sets the texture kind.
    pub fn resource_type(mut self, resource_type: ResourceType) -> Self {
        self.pixel.resource_type = resource_type;
        self
    }

    /// Sets the extent.
    pub fn size(mut self, width: u32, height: u32) -> Self {
        self.pixel.width = width;
        self.pixel.height = height;
        self
    }

    /// Sets the array size, or the depth for volume textures.
    pub fn array_size_or_depth(mut self, array_size_or_depth: u32) -> Self {
        self.pixel.array_size_or_depth = array_size_or_depth;
        self
    }

    /// Sets the mip count; `0` requests a full chain.
    pub fn num_mips(mut self, num_mips: u32) -> Self {
        self.pixel.num_mips = num_mips;
        self
    }

    /// Sets the multisample count.
    pub fn num_samples(mut self, num_samples: u32) -> Self {
        self.pixel.num_samples = num_samples;
        self
    }

    /// Sets the pixel format.
    pub fn format(mut self, format: Format) -> Self {
        self.pixel.format = format;
        self
    }

    /// Sets the fast-clear color.
    pub fn clear_color(mut self, clear_color: [f32; 4]) -> Self {
        self.clear_color = clear_color;
        self
    }

    /// Sets the fragment count.
    pub fn num_fragments(mut self, num_fragments: u32) -> Self {
        self.num_fragments = num_fragments;
        self
    }
}

/// Parameters for a [`DepthBuffer`](crate::gpu::DepthBuffer).
///
/// Depth buffers are single-slice, single-mip and single-sample; those fields
/// of `pixel` are forced to 1 at creation.
#[derive(Debug, Clone, PartialEq)]
pub struct DepthBufferDesc {
    /// Shared pixel-buffer parameters.
    pub pixel: PixelBufferDesc,
    /// Fast-clear depth.
    pub clear_depth: f32,
    /// Fast-clear stencil.
    pub clear_stencil: u8,
}

impl Default for DepthBufferDesc {
    fn default() -> Self {
        Self {
            pixel: PixelBufferDesc::default(),
            clear_depth: 1.0,
            clear_stencil: 0,
        }
    }
}

impl DepthBufferDesc {
    /// Starts a description with a name.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            pixel: PixelBufferDesc {
                name: name.into(),
                ..Default::default()
            },
            ..Default::default()
        }
    }

    /// Sets the extent.
    pub fn size(mut self, width: u32, height: u32) -> Self {
        self.pixel.width = width;
        self.pixel.height = height;
        self
    }

    /// Sets the depth format.
    pub fn format(mut self, format: Format) -> Self {
        self.pixel.format = format;
        self
    }

    /// Sets the fast-clear depth.
    pub fn clear_depth(mut self, clear_depth: f32) -> Self {
        self.clear_depth = clear_depth;
        self
    }

    /// Sets the fast-clear stencil.
    pub fn clear_stencil(mut self, clear_stencil: u8) -> Self {
        self.clear_stencil = clear_stencil;
        self
    }
}

/// Native image creation request.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageDesc {
    /// Debug name.
    pub name: String,
    /// Texture kind.
    pub resource_type: ResourceType,
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// Array size, or depth for volume textures.
    pub array_size_or_depth: u32,
    /// Number of mip levels.
    pub num_mips: u32,
    /// Multisample count.
    pub num_samples: u32,
    /// Pixel format.
    pub format: Format,
    /// Usages the image must support.
    pub usage: GpuImageUsage,
    /// State the image is created in.
    pub initial_state: ResourceState,
    /// Optimized clear value, if any.
    pub clear_value: Option<ClearValue>,
}

/// An optimized clear value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ClearValue {
    /// Clear color.
    Color([f32; 4]),
    /// Clear depth and stencil.
    DepthStencil {
        /// Depth value.
        depth: f32,
        /// Stencil value.
        stencil: u8,
    },
}

/// Native image-view creation request.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageViewDesc {
    /// Debug name.
    pub name: String,
    /// Texture kind of the view.
    pub resource_type: ResourceType,
    /// The single usage the view is made for.
    pub usage: GpuImageUsage,
    /// View format.
    pub format: Format,
    /// Aspects covered by the view.
    pub aspect: ImageAspect,
    /// First mip level.
    pub base_mip_level: u32,
    /// Number of mip levels.
    pub mip_count: u32,
    /// First array slice.
    pub base_array_slice: u32,
    /// Number of array slices.
    pub array_size: u32,
    /// Whether a depth view is read-only.
    pub read_only: bool,
}

/// Native swap-chain creation request.
#[derive(Clone)]
pub struct SwapChainDesc {
    /// Window to present into; `None` builds an offscreen swap chain.
    pub window: Option<PlatformWindow>,
    /// Back-buffer width.
    pub width: u32,
    /// Back-buffer height.
    pub height: u32,
    /// Number of back buffers.
    pub buffer_count: u32,
    /// Back-buffer format, already adjusted for the API.
    pub format: Format,
    /// Multisample count.
    pub sample_count: u32,
    /// Multisample quality.
    pub sample_quality: u32,
    /// Presentation pacing.
    pub present_mode: PresentMode,
    /// Allows display mode switches.
    pub allow_mode_switch: bool,
    /// Number of frames that may be queued for presentation.
    pub max_frame_latency: u32,
}

impl fmt::Debug for SwapChainDesc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SwapChainDesc")
            .field("windowed", &self.window.is_some())
            .field("width", &self.width)
            .field("height", &self.height)
            .field("buffer_count", &self.buffer_count)
            .field("format", &self.format)
            .field("present_mode", &self.present_mode)
            .finish()
    }
}
