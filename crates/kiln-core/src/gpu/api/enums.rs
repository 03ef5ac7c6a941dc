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

//! Enumerations shared across the device layer.

use bitflags::bitflags;
use serde::{Deserialize, Serialize};
use std::fmt;

/// The native graphics API a process runs on.
///
/// The choice is made once at startup; see [`GraphicsApi::from_args`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum GraphicsApi {
    /// The DX-style backend.
    #[default]
    D3D12,
    /// The Vulkan-style backend.
    Vulkan,
    /// The in-process simulated GPU used for CI and tests.
    Headless,
}

impl GraphicsApi {
    /// Maps a single command-line flag to an API, if it is recognized.
    pub fn from_flag(flag: &str) -> Option<Self> {
        match flag.to_ascii_lowercase().as_str() {
            "-d3d12" | "-dx12" | "--d3d12" | "--dx12" | "--dx" => Some(Self::D3D12),
            "-vk" | "-vulkan" | "--vk" | "--vulkan" => Some(Self::Vulkan),
            "-headless" | "--headless" => Some(Self::Headless),
            _ => None,
        }
    }

    /// Picks the API from a command line.
    ///
    /// The first recognized backend flag wins; without one the D3D12 backend
    /// is used.
    pub fn from_args<I, S>(args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        args.into_iter()
            .find_map(|arg| Self::from_flag(arg.as_ref()))
            .unwrap_or_default()
    }

    /// Returns a human-readable name for the API.
    pub const fn name(&self) -> &'static str {
        match self {
            Self::D3D12 => "D3D12",
            Self::Vulkan => "Vulkan",
            Self::Headless => "Headless",
        }
    }
}

impl fmt::Display for GraphicsApi {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// The category of work a queue accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum QueueType {
    /// Graphics, compute and copy work.
    Graphics,
    /// Compute and copy work.
    Compute,
    /// Copy work only.
    Copy,
    /// Presentation to a swap chain.
    Present,
}

impl QueueType {
    /// The queue types that own a native submission channel.
    pub const SUBMISSION: [QueueType; 3] = [QueueType::Graphics, QueueType::Compute, QueueType::Copy];

    /// Number of bits a fence value reserves for its counter.
    pub const FENCE_SHIFT: u32 = 56;

    /// Returns the stable index of the queue type.
    pub const fn index(&self) -> usize {
        match self {
            Self::Graphics => 0,
            Self::Compute => 1,
            Self::Copy => 2,
            Self::Present => 3,
        }
    }

    /// Decodes an index produced by [`QueueType::index`].
    pub const fn from_index(index: u64) -> Option<Self> {
        match index {
            0 => Some(Self::Graphics),
            1 => Some(Self::Compute),
            2 => Some(Self::Copy),
            3 => Some(Self::Present),
            _ => None,
        }
    }

    /// The high bits that tag every fence value produced by this queue type.
    pub const fn fence_base(&self) -> u64 {
        (self.index() as u64) << Self::FENCE_SHIFT
    }

    /// Returns the command-list type recorded for this queue.
    pub const fn command_list_type(&self) -> CommandListType {
        match self {
            Self::Graphics | Self::Present => CommandListType::Direct,
            Self::Compute => CommandListType::Compute,
            Self::Copy => CommandListType::Copy,
        }
    }

    /// Returns a human-readable name for the queue type.
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Graphics => "Graphics",
            Self::Compute => "Compute",
            Self::Copy => "Copy",
            Self::Present => "Present",
        }
    }
}

impl fmt::Display for QueueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// The type of a native command list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CommandListType {
    /// A list executed on the graphics queue.
    Direct,
    /// A reusable list executed from inside a direct list. It has no queue.
    Bundle,
    /// A list executed on the compute queue.
    Compute,
    /// A list executed on the copy queue.
    Copy,
}

impl CommandListType {
    /// All command-list types, in index order.
    pub const ALL: [CommandListType; 4] = [
        CommandListType::Direct,
        CommandListType::Bundle,
        CommandListType::Compute,
        CommandListType::Copy,
    ];

    /// Returns the stable index of the list type.
    pub const fn index(&self) -> usize {
        match self {
            Self::Direct => 0,
            Self::Bundle => 1,
            Self::Compute => 2,
            Self::Copy => 3,
        }
    }

    /// Returns the queue that executes lists of this type, or `None` for
    /// bundles.
    pub const fn queue_type(&self) -> Option<QueueType> {
        match self {
            Self::Direct => Some(QueueType::Graphics),
            Self::Bundle => None,
            Self::Compute => Some(QueueType::Compute),
            Self::Copy => Some(QueueType::Copy),
        }
    }
}

impl fmt::Display for CommandListType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Direct => "Direct",
            Self::Bundle => "Bundle",
            Self::Compute => "Compute",
            Self::Copy => "Copy",
        };
        f.write_str(name)
    }
}

bitflags! {
    /// The kind of a GPU resource.
    ///
    /// Kinds are flags so that families ("any 2D texture") can be tested with a
    /// single mask.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct ResourceType: u32 {
        /// A one-dimensional texture.
        const TEXTURE_1D = 1 << 0;
        /// An array of one-dimensional textures.
        const TEXTURE_1D_ARRAY = 1 << 1;
        /// A two-dimensional texture.
        const TEXTURE_2D = 1 << 2;
        /// An array of two-dimensional textures.
        const TEXTURE_2D_ARRAY = 1 << 3;
        /// A multisampled two-dimensional texture.
        const TEXTURE_2D_MS = 1 << 4;
        /// An array of multisampled two-dimensional textures.
        const TEXTURE_2D_MS_ARRAY = 1 << 5;
        /// A cube texture.
        const TEXTURE_CUBE = 1 << 6;
        /// An array of cube textures.
        const TEXTURE_CUBE_ARRAY = 1 << 7;
        /// A volume texture.
        const TEXTURE_3D = 1 << 8;
        /// An index buffer.
        const INDEX_BUFFER = 1 << 9;
        /// A vertex buffer.
        const VERTEX_BUFFER = 1 << 10;
        /// A typed buffer.
        const TYPED_BUFFER = 1 << 11;
        /// A buffer the CPU reads back.
        const READBACK_BUFFER = 1 << 12;
        /// A constant buffer.
        const CONSTANT_BUFFER = 1 << 13;

        /// Any texture kind.
        const TEXTURE = Self::TEXTURE_1D.bits()
            | Self::TEXTURE_1D_ARRAY.bits()
            | Self::TEXTURE_2D.bits()
            | Self::TEXTURE_2D_ARRAY.bits()
            | Self::TEXTURE_2D_MS.bits()
            | Self::TEXTURE_2D_MS_ARRAY.bits()
            | Self::TEXTURE_CUBE.bits()
            | Self::TEXTURE_CUBE_ARRAY.bits()
            | Self::TEXTURE_3D.bits();
        /// Any array texture kind.
        const TEXTURE_ARRAY = Self::TEXTURE_1D_ARRAY.bits()
            | Self::TEXTURE_2D_ARRAY.bits()
            | Self::TEXTURE_2D_MS_ARRAY.bits()
            | Self::TEXTURE_CUBE_ARRAY.bits();
        /// Any multisampled texture kind.
        const TEXTURE_MS = Self::TEXTURE_2D_MS.bits() | Self::TEXTURE_2D_MS_ARRAY.bits();
        /// Any cube texture kind.
        const TEXTURE_CUBE_ANY = Self::TEXTURE_CUBE.bits() | Self::TEXTURE_CUBE_ARRAY.bits();
        /// Any buffer kind.
        const BUFFER = Self::INDEX_BUFFER.bits()
            | Self::VERTEX_BUFFER.bits()
            | Self::TYPED_BUFFER.bits()
            | Self::READBACK_BUFFER.bits()
            | Self::CONSTANT_BUFFER.bits();
    }
}

impl ResourceType {
    /// Returns `true` for texture kinds.
    pub fn is_texture(&self) -> bool {
        self.intersects(Self::TEXTURE)
    }

    /// Returns `true` for array texture kinds.
    pub fn is_array(&self) -> bool {
        self.intersects(Self::TEXTURE_ARRAY)
    }

    /// Returns `true` for multisampled texture kinds.
    pub fn is_multisampled(&self) -> bool {
        self.intersects(Self::TEXTURE_MS)
    }

    /// Returns `true` for cube texture kinds.
    pub fn is_cube(&self) -> bool {
        self.intersects(Self::TEXTURE_CUBE_ANY)
    }

    /// Returns `true` for volume textures.
    pub fn is_volume(&self) -> bool {
        self.contains(Self::TEXTURE_3D)
    }

    /// Returns `true` for buffer kinds.
    pub fn is_buffer(&self) -> bool {
        self.intersects(Self::BUFFER)
    }
}

impl Default for ResourceType {
    fn default() -> Self {
        Self::TEXTURE_2D
    }
}

bitflags! {
    /// The aspects of an image a view or barrier covers.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct ImageAspect: u32 {
        /// Color data.
        const COLOR = 1 << 0;
        /// Depth data.
        const DEPTH = 1 << 1;
        /// Stencil data.
        const STENCIL = 1 << 2;
    }
}

bitflags! {
    /// How an image is going to be used, decided at creation time.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct GpuImageUsage: u32 {
        /// Color render target.
        const RENDER_TARGET = 1 << 0;
        /// Depth/stencil target.
        const DEPTH_STENCIL = 1 << 1;
        /// Sampled from shaders.
        const SHADER_RESOURCE = 1 << 2;
        /// Read and written from shaders.
        const UNORDERED_ACCESS = 1 << 3;
        /// Source of copy operations.
        const COPY_SOURCE = 1 << 4;
        /// Destination of copy operations.
        const COPY_DEST = 1 << 5;
    }
}

/// How a swap chain paces presentation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PresentMode {
    /// Presentation waits for vertical blank.
    Fifo,
    /// Presentation happens as soon as possible, allowing tearing.
    Immediate,
}

impl PresentMode {
    /// Maps the vsync option to a present mode.
    pub const fn from_vsync(enable_vsync: bool) -> Self {
        if enable_vsync {
            Self::Fifo
        } else {
            Self::Immediate
        }
    }
}
