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

//! Execution states a GPU resource can be in.

use bitflags::bitflags;

bitflags! {
    /// The pipeline role a resource is currently usable in.
    ///
    /// States are flags: several read-only states may be combined into one
    /// state (e.g. `SHADER_RESOURCE | COPY_SOURCE`), and compatibility between
    /// states is tested with flag checks.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct ResourceState: u32 {
        /// Contents are undefined; the resource has never been used.
        const UNDEFINED = 0;
        /// Shared state usable for implicit promotion.
        const COMMON = 0x1;
        /// Bound as a constant buffer.
        const CONSTANT_BUFFER = 0x2;
        /// Bound as a vertex buffer.
        const VERTEX_BUFFER = 0x4;
        /// Bound as an index buffer.
        const INDEX_BUFFER = 0x8;
        /// Read as indirect arguments.
        const INDIRECT_ARGUMENT = 0x10;
        /// Sampled from shaders.
        const SHADER_RESOURCE = 0x20;
        /// Read and written from shaders.
        const UNORDERED_ACCESS = 0x40;
        /// Written as a color render target.
        const RENDER_TARGET = 0x80;
        /// Written as a depth target.
        const DEPTH_WRITE = 0x100;
        /// Read as a depth target.
        const DEPTH_READ = 0x200;
        /// Written by stream output.
        const STREAM_OUT = 0x400;
        /// Destination of a copy.
        const COPY_DEST = 0x800;
        /// Source of a copy.
        const COPY_SOURCE = 0x1000;
        /// Destination of a multisample resolve.
        const RESOLVE_DEST = 0x2000;
        /// Source of a multisample resolve.
        const RESOLVE_SOURCE = 0x4000;
        /// Handed to the presentation engine.
        const PRESENT = 0x8000;
        /// Read as an acceleration structure.
        const ACCEL_STRUCT_READ = 0x10000;
        /// Written as an acceleration structure.
        const ACCEL_STRUCT_WRITE = 0x20000;
        /// Read as acceleration-structure build input.
        const ACCEL_STRUCT_BUILD_INPUT = 0x40000;
        /// Read while building a bottom-level acceleration structure.
        const ACCEL_STRUCT_BUILD_BLAS = 0x80000;
        /// Read as a variable-rate shading surface.
        const SHADING_RATE_SURFACE = 0x100000;
        /// Written as an opacity micromap.
        const OPACITY_MICROMAP_WRITE = 0x200000;
        /// Read as opacity-micromap build input.
        const OPACITY_MICROMAP_BUILD_INPUT = 0x400000;
        /// Read as a predication buffer.
        const PREDICATION = 0x800000;

        /// Every state that only reads the resource.
        const READ_ONLY = Self::COMMON.bits()
            | Self::CONSTANT_BUFFER.bits()
            | Self::VERTEX_BUFFER.bits()
            | Self::INDEX_BUFFER.bits()
            | Self::INDIRECT_ARGUMENT.bits()
            | Self::SHADER_RESOURCE.bits()
            | Self::DEPTH_READ.bits()
            | Self::COPY_SOURCE.bits()
            | Self::RESOLVE_SOURCE.bits()
            | Self::PRESENT.bits()
            | Self::ACCEL_STRUCT_READ.bits()
            | Self::ACCEL_STRUCT_BUILD_INPUT.bits()
            | Self::ACCEL_STRUCT_BUILD_BLAS.bits()
            | Self::SHADING_RATE_SURFACE.bits()
            | Self::OPACITY_MICROMAP_BUILD_INPUT.bits()
            | Self::PREDICATION.bits();

        /// States a compute or copy queue is allowed to transition into.
        const COMPUTE_QUEUE_VALID = Self::COMMON.bits()
            | Self::CONSTANT_BUFFER.bits()
            | Self::VERTEX_BUFFER.bits()
            | Self::INDEX_BUFFER.bits()
            | Self::INDIRECT_ARGUMENT.bits()
            | Self::SHADER_RESOURCE.bits()
            | Self::UNORDERED_ACCESS.bits()
            | Self::COPY_DEST.bits()
            | Self::COPY_SOURCE.bits()
            | Self::ACCEL_STRUCT_READ.bits()
            | Self::ACCEL_STRUCT_WRITE.bits()
            | Self::ACCEL_STRUCT_BUILD_INPUT.bits()
            | Self::ACCEL_STRUCT_BUILD_BLAS.bits();
    }
}

impl ResourceState {
    /// Returns `true` if every flag in the state only reads the resource.
    ///
    /// `UNDEFINED` is not read-only: nothing may be read from it.
    pub fn is_read_only(&self) -> bool {
        !self.is_empty() && Self::READ_ONLY.contains(*self)
    }

    /// Returns `true` if the state includes a write.
    pub fn is_write(&self) -> bool {
        !self.is_empty() && !Self::READ_ONLY.contains(*self)
    }

    /// Returns `true` if a resource in this state can also be used as `other`
    /// without a barrier, i.e. both are read-only states.
    pub fn is_compatible_with(&self, other: ResourceState) -> bool {
        self.is_read_only() && other.is_read_only()
    }

    /// Returns `true` if a compute or copy queue may use this state.
    pub fn is_valid_on_compute_queue(&self) -> bool {
        Self::COMPUTE_QUEUE_VALID.contains(*self)
    }
}

impl Default for ResourceState {
    fn default() -> Self {
        Self::UNDEFINED
    }
}
