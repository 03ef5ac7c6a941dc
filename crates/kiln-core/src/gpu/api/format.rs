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

//! Pixel formats used by color buffers, depth buffers and swap chains.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A pixel format.
#[allow(non_camel_case_types)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Format {
    /// No format.
    #[default]
    Unknown,
    /// 8-bit RGBA, normalized.
    RGBA8_UNorm,
    /// 8-bit RGBA, normalized, sRGB encoded.
    SRGBA8_UNorm,
    /// 8-bit BGRA, normalized.
    BGRA8_UNorm,
    /// 8-bit BGRA, normalized, sRGB encoded.
    SBGRA8_UNorm,
    /// 16-bit float RGBA.
    RGBA16_Float,
    /// Packed 11/11/10-bit float RGB.
    R11G11B10_Float,
    /// Packed 10/10/10/2-bit RGBA, normalized.
    RGB10A2_UNorm,
    /// 32-bit float red channel.
    R32_Float,
    /// 16-bit normalized depth.
    D16_UNorm,
    /// 24-bit normalized depth with 8-bit stencil.
    D24S8,
    /// 32-bit float depth.
    D32_Float,
    /// 32-bit float depth with 8-bit stencil.
    D32S8,
}

impl Format {
    /// Returns `true` for depth formats.
    pub const fn is_depth(&self) -> bool {
        matches!(
            self,
            Self::D16_UNorm | Self::D24S8 | Self::D32_Float | Self::D32S8
        )
    }

    /// Returns `true` for depth formats that carry a stencil plane.
    pub const fn has_stencil(&self) -> bool {
        matches!(self, Self::D24S8 | Self::D32S8)
    }

    /// Returns `true` for sRGB encoded color formats.
    pub const fn is_srgb(&self) -> bool {
        matches!(self, Self::SRGBA8_UNorm | Self::SBGRA8_UNorm)
    }

    /// Number of planes a barrier on this format has to cover.
    pub const fn plane_count(&self) -> u32 {
        if self.has_stencil() {
            2
        } else {
            1
        }
    }

    /// Size in bytes of one texel.
    pub const fn block_size(&self) -> u32 {
        match self {
            Self::Unknown => 0,
            Self::D16_UNorm => 2,
            Self::RGBA16_Float | Self::D32S8 => 8,
            _ => 4,
        }
    }

    /// Returns `true` if shaders may write this format through an unordered
    /// access view.
    pub const fn supports_unordered_access(&self) -> bool {
        matches!(
            self,
            Self::RGBA8_UNorm | Self::RGBA16_Float | Self::R32_Float | Self::RGB10A2_UNorm
        )
    }

    /// Returns the format a Vulkan swap chain uses for a requested format.
    ///
    /// Vulkan surfaces expose BGRA orderings, so RGBA requests are swizzled.
    pub const fn swap_chain_format_vulkan(&self) -> Self {
        match self {
            Self::SRGBA8_UNorm => Self::SBGRA8_UNorm,
            Self::RGBA8_UNorm => Self::BGRA8_UNorm,
            other => *other,
        }
    }
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn depth_formats_report_planes() {
        assert!(Format::D32S8.is_depth());
        assert!(Format::D32S8.has_stencil());
        assert_eq!(Format::D32S8.plane_count(), 2);
        assert!(Format::D32_Float.is_depth());
        assert!(!Format::D32_Float.has_stencil());
        assert_eq!(Format::D16_UNorm.plane_count(), 1);
        assert!(!Format::RGBA8_UNorm.is_depth());
    }

    #[test]
    fn vulkan_swap_chain_format_is_swizzled() {
        assert_eq!(Format::SRGBA8_UNorm.swap_chain_format_vulkan(), Format::SBGRA8_UNorm);
        assert_eq!(Format::RGBA8_UNorm.swap_chain_format_vulkan(), Format::BGRA8_UNorm);
        assert_eq!(Format::RGBA16_Float.swap_chain_format_vulkan(), Format::RGBA16_Float);
    }

    #[test]
    fn srgb_formats_have_no_unordered_access() {
        assert!(!Format::SRGBA8_UNorm.supports_unordered_access());
        assert!(Format::RGBA8_UNorm.supports_unordered_access());
    }
}
