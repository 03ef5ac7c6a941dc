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

//! Conversions between the device layer's plain types and wgpu's.

use kiln_core::gpu::api::{
    AdapterClass, Format, GpuImageUsage, ImageAspect, PresentMode, ResourceType,
};

/// A local extension trait to convert device-layer types into wgpu types.
/// This avoids Rust's orphan rules while keeping an idiomatic `.into_wgpu()` syntax.
pub trait IntoWgpu<T> {
    /// Consumes self and converts it into a wgpu type.
    fn into_wgpu(self) -> T;
}

impl IntoWgpu<Option<wgpu::TextureFormat>> for Format {
    fn into_wgpu(self) -> Option<wgpu::TextureFormat> {
        let format = match self {
            Format::Unknown => return None,
            Format::RGBA8_UNorm => wgpu::TextureFormat::Rgba8Unorm,
            Format::SRGBA8_UNorm => wgpu::TextureFormat::Rgba8UnormSrgb,
            Format::BGRA8_UNorm => wgpu::TextureFormat::Bgra8Unorm,
            Format::SBGRA8_UNorm => wgpu::TextureFormat::Bgra8UnormSrgb,
            Format::RGBA16_Float => wgpu::TextureFormat::Rgba16Float,
            Format::R11G11B10_Float => wgpu::TextureFormat::Rg11b10Ufloat,
            Format::RGB10A2_UNorm => wgpu::TextureFormat::Rgb10a2Unorm,
            Format::R32_Float => wgpu::TextureFormat::R32Float,
            Format::D16_UNorm => wgpu::TextureFormat::Depth16Unorm,
            Format::D24S8 => wgpu::TextureFormat::Depth24PlusStencil8,
            Format::D32_Float => wgpu::TextureFormat::Depth32Float,
            Format::D32S8 => wgpu::TextureFormat::Depth32FloatStencil8,
        };
        Some(format)
    }
}

/// Maps a wgpu format back to a device-layer format, if it has one.
pub fn from_wgpu_texture_format(format: wgpu::TextureFormat) -> Option<Format> {
    let format = match format {
        wgpu::TextureFormat::Rgba8Unorm => Format::RGBA8_UNorm,
        wgpu::TextureFormat::Rgba8UnormSrgb => Format::SRGBA8_UNorm,
        wgpu::TextureFormat::Bgra8Unorm => Format::BGRA8_UNorm,
        wgpu::TextureFormat::Bgra8UnormSrgb => Format::SBGRA8_UNorm,
        wgpu::TextureFormat::Rgba16Float => Format::RGBA16_Float,
        wgpu::TextureFormat::Rg11b10Ufloat => Format::R11G11B10_Float,
        wgpu::TextureFormat::Rgb10a2Unorm => Format::RGB10A2_UNorm,
        wgpu::TextureFormat::R32Float => Format::R32_Float,
        wgpu::TextureFormat::Depth16Unorm => Format::D16_UNorm,
        wgpu::TextureFormat::Depth24PlusStencil8 => Format::D24S8,
        wgpu::TextureFormat::Depth32Float => Format::D32_Float,
        wgpu::TextureFormat::Depth32FloatStencil8 => Format::D32S8,
        _ => return None,
    };
    Some(format)
}

impl IntoWgpu<wgpu::TextureUsages> for GpuImageUsage {
    fn into_wgpu(self) -> wgpu::TextureUsages {
        let mut usages = wgpu::TextureUsages::empty();
        if self.intersects(GpuImageUsage::RENDER_TARGET | GpuImageUsage::DEPTH_STENCIL) {
            usages |= wgpu::TextureUsages::RENDER_ATTACHMENT;
        }
        if self.contains(GpuImageUsage::SHADER_RESOURCE) {
            usages |= wgpu::TextureUsages::TEXTURE_BINDING;
        }
        if self.contains(GpuImageUsage::UNORDERED_ACCESS) {
            usages |= wgpu::TextureUsages::STORAGE_BINDING;
        }
        if self.contains(GpuImageUsage::COPY_SOURCE) {
            usages |= wgpu::TextureUsages::COPY_SRC;
        }
        if self.contains(GpuImageUsage::COPY_DEST) {
            usages |= wgpu::TextureUsages::COPY_DST;
        }
        usages
    }
}

impl IntoWgpu<wgpu::TextureAspect> for ImageAspect {
    fn into_wgpu(self) -> wgpu::TextureAspect {
        if self == ImageAspect::DEPTH {
            wgpu::TextureAspect::DepthOnly
        } else if self == ImageAspect::STENCIL {
            wgpu::TextureAspect::StencilOnly
        } else {
            wgpu::TextureAspect::All
        }
    }
}

impl IntoWgpu<wgpu::TextureDimension> for ResourceType {
    fn into_wgpu(self) -> wgpu::TextureDimension {
        if self.is_volume() {
            wgpu::TextureDimension::D3
        } else if self.intersects(ResourceType::TEXTURE_1D) {
            wgpu::TextureDimension::D1
        } else {
            wgpu::TextureDimension::D2
        }
    }
}

impl IntoWgpu<wgpu::TextureViewDimension> for ResourceType {
    fn into_wgpu(self) -> wgpu::TextureViewDimension {
        if self.is_volume() {
            wgpu::TextureViewDimension::D3
        } else if self.contains(ResourceType::TEXTURE_CUBE_ARRAY) {
            wgpu::TextureViewDimension::CubeArray
        } else if self.contains(ResourceType::TEXTURE_CUBE) {
            wgpu::TextureViewDimension::Cube
        } else if self.intersects(ResourceType::TEXTURE_1D) {
            wgpu::TextureViewDimension::D1
        } else if self.is_array() {
            wgpu::TextureViewDimension::D2Array
        } else {
            wgpu::TextureViewDimension::D2
        }
    }
}

impl IntoWgpu<wgpu::PresentMode> for PresentMode {
    fn into_wgpu(self) -> wgpu::PresentMode {
        match self {
            PresentMode::Fifo => wgpu::PresentMode::Fifo,
            PresentMode::Immediate => wgpu::PresentMode::Immediate,
        }
    }
}

/// Classifies a wgpu adapter.
///
/// `software_vendor` is the vendor id whose adapters count as software
/// rasterizers on this flavour, if any.
pub fn adapter_class(
    device_type: wgpu::DeviceType,
    vendor_id: u32,
    software_vendor: Option<u32>,
) -> AdapterClass {
    if software_vendor == Some(vendor_id) {
        return AdapterClass::Software;
    }
    match device_type {
        wgpu::DeviceType::DiscreteGpu => AdapterClass::Discrete,
        wgpu::DeviceType::IntegratedGpu => AdapterClass::Integrated,
        wgpu::DeviceType::Cpu => AdapterClass::Software,
        _ => AdapterClass::Other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_round_trip_through_wgpu() {
        for format in [Format::SRGBA8_UNorm, Format::SBGRA8_UNorm, Format::RGBA16_Float, Format::D24S8] {
            let wgpu_format: Option<wgpu::TextureFormat> = format.into_wgpu();
            assert_eq!(wgpu_format.and_then(from_wgpu_texture_format), Some(format));
        }
        let unknown: Option<wgpu::TextureFormat> = Format::Unknown.into_wgpu();
        assert!(unknown.is_none());
    }

    #[test]
    fn usages_map_to_wgpu_bindings() {
        let usages: wgpu::TextureUsages =
            (GpuImageUsage::RENDER_TARGET | GpuImageUsage::UNORDERED_ACCESS).into_wgpu();
        assert!(usages.contains(wgpu::TextureUsages::RENDER_ATTACHMENT));
        assert!(usages.contains(wgpu::TextureUsages::STORAGE_BINDING));
        assert!(!usages.contains(wgpu::TextureUsages::TEXTURE_BINDING));
    }

    #[test]
    fn view_dimensions_follow_resource_type() {
        let dim: wgpu::TextureViewDimension = ResourceType::TEXTURE_2D_ARRAY.into_wgpu();
        assert_eq!(dim, wgpu::TextureViewDimension::D2Array);
        let dim: wgpu::TextureViewDimension = ResourceType::TEXTURE_CUBE.into_wgpu();
        assert_eq!(dim, wgpu::TextureViewDimension::Cube);
        let dim: wgpu::TextureDimension = ResourceType::TEXTURE_3D.into_wgpu();
        assert_eq!(dim, wgpu::TextureDimension::D3);
    }

    #[test]
    fn microsoft_adapters_are_software_on_d3d12() {
        assert_eq!(
            adapter_class(wgpu::DeviceType::IntegratedGpu, 0x1414, Some(0x1414)),
            AdapterClass::Software
        );
        assert_eq!(
            adapter_class(wgpu::DeviceType::IntegratedGpu, 0x1414, None),
            AdapterClass::Integrated
        );
        assert_eq!(adapter_class(wgpu::DeviceType::VirtualGpu, 0x10de, None), AdapterClass::Other);
    }
}
