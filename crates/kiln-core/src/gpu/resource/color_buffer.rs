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

use super::gpu_resource::GpuResource;
use super::pixel_buffer::PixelBuffer;
use super::view::ImageView;
use crate::gpu::api::{
    compute_num_mips, ClearValue, ColorBufferDesc, GpuImageUsage, ImageAspect, PixelBufferDesc,
    ResourceState, ResourceType,
};
use crate::gpu::device::{DescriptorHeapKind, Device};
use crate::gpu::error::{ContractViolation, GraphicsError};
use crate::gpu::traits::NativeImage;
use std::sync::Arc;

/// A texture rendered to as a color target and read back in shaders.
///
/// Render-target and shader-resource views are created up front, plus one
/// unordered-access view per mip when the buffer is single-sampled and its
/// format allows shader writes.
#[derive(Debug)]
pub struct ColorBuffer {
    pixel: PixelBuffer,
    clear_color: [f32; 4],
    num_fragments: u32,
    rtv: ImageView,
    srv: ImageView,
    uavs: Vec<ImageView>,
}

impl ColorBuffer {
    /// Creates the buffer and its views.
    pub(crate) fn create(device: &Device, desc: &ColorBufferDesc) -> Result<Self, GraphicsError> {
        let mut pixel_desc = desc.pixel.clone();
        if pixel_desc.num_mips == 0 {
            pixel_desc.num_mips = if pixel_desc.num_samples > 1 {
                1
            } else {
                compute_num_mips(pixel_desc.width, pixel_desc.height)
            };
        }
        if pixel_desc.resource_type.is_array() && pixel_desc.num_mips > 1 {
            return Err(ContractViolation::InvalidCreationParams(format!(
                "color buffer array '{}' cannot have mips",
                pixel_desc.name
            ))
            .into());
        }
        if pixel_desc.num_samples > 1 && pixel_desc.resource_type == ResourceType::TEXTURE_2D {
            pixel_desc.resource_type = ResourceType::TEXTURE_2D_MS;
        }

        let mut usage = GpuImageUsage::RENDER_TARGET
            | GpuImageUsage::SHADER_RESOURCE
            | GpuImageUsage::COPY_SOURCE
            | GpuImageUsage::COPY_DEST;
        let with_uavs = pixel_desc.num_samples == 1 && pixel_desc.format.supports_unordered_access();
        if with_uavs {
            usage |= GpuImageUsage::UNORDERED_ACCESS;
        }

        let pixel = PixelBuffer::create(
            device,
            &pixel_desc,
            usage,
            ResourceState::COMMON,
            Some(ClearValue::Color(desc.clear_color)),
        )?;
        Self::with_views(device, pixel, desc.clear_color, desc.num_fragments.max(1), with_uavs)
    }

    /// Wraps back buffer `index` of a swap chain.
    pub(crate) fn from_swap_chain(
        device: &Device,
        index: u32,
        image: Arc<dyn NativeImage>,
        initial_state: ResourceState,
    ) -> Result<Self, GraphicsError> {
        let (width, height, _) = image.extent();
        let desc = PixelBufferDesc {
            name: format!("Primary SwapChain Image {index}"),
            width,
            height,
            format: image.format(),
            ..Default::default()
        };
        let pixel = PixelBuffer::from_image(&desc, image, initial_state);
        Self::with_views(device, pixel, [0.0, 0.0, 0.0, 1.0], 1, false)
    }

    fn with_views(
        device: &Device,
        pixel: PixelBuffer,
        clear_color: [f32; 4],
        num_fragments: u32,
        with_uavs: bool,
    ) -> Result<Self, GraphicsError> {
        let mut rtv_desc = pixel.view_desc("RTV", GpuImageUsage::RENDER_TARGET, ImageAspect::COLOR);
        rtv_desc.mip_count = 1;
        let rtv = pixel.create_view(device, DescriptorHeapKind::RenderTarget, rtv_desc)?;

        let srv_desc = pixel.view_desc("SRV", GpuImageUsage::SHADER_RESOURCE, ImageAspect::COLOR);
        let srv = pixel.create_view(device, DescriptorHeapKind::Resource, srv_desc)?;

        let mut uavs = Vec::new();
        if with_uavs {
            for mip in 0..pixel.num_mips() {
                let mut uav_desc = pixel.view_desc(
                    &format!("UAV{mip}"),
                    GpuImageUsage::UNORDERED_ACCESS,
                    ImageAspect::COLOR,
                );
                uav_desc.base_mip_level = mip;
                uav_desc.mip_count = 1;
                uavs.push(pixel.create_view(device, DescriptorHeapKind::Resource, uav_desc)?);
            }
        }

        Ok(Self {
            pixel,
            clear_color,
            num_fragments,
            rtv,
            srv,
            uavs,
        })
    }

    /// The underlying pixel buffer.
    pub fn pixel(&self) -> &PixelBuffer {
        &self.pixel
    }

    /// The tracked resource.
    pub fn resource(&self) -> &GpuResource {
        self.pixel.resource()
    }

    /// Render-target view of mip 0.
    pub fn rtv(&self) -> &ImageView {
        &self.rtv
    }

    /// Shader-resource view of every mip.
    pub fn srv(&self) -> &ImageView {
        &self.srv
    }

    /// Unordered-access view of `mip`.
    pub fn uav(&self, mip: u32) -> Result<&ImageView, ContractViolation> {
        self.uavs
            .get(mip as usize)
            .ok_or_else(|| ContractViolation::UnsupportedInterface {
                resource: self.resource().name().to_owned(),
                interface: "UnorderedAccessView",
            })
    }

    /// Returns `true` if the buffer has unordered-access views.
    pub fn has_uavs(&self) -> bool {
        !self.uavs.is_empty()
    }

    /// Fast-clear color.
    pub fn clear_color(&self) -> [f32; 4] {
        self.clear_color
    }

    /// Number of color fragments per pixel.
    pub fn num_fragments(&self) -> u32 {
        self.num_fragments
    }
}

impl AsRef<GpuResource> for ColorBuffer {
    fn as_ref(&self) -> &GpuResource {
        self.resource()
    }
}
