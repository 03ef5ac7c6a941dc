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
    ClearValue, DepthBufferDesc, GpuImageUsage, ImageAspect, ResourceState, ResourceType,
};
use crate::gpu::device::{DescriptorHeapKind, Device};
use crate::gpu::error::{ContractViolation, GraphicsError};

/// A depth (and optionally stencil) target.
///
/// Always a single-slice, single-mip, single-sample 2D texture.
#[derive(Debug)]
pub struct DepthBuffer {
    pixel: PixelBuffer,
    clear_depth: f32,
    clear_stencil: u8,
    dsv: ImageView,
    dsv_read_only: ImageView,
    depth_srv: ImageView,
    stencil_srv: Option<ImageView>,
}

impl DepthBuffer {
    /// Creates the buffer and its views.
    pub(crate) fn create(device: &Device, desc: &DepthBufferDesc) -> Result<Self, GraphicsError> {
        let mut pixel_desc = desc.pixel.clone();
        if !pixel_desc.format.is_depth() {
            return Err(ContractViolation::InvalidCreationParams(format!(
                "depth buffer '{}' has non-depth format {}",
                pixel_desc.name, pixel_desc.format
            ))
            .into());
        }
        pixel_desc.resource_type = ResourceType::TEXTURE_2D;
        pixel_desc.array_size_or_depth = 1;
        pixel_desc.num_mips = 1;
        pixel_desc.num_samples = 1;

        let pixel = PixelBuffer::create(
            device,
            &pixel_desc,
            GpuImageUsage::DEPTH_STENCIL | GpuImageUsage::SHADER_RESOURCE,
            ResourceState::COMMON,
            Some(ClearValue::DepthStencil {
                depth: desc.clear_depth,
                stencil: desc.clear_stencil,
            }),
        )?;

        let has_stencil = pixel.format().has_stencil();
        let target_aspect = if has_stencil {
            ImageAspect::DEPTH | ImageAspect::STENCIL
        } else {
            ImageAspect::DEPTH
        };

        let dsv_desc = pixel.view_desc("DSV", GpuImageUsage::DEPTH_STENCIL, target_aspect);
        let dsv = pixel.create_view(device, DescriptorHeapKind::DepthStencil, dsv_desc)?;

        let mut read_only_desc = pixel.view_desc("DSV ReadOnly", GpuImageUsage::DEPTH_STENCIL, target_aspect);
        read_only_desc.read_only = true;
        let dsv_read_only = pixel.create_view(device, DescriptorHeapKind::DepthStencil, read_only_desc)?;

        let depth_desc = pixel.view_desc("Depth SRV", GpuImageUsage::SHADER_RESOURCE, ImageAspect::DEPTH);
        let depth_srv = pixel.create_view(device, DescriptorHeapKind::Resource, depth_desc)?;

        let stencil_srv = if has_stencil {
            let stencil_desc =
                pixel.view_desc("Stencil SRV", GpuImageUsage::SHADER_RESOURCE, ImageAspect::STENCIL);
            Some(pixel.create_view(device, DescriptorHeapKind::Resource, stencil_desc)?)
        } else {
            None
        };

        Ok(Self {
            pixel,
            clear_depth: desc.clear_depth,
            clear_stencil: desc.clear_stencil,
            dsv,
            dsv_read_only,
            depth_srv,
            stencil_srv,
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

    /// Read/write depth-stencil view.
    pub fn dsv(&self) -> &ImageView {
        &self.dsv
    }

    /// Read-only depth-stencil view.
    pub fn dsv_read_only(&self) -> &ImageView {
        &self.dsv_read_only
    }

    /// Shader-resource view of the depth plane.
    pub fn depth_srv(&self) -> &ImageView {
        &self.depth_srv
    }

    /// Shader-resource view of the stencil plane.
    pub fn stencil_srv(&self) -> Result<&ImageView, ContractViolation> {
        self.stencil_srv
            .as_ref()
            .ok_or_else(|| ContractViolation::UnsupportedInterface {
                resource: self.resource().name().to_owned(),
                interface: "StencilShaderResourceView",
            })
    }

    /// Returns `true` if the format carries a stencil plane.
    pub fn has_stencil(&self) -> bool {
        self.stencil_srv.is_some()
    }

    /// Fast-clear depth.
    pub fn clear_depth(&self) -> f32 {
        self.clear_depth
    }

    /// Fast-clear stencil.
    pub fn clear_stencil(&self) -> u8 {
        self.clear_stencil
    }
}

impl AsRef<GpuResource> for DepthBuffer {
    fn as_ref(&self) -> &GpuResource {
        self.resource()
    }
}
