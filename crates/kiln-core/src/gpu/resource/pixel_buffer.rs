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
use super::view::ImageView;
use crate::gpu::api::{
    ClearValue, Format, GpuImageUsage, ImageAspect, ImageDesc, ImageViewDesc, PixelBufferDesc,
    ResourceState, ResourceType, SubresourceRange,
};
use crate::gpu::device::{DescriptorHeapKind, Device};
use crate::gpu::error::{ContractViolation, GraphicsError};
use crate::gpu::log_target;
use crate::gpu::traits::NativeImage;
use std::sync::Arc;

/// A texture with known dimensions and format.
///
/// Color and depth buffers build on this; it owns the [`GpuResource`] and
/// knows how to create views onto it.
#[derive(Debug, Clone)]
pub struct PixelBuffer {
    resource: GpuResource,
    width: u32,
    height: u32,
    array_size_or_depth: u32,
    num_mips: u32,
    num_samples: u32,
    format: Format,
}

impl PixelBuffer {
    /// Validates `desc` against the device and creates the backing image.
    pub(crate) fn create(
        device: &Device,
        desc: &PixelBufferDesc,
        usage: GpuImageUsage,
        initial_state: ResourceState,
        clear_value: Option<ClearValue>,
    ) -> Result<Self, GraphicsError> {
        Self::validate(device, desc)?;

        let image = device
            .native()
            .create_image(&ImageDesc {
                name: desc.name.clone(),
                resource_type: desc.resource_type,
                width: desc.width,
                height: desc.height,
                array_size_or_depth: desc.array_size_or_depth,
                num_mips: desc.num_mips,
                num_samples: desc.num_samples,
                format: desc.format,
                usage,
                initial_state,
                clear_value,
            })
            .map_err(|e| {
                log::error!(target: log_target(device.api()), "Failed to create '{}': {e}", desc.name);
                GraphicsError::Native(e)
            })?;

        Ok(Self::from_image(desc, image, initial_state))
    }

    /// Wraps an image created elsewhere, such as a swap-chain back buffer.
    pub(crate) fn from_image(
        desc: &PixelBufferDesc,
        image: Arc<dyn NativeImage>,
        initial_state: ResourceState,
    ) -> Self {
        let range = SubresourceRange::whole(
            desc.num_mips,
            desc.array_size_or_depth,
            desc.format.plane_count(),
        );
        Self {
            resource: GpuResource::new(
                desc.name.clone(),
                desc.resource_type,
                image,
                range,
                initial_state,
            ),
            width: desc.width,
            height: desc.height,
            array_size_or_depth: desc.array_size_or_depth,
            num_mips: desc.num_mips,
            num_samples: desc.num_samples,
            format: desc.format,
        }
    }

    fn validate(device: &Device, desc: &PixelBufferDesc) -> Result<(), ContractViolation> {
        let caps = device.caps();
        let reject = |msg: String| Err(ContractViolation::InvalidCreationParams(msg));

        if desc.width == 0 || desc.height == 0 || desc.array_size_or_depth == 0 {
            return reject(format!("'{}' has a zero extent", desc.name));
        }
        if caps.max_texture_dimension_2d != 0
            && desc.width.max(desc.height) > caps.max_texture_dimension_2d
        {
            return reject(format!(
                "'{}' is {}x{}, larger than the device limit {}",
                desc.name, desc.width, desc.height, caps.max_texture_dimension_2d
            ));
        }
        if desc.format == Format::Unknown {
            return reject(format!("'{}' has no format", desc.name));
        }
        if desc.num_mips == 0 {
            return reject(format!("'{}' has no mip levels", desc.name));
        }
        if desc.num_samples == 0
            || (caps.max_sample_count != 0 && desc.num_samples > caps.max_sample_count)
        {
            return reject(format!(
                "'{}' requests {} samples, the device supports up to {}",
                desc.name, desc.num_samples, caps.max_sample_count
            ));
        }
        if desc.num_samples > 1 && desc.num_mips > 1 {
            return reject(format!("multisampled '{}' cannot have mips", desc.name));
        }
        Ok(())
    }

    /// Creates a view onto the buffer and gives it a descriptor from `heap`.
    pub(crate) fn create_view(
        &self,
        device: &Device,
        heap: DescriptorHeapKind,
        desc: ImageViewDesc,
    ) -> Result<ImageView, GraphicsError> {
        let native = device
            .native()
            .create_image_view(self.resource.native_image(), &desc)
            .map_err(|e| {
                log::error!(target: log_target(device.api()), "Failed to create view '{}': {e}", desc.name);
                GraphicsError::Native(e)
            })?;
        Ok(ImageView::new(native, device.descriptors().allocate(heap)))
    }

    /// A view description covering the whole buffer for `usage`.
    pub(crate) fn view_desc(&self, suffix: &str, usage: GpuImageUsage, aspect: ImageAspect) -> ImageViewDesc {
        ImageViewDesc {
            name: format!("{} {suffix}", self.resource.name()),
            resource_type: self.resource.resource_type(),
            usage,
            format: self.format,
            aspect,
            base_mip_level: 0,
            mip_count: self.num_mips,
            base_array_slice: 0,
            array_size: self.array_size(),
            read_only: false,
        }
    }

    /// The tracked resource.
    pub fn resource(&self) -> &GpuResource {
        &self.resource
    }

    /// Width in pixels.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Height in pixels.
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Depth of a volume texture, 1 for everything else.
    pub fn depth(&self) -> u32 {
        if self.resource.resource_type() == ResourceType::TEXTURE_3D {
            self.array_size_or_depth
        } else {
            1
        }
    }

    /// Number of array slices; 1 for a volume texture.
    pub fn array_size(&self) -> u32 {
        if self.resource.resource_type() == ResourceType::TEXTURE_3D {
            1
        } else {
            self.array_size_or_depth
        }
    }

    /// Number of mip levels.
    pub fn num_mips(&self) -> u32 {
        self.num_mips
    }

    /// Multisample count.
    pub fn num_samples(&self) -> u32 {
        self.num_samples
    }

    /// Pixel format.
    pub fn format(&self) -> Format {
        self.format
    }
}

impl AsRef<GpuResource> for PixelBuffer {
    fn as_ref(&self) -> &GpuResource {
        &self.resource
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gpu::mock::MockImage;

    fn buffer(resource_type: ResourceType, array_size_or_depth: u32) -> PixelBuffer {
        let desc = PixelBufferDesc {
            name: "Buffer".to_owned(),
            resource_type,
            width: 64,
            height: 64,
            array_size_or_depth,
            format: Format::RGBA8_UNorm,
            ..Default::default()
        };
        PixelBuffer::from_image(
            &desc,
            MockImage::shared("Buffer", Format::RGBA8_UNorm),
            ResourceState::COMMON,
        )
    }

    #[test]
    fn volume_reports_depth_not_array_size() {
        let volume = buffer(ResourceType::TEXTURE_3D, 8);
        assert_eq!(volume.depth(), 8);
        assert_eq!(volume.array_size(), 1);
    }

    #[test]
    fn array_reports_array_size_not_depth() {
        let array = buffer(ResourceType::TEXTURE_2D_ARRAY, 6);
        assert_eq!(array.depth(), 1);
        assert_eq!(array.array_size(), 6);
        assert_eq!(array.resource().whole_range().array_size_or_depth, 6);
    }
}
