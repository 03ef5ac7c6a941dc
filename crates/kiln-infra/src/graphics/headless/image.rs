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

use kiln_core::gpu::api::{Format, ImageDesc, ImageViewDesc};
use kiln_core::gpu::traits::{NativeImage, NativeImageView};
use std::any::Any;

/// An image of the headless GPU. Holds no pixel memory.
#[derive(Debug, Clone, PartialEq)]
pub struct HeadlessImage {
    name: String,
    format: Format,
    extent: (u32, u32, u32),
    num_mips: u32,
    num_samples: u32,
}

impl HeadlessImage {
    pub(crate) fn new(desc: &ImageDesc) -> Self {
        Self {
            name: desc.name.clone(),
            format: desc.format,
            extent: (desc.width, desc.height, desc.array_size_or_depth),
            num_mips: desc.num_mips,
            num_samples: desc.num_samples,
        }
    }

    pub(crate) fn back_buffer(index: u32, format: Format, width: u32, height: u32) -> Self {
        Self {
            name: format!("Headless Back Buffer {index}"),
            format,
            extent: (width, height, 1),
            num_mips: 1,
            num_samples: 1,
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
}

impl NativeImage for HeadlessImage {
    fn name(&self) -> &str {
        &self.name
    }

    fn format(&self) -> Format {
        self.format
    }

    fn extent(&self) -> (u32, u32, u32) {
        self.extent
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// A view onto a [`HeadlessImage`].
#[derive(Debug, Clone, PartialEq)]
pub struct HeadlessImageView {
    image: String,
    desc: ImageViewDesc,
}

impl HeadlessImageView {
    pub(crate) fn new(image: &dyn NativeImage, desc: &ImageViewDesc) -> Self {
        Self {
            image: image.name().to_owned(),
            desc: desc.clone(),
        }
    }

    /// Name of the image the view looks at.
    pub fn image(&self) -> &str {
        &self.image
    }
}

impl NativeImageView for HeadlessImageView {
    fn desc(&self) -> &ImageViewDesc {
        &self.desc
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
