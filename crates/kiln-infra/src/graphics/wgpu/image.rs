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

use kiln_core::gpu::api::{Format, ImageViewDesc};
use kiln_core::gpu::traits::{NativeImage, NativeImageView};
use std::any::Any;

/// A texture created through wgpu.
#[derive(Debug)]
pub struct WgpuImage {
    name: String,
    format: Format,
    texture: wgpu::Texture,
}

impl WgpuImage {
    pub(crate) fn new(name: String, format: Format, texture: wgpu::Texture) -> Self {
        Self {
            name,
            format,
            texture,
        }
    }

    /// The underlying wgpu texture.
    pub fn texture(&self) -> &wgpu::Texture {
        &self.texture
    }
}

impl NativeImage for WgpuImage {
    fn name(&self) -> &str {
        &self.name
    }

    fn format(&self) -> Format {
        self.format
    }

    fn extent(&self) -> (u32, u32, u32) {
        let size = self.texture.size();
        (size.width, size.height, size.depth_or_array_layers)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// A texture view created through wgpu.
///
/// Keeps a handle on its texture so clears that wgpu only exposes on whole
/// textures can reach it.
#[derive(Debug)]
pub struct WgpuImageView {
    desc: ImageViewDesc,
    texture: wgpu::Texture,
    view: wgpu::TextureView,
}

impl WgpuImageView {
    pub(crate) fn new(desc: ImageViewDesc, texture: wgpu::Texture, view: wgpu::TextureView) -> Self {
        Self {
            desc,
            texture,
            view,
        }
    }

    /// The underlying wgpu view.
    pub fn view(&self) -> &wgpu::TextureView {
        &self.view
    }

    /// The texture the view was created on.
    pub fn texture(&self) -> &wgpu::Texture {
        &self.texture
    }
}

impl NativeImageView for WgpuImageView {
    fn desc(&self) -> &ImageViewDesc {
        &self.desc
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
