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

use super::image::{WgpuImage, WgpuImageView};
use kiln_core::gpu::api::{CommandListType, ResourceBarrier};
use kiln_core::gpu::error::NativeError;
use kiln_core::gpu::traits::{NativeCommandAllocator, NativeCommandList, NativeImage, NativeImageView};
use kiln_core::gpu::LOG_GRAPHICS;
use std::any::Any;

/// A command allocator for the wgpu backend.
///
/// wgpu owns command memory itself; the allocator only carries the list type
/// and how many lists were recorded since the last reset.
#[derive(Debug)]
pub struct WgpuCommandAllocator {
    list_type: CommandListType,
    lists_recorded: u32,
}

impl WgpuCommandAllocator {
    pub(crate) fn new(list_type: CommandListType) -> Self {
        Self {
            list_type,
            lists_recorded: 0,
        }
    }

    /// Lists recorded from this allocator since its last reset.
    pub fn lists_recorded(&self) -> u32 {
        self.lists_recorded
    }
}

impl NativeCommandAllocator for WgpuCommandAllocator {
    fn list_type(&self) -> CommandListType {
        self.list_type
    }

    fn reset(&mut self) -> Result<(), NativeError> {
        self.lists_recorded = 0;
        Ok(())
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// A command list recording into a `wgpu::CommandEncoder`.
///
/// `reset` opens a fresh encoder, `close` finishes it into a command buffer
/// that the queue takes on submission.
#[derive(Debug)]
pub struct WgpuCommandList {
    list_type: CommandListType,
    device: wgpu::Device,
    encoder: Option<wgpu::CommandEncoder>,
    finished: Option<wgpu::CommandBuffer>,
    barriers_recorded: u64,
}

impl WgpuCommandList {
    pub(crate) fn new(list_type: CommandListType, device: wgpu::Device) -> Self {
        Self {
            list_type,
            device,
            encoder: None,
            finished: None,
            barriers_recorded: 0,
        }
    }

    /// Takes the buffer produced by the last `close`.
    pub(crate) fn take_finished(&mut self) -> Option<wgpu::CommandBuffer> {
        self.finished.take()
    }

    /// Barriers received since creation. wgpu tracks resource states itself,
    /// so they are only counted.
    pub fn barriers_recorded(&self) -> u64 {
        self.barriers_recorded
    }

    fn encoder(&mut self, operation: &str) -> Option<&mut wgpu::CommandEncoder> {
        if self.encoder.is_none() {
            log::error!(target: LOG_GRAPHICS, "{operation} recorded into a closed {} list", self.list_type);
        }
        self.encoder.as_mut()
    }
}

fn wgpu_view<'a>(view: &'a dyn NativeImageView, operation: &str) -> Option<&'a WgpuImageView> {
    let native = view.as_any().downcast_ref::<WgpuImageView>();
    if native.is_none() {
        log::error!(target: LOG_GRAPHICS, "{operation}: view \"{}\" belongs to another backend", view.desc().name);
    }
    native
}

fn wgpu_image<'a>(image: &'a dyn NativeImage, operation: &str) -> Option<&'a WgpuImage> {
    let native = image.as_any().downcast_ref::<WgpuImage>();
    if native.is_none() {
        log::error!(target: LOG_GRAPHICS, "{operation}: image \"{}\" belongs to another backend", image.name());
    }
    native
}

impl NativeCommandList for WgpuCommandList {
    fn list_type(&self) -> CommandListType {
        self.list_type
    }

    fn reset(&mut self, allocator: &mut dyn NativeCommandAllocator) -> Result<(), NativeError> {
        if self.encoder.is_some() {
            return Err(NativeError::new("reset", "command list is still recording"));
        }
        if allocator.list_type() != self.list_type {
            return Err(NativeError::new(
                "reset",
                format!("{} allocator used for a {} list", allocator.list_type(), self.list_type),
            ));
        }
        let allocator = allocator
            .as_any_mut()
            .downcast_mut::<WgpuCommandAllocator>()
            .ok_or_else(|| NativeError::new("reset", "allocator belongs to another backend"))?;
        allocator.lists_recorded += 1;

        self.finished = None;
        self.encoder = Some(self.device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some(&self.list_type.to_string()),
        }));
        Ok(())
    }

    fn close(&mut self) -> Result<(), NativeError> {
        let encoder = self
            .encoder
            .take()
            .ok_or_else(|| NativeError::new("finish", "command list is not recording"))?;
        self.finished = Some(encoder.finish());
        Ok(())
    }

    fn resource_barriers(&mut self, barriers: &[ResourceBarrier]) {
        self.barriers_recorded += barriers.len() as u64;
    }

    fn copy_image(&mut self, dst: &dyn NativeImage, src: &dyn NativeImage) {
        let (Some(dst), Some(src)) = (wgpu_image(dst, "copy_image"), wgpu_image(src, "copy_image")) else {
            return;
        };
        let size = src.texture().size();
        if let Some(encoder) = self.encoder("copy_image") {
            encoder.copy_texture_to_texture(src.texture().as_image_copy(), dst.texture().as_image_copy(), size);
        }
    }

    fn clear_color(&mut self, view: &dyn NativeImageView, color: [f32; 4]) {
        let Some(view) = wgpu_view(view, "clear_color") else {
            return;
        };
        let Some(encoder) = self.encoder("clear_color") else {
            return;
        };
        let [r, g, b, a] = color.map(f64::from);
        let _pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("Clear Color"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: view.view(),
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(wgpu::Color { r, g, b, a }),
                    store: wgpu::StoreOp::Store,
                },
                depth_slice: None,
            })],
            depth_stencil_attachment: None,
            timestamp_writes: None,
            occlusion_query_set: None,
            multiview_mask: None,
        });
    }

    fn clear_depth_stencil(&mut self, view: &dyn NativeImageView, depth: Option<f32>, stencil: Option<u8>) {
        let Some(view) = wgpu_view(view, "clear_depth_stencil") else {
            return;
        };
        let format = view.desc().format;
        let depth_ops = format.is_depth().then(|| wgpu::Operations {
            load: depth.map_or(wgpu::LoadOp::Load, wgpu::LoadOp::Clear),
            store: wgpu::StoreOp::Store,
        });
        let stencil_ops = format.has_stencil().then(|| wgpu::Operations {
            load: stencil.map_or(wgpu::LoadOp::Load, |s| wgpu::LoadOp::Clear(u32::from(s))),
            store: wgpu::StoreOp::Store,
        });
        let Some(encoder) = self.encoder("clear_depth_stencil") else {
            return;
        };
        let _pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("Clear Depth Stencil"),
            color_attachments: &[],
            depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                view: view.view(),
                depth_ops,
                stencil_ops,
            }),
            timestamp_writes: None,
            occlusion_query_set: None,
            multiview_mask: None,
        });
    }

    fn clear_unordered_access(&mut self, image: &dyn NativeImage) {
        let Some(image) = wgpu_image(image, "clear_unordered_access") else {
            return;
        };
        if let Some(encoder) = self.encoder("clear_unordered_access") {
            encoder.clear_texture(image.texture(), &wgpu::ImageSubresourceRange::default());
        }
    }

    fn begin_event(&mut self, label: &str) {
        if let Some(encoder) = self.encoder("begin_event") {
            encoder.push_debug_group(label);
        }
    }

    fn end_event(&mut self) {
        if let Some(encoder) = self.encoder("end_event") {
            encoder.pop_debug_group();
        }
    }

    fn set_marker(&mut self, label: &str) {
        if let Some(encoder) = self.encoder("set_marker") {
            encoder.insert_debug_marker(label);
        }
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}
