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

use super::backend::WgpuFlavour;
use super::conversions::{from_wgpu_texture_format, IntoWgpu};
use super::image::WgpuImage;
use anyhow::{anyhow, bail, Context, Result};
use kiln_core::gpu::api::{Format, PresentMode, SwapChainDesc};
use kiln_core::gpu::error::NativeError;
use kiln_core::gpu::log_target;
use kiln_core::gpu::traits::{NativeImage, NativeSwapChain};
use std::sync::Arc;
use wgpu::SurfaceTargetUnsafe;

/// The window surface a swap chain presents into.
#[derive(Debug)]
struct PresentTarget {
    surface: wgpu::Surface<'static>,
    config: wgpu::SurfaceConfiguration,
}

/// A swap chain over wgpu.
///
/// The back buffers are textures owned by the swap chain, so they can be
/// tracked and transitioned like any other image. Presenting copies the
/// buffer into the surface's current texture. Without a window the swap
/// chain is offscreen and presenting only advances the buffer index.
#[derive(Debug)]
pub struct WgpuSwapChain {
    target_log: &'static str,
    device: wgpu::Device,
    queue: wgpu::Queue,
    buffers: Vec<Arc<WgpuImage>>,
    format: Format,
    extent: (u32, u32),
    present_mode: PresentMode,
    present_target: Option<PresentTarget>,
    next: u32,
    acquired: Option<u32>,
}

impl WgpuSwapChain {
    pub(crate) fn new(
        flavour: WgpuFlavour,
        instance: &wgpu::Instance,
        adapter: &wgpu::Adapter,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        desc: &SwapChainDesc,
    ) -> Result<Self> {
        let target_log = log_target(flavour.api());
        if desc.buffer_count < 2 {
            bail!("{} back buffers requested, at least 2 are needed", desc.buffer_count);
        }
        if desc.width == 0 || desc.height == 0 {
            bail!("zero back-buffer extent");
        }
        let format: wgpu::TextureFormat = desc
            .format
            .into_wgpu()
            .with_context(|| format!("{} cannot back a swap chain", desc.format))?;

        let mut present_mode = desc.present_mode;
        let present_target = match &desc.window {
            Some(window) => {
                let (target, mode) = Self::configure_surface(target_log, instance, adapter, device, window, format, desc)?;
                present_mode = mode;
                Some(target)
            }
            None => {
                log::info!(target: target_log, "No window supplied, presenting offscreen");
                None
            }
        };

        let allowed = adapter.get_texture_format_features(format).allowed_usages;
        let usage = (wgpu::TextureUsages::RENDER_ATTACHMENT
            | wgpu::TextureUsages::TEXTURE_BINDING
            | wgpu::TextureUsages::COPY_SRC
            | wgpu::TextureUsages::COPY_DST)
            & allowed;
        let buffers = (0..desc.buffer_count)
            .map(|index| {
                let name = format!("Primary SwapChain Buffer {index}");
                let texture = device.create_texture(&wgpu::TextureDescriptor {
                    label: Some(&name),
                    size: wgpu::Extent3d {
                        width: desc.width,
                        height: desc.height,
                        depth_or_array_layers: 1,
                    },
                    mip_level_count: 1,
                    sample_count: 1,
                    dimension: wgpu::TextureDimension::D2,
                    format,
                    usage,
                    view_formats: &[],
                });
                Arc::new(WgpuImage::new(name, desc.format, texture))
            })
            .collect();

        Ok(Self {
            target_log,
            device: device.clone(),
            queue: queue.clone(),
            buffers,
            format: desc.format,
            extent: (desc.width, desc.height),
            present_mode,
            present_target,
            next: 0,
            acquired: None,
        })
    }

    fn configure_surface(
        target_log: &'static str,
        instance: &wgpu::Instance,
        adapter: &wgpu::Adapter,
        device: &wgpu::Device,
        window: &kiln_core::platform::PlatformWindow,
        format: wgpu::TextureFormat,
        desc: &SwapChainDesc,
    ) -> Result<(PresentTarget, PresentMode)> {
        // SAFETY: the window outlives the swap chain; the application shell
        // keeps it alive until the device manager has shut down.
        let surface = unsafe {
            let surface_target = SurfaceTargetUnsafe::from_window(window)
                .map_err(|e| anyhow!("failed to create surface target: {e}"))?;
            instance
                .create_surface_unsafe(surface_target)
                .context("failed to create surface")?
        };

        let caps = surface.get_capabilities(adapter);
        if caps.formats.is_empty() {
            bail!("the adapter cannot present to this window");
        }
        if !caps.usages.contains(wgpu::TextureUsages::COPY_DST) {
            bail!("the surface cannot be a copy destination");
        }
        // Back buffers are copied into the surface, which only needs the
        // formats to match up to their sRGB suffix.
        let surface_format = caps
            .formats
            .iter()
            .copied()
            .find(|f| f.remove_srgb_suffix() == format.remove_srgb_suffix())
            .with_context(|| {
                format!(
                    "surface formats {:?} are not compatible with {:?}",
                    caps.formats, format
                )
            })?;

        let wanted: wgpu::PresentMode = desc.present_mode.into_wgpu();
        let present_mode = if caps.present_modes.contains(&wanted) {
            desc.present_mode
        } else {
            log::warn!(target: target_log, "Surface does not support {wanted:?}, presenting with Fifo");
            PresentMode::Fifo
        };

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::COPY_DST,
            format: surface_format,
            width: desc.width,
            height: desc.height,
            present_mode: present_mode.into_wgpu(),
            alpha_mode: caps
                .alpha_modes
                .first()
                .copied()
                .unwrap_or(wgpu::CompositeAlphaMode::Auto),
            view_formats: vec![],
            desired_maximum_frame_latency: desc.max_frame_latency.max(1),
        };
        surface.configure(device, &config);
        log::info!(
            target: target_log,
            "Configured surface: {} x {} {} ({:?})",
            config.width,
            config.height,
            from_wgpu_texture_format(surface_format).map_or_else(|| format!("{surface_format:?}"), |f| f.to_string()),
            config.present_mode
        );

        Ok((PresentTarget { surface, config }, present_mode))
    }

    fn present_to_surface(&self, index: u32) -> Result<()> {
        let Some(target) = &self.present_target else {
            return Ok(());
        };
        let buffer = &self.buffers[index as usize];

        let mut attempts = 0;
        let frame = loop {
            attempts += 1;
            match target.surface.get_current_texture() {
                Ok(frame) => break frame,
                Err(e @ wgpu::SurfaceError::Lost) | Err(e @ wgpu::SurfaceError::Outdated) if attempts < 2 => {
                    log::warn!(target: self.target_log, "Surface lost or outdated ({e:?}), reconfiguring");
                    target.surface.configure(&self.device, &target.config);
                }
                Err(wgpu::SurfaceError::Timeout) => {
                    log::warn!(target: self.target_log, "Timed out acquiring the surface texture, frame skipped");
                    return Ok(());
                }
                Err(e) => return Err(anyhow!("failed to acquire the surface texture: {e:?}")),
            }
        };

        let mut encoder = self.device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("Present Copy"),
        });
        encoder.copy_texture_to_texture(
            buffer.texture().as_image_copy(),
            frame.texture.as_image_copy(),
            buffer.texture().size(),
        );
        self.queue.submit(std::iter::once(encoder.finish()));
        frame.present();
        Ok(())
    }
}

impl NativeSwapChain for WgpuSwapChain {
    fn buffer_count(&self) -> u32 {
        self.buffers.len() as u32
    }

    fn format(&self) -> Format {
        self.format
    }

    fn extent(&self) -> (u32, u32) {
        self.extent
    }

    fn present_mode(&self) -> PresentMode {
        self.present_mode
    }

    fn buffer(&self, index: u32) -> Result<Arc<dyn NativeImage>, NativeError> {
        self.buffers
            .get(index as usize)
            .map(|buffer| Arc::clone(buffer) as Arc<dyn NativeImage>)
            .ok_or_else(|| NativeError::new("buffer", format!("no back buffer {index}")))
    }

    fn acquire_next_image(&mut self) -> Result<u32, NativeError> {
        self.acquired = Some(self.next);
        Ok(self.next)
    }

    fn present(&mut self, index: u32) -> Result<(), NativeError> {
        if self.acquired.take() != Some(index) {
            return Err(NativeError::new(
                "present",
                format!("back buffer {index} was not acquired"),
            ));
        }
        self.present_to_surface(index)
            .map_err(|e| NativeError::new("present", format!("{e:#}")))?;
        self.next = (index + 1) % self.buffer_count();
        Ok(())
    }
}
