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

//! Brings a device up, clears a handful of offscreen frames and shuts down.
//!
//! Run with `cargo run -p sandbox -- -vk --frames 10`.

use anyhow::{Context, Result};
use clap::Parser;
use kiln_core::gpu::api::{
    DepthBufferDesc, DeviceManagerConfig, FenceValue, Format, GraphicsApi, ResourceState,
};
use kiln_core::gpu::{ColorBuffer, DepthBuffer, Device, DeviceManager};
use kiln_core::platform::PlatformHandles;
use kiln_infra::create_backend;
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(version, about = "Clear-only frame loop over the kiln device layer")]
struct Args {
    /// JSON device-manager configuration. Missing keys take their defaults.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Number of frames to render before shutting down.
    #[arg(long, default_value_t = 3)]
    frames: u32,

    /// Back-buffer width, overriding the configuration.
    #[arg(long)]
    width: Option<u32>,

    /// Back-buffer height, overriding the configuration.
    #[arg(long)]
    height: Option<u32>,

    /// Enables the native validation layer.
    #[arg(long)]
    validation: bool,
}

fn main() -> Result<()> {
    use env_logger::{Builder, Env};

    Builder::from_env(Env::default().default_filter_or("info"))
        .filter_module("wgpu_hal", log::LevelFilter::Warn)
        .filter_module("wgpu_core", log::LevelFilter::Warn)
        .init();

    // Backend flags keep their single-dash spelling, so they are peeled off
    // before clap sees the command line.
    let mut command_line = std::env::args();
    let program = command_line.next().unwrap_or_else(|| "sandbox".to_string());
    let (backend_flags, rest): (Vec<String>, Vec<String>) =
        command_line.partition(|arg| GraphicsApi::from_flag(arg).is_some());
    let args = Args::parse_from(std::iter::once(program).chain(rest));

    let mut config = match &args.config {
        Some(path) => DeviceManagerConfig::from_json_file(path)
            .with_context(|| format!("loading {}", path.display()))?,
        None => DeviceManagerConfig::default(),
    };
    config.apply_args(&backend_flags);
    if let Some(width) = args.width {
        config.back_buffer_width = width;
    }
    if let Some(height) = args.height {
        config.back_buffer_height = height;
    }
    config.enable_validation |= args.validation;

    run(config, args.frames)
}

fn run(config: DeviceManagerConfig, frames: u32) -> Result<()> {
    let api = config.graphics_api;
    let (width, height) = (config.back_buffer_width, config.back_buffer_height);
    let mut manager = DeviceManager::new(config, PlatformHandles::headless(), create_backend(api));
    manager
        .create_device_and_swap_chain()
        .with_context(|| format!("starting the {api} device"))?;

    let device = manager
        .device()
        .cloned()
        .context("device manager is ready without a device")?;
    let depth = device.create_depth_buffer(
        &DepthBufferDesc::new("Scene Depth")
            .size(width, height)
            .format(Format::D32_Float),
    )?;

    for frame in 0..frames {
        let index = manager.begin_frame()?;
        let swap_chain = manager.swap_chain().context("swap chain missing mid-frame")?;
        let back_buffer = swap_chain.current_back_buffer();

        let t = frame as f32 / frames.max(1) as f32;
        let fence = record_frame(&device, back_buffer, &depth, t)?;

        manager.present(fence)?;
        log::info!("Frame {frame} presented from back buffer {index} ({fence})");
    }

    drop(depth);
    drop(device);
    manager.shutdown();
    Ok(())
}

/// Clears both targets and hands the back buffer back to presentation.
fn record_frame(device: &Device, back_buffer: &ColorBuffer, depth: &DepthBuffer, t: f32) -> Result<FenceValue> {
    let mut context = device.begin_graphics_context("Frame")?;
    context.begin_event("Clear")?;
    context.clear_color_with(back_buffer, [t, 0.2, 1.0 - t, 1.0])?;
    context.clear_depth(depth)?;
    context.end_event()?;
    context.transition_resource(back_buffer, ResourceState::PRESENT, false)?;
    Ok(context.finish(false)?)
}
