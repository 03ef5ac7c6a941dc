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

//! Configuration consumed by the [`DeviceManager`](crate::gpu::DeviceManager).

use super::enums::GraphicsApi;
use super::format::Format;
use crate::gpu::error::GraphicsError;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Options recognized by the device manager.
///
/// Every field has a default, so a configuration file only needs to name the
/// options it changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeviceManagerConfig {
    /// Application name, forwarded to the native instance.
    pub app_name: String,
    /// The native API to run on.
    pub graphics_api: GraphicsApi,
    /// Enables the native validation / debug layer.
    pub enable_validation: bool,
    /// Enables debug events and markers in command lists.
    pub enable_debug_markers: bool,
    /// Logs the device capability table at creation.
    pub log_device_caps: bool,
    /// Allows software adapters to be selected.
    pub allow_software_device: bool,
    /// Picks the discrete adapter with the most dedicated memory.
    pub prefer_discrete_device: bool,
    /// Starts the window maximized.
    pub start_maximized: bool,
    /// Starts in full-screen mode.
    pub start_fullscreen: bool,
    /// Allows the swap chain to switch display modes.
    pub allow_mode_switch: bool,
    /// Window position; `-1` centers the window.
    pub window_pos_x: i32,
    /// Window position; `-1` centers the window.
    pub window_pos_y: i32,
    /// Back-buffer width in pixels.
    pub back_buffer_width: u32,
    /// Back-buffer height in pixels.
    pub back_buffer_height: u32,
    /// Refresh rate in Hz; `0` uses the display default.
    pub refresh_rate: u32,
    /// Waits for vertical blank when presenting.
    pub enable_vsync: bool,
    /// Number of swap-chain back buffers.
    pub num_swap_chain_buffers: u32,
    /// Requested swap-chain format.
    pub swap_chain_format: Format,
    /// Swap-chain multisample count.
    pub swap_chain_sample_count: u32,
    /// Swap-chain multisample quality.
    pub swap_chain_sample_quality: u32,
    /// Number of frames the CPU may record ahead of the GPU.
    pub max_frames_in_flight: u32,
    /// Enables per-monitor DPI awareness.
    pub enable_per_monitor_dpi: bool,
}

impl Default for DeviceManagerConfig {
    fn default() -> Self {
        Self {
            app_name: "kiln".to_string(),
            graphics_api: GraphicsApi::D3D12,
            enable_validation: false,
            enable_debug_markers: false,
            log_device_caps: true,
            allow_software_device: false,
            prefer_discrete_device: true,
            start_maximized: false,
            start_fullscreen: false,
            allow_mode_switch: true,
            window_pos_x: -1,
            window_pos_y: -1,
            back_buffer_width: 1920,
            back_buffer_height: 1080,
            refresh_rate: 0,
            enable_vsync: false,
            num_swap_chain_buffers: 3,
            swap_chain_format: Format::SRGBA8_UNorm,
            swap_chain_sample_count: 1,
            swap_chain_sample_quality: 0,
            max_frames_in_flight: 2,
            enable_per_monitor_dpi: false,
        }
    }
}

impl DeviceManagerConfig {
    /// Parses a configuration from JSON. Unknown keys are ignored and missing
    /// keys take their defaults.
    pub fn from_json_str(json: &str) -> Result<Self, GraphicsError> {
        serde_json::from_str(json)
            .map_err(|e| GraphicsError::Configuration(format!("invalid configuration: {e}")))
    }

    /// Loads a configuration from a JSON file.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, GraphicsError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| {
            GraphicsError::Configuration(format!("cannot read '{}': {e}", path.display()))
        })?;
        Self::from_json_str(&text)
    }

    /// Applies the backend flag found on the command line, if any.
    pub fn apply_args<I, S>(&mut self, args: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        if let Some(api) = args
            .into_iter()
            .find_map(|arg| GraphicsApi::from_flag(arg.as_ref()))
        {
            self.graphics_api = api;
        }
    }

    /// Number of frame-sync slots the swap chain keeps.
    pub fn num_frame_sync_slots(&self) -> u32 {
        self.max_frames_in_flight.max(1) + 1
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_values() {
        let config = DeviceManagerConfig::default();
        assert_eq!(config.graphics_api, GraphicsApi::D3D12);
        assert!(config.log_device_caps);
        assert!(config.prefer_discrete_device);
        assert!(!config.allow_software_device);
        assert!(config.allow_mode_switch);
        assert_eq!((config.back_buffer_width, config.back_buffer_height), (1920, 1080));
        assert_eq!(config.num_swap_chain_buffers, 3);
        assert_eq!(config.swap_chain_format, Format::SRGBA8_UNorm);
        assert_eq!(config.max_frames_in_flight, 2);
        assert_eq!(config.window_pos_x, -1);
    }

    #[test]
    fn partial_json_keeps_defaults() {
        let config = DeviceManagerConfig::from_json_str(
            r#"{ "app_name": "demo", "graphics_api": "Vulkan", "enable_vsync": true, "unknown": 1 }"#,
        )
        .expect("partial configuration should parse");
        assert_eq!(config.app_name, "demo");
        assert_eq!(config.graphics_api, GraphicsApi::Vulkan);
        assert!(config.enable_vsync);
        assert_eq!(config.num_swap_chain_buffers, 3);
    }

    #[test]
    fn invalid_json_is_a_configuration_error() {
        let err = DeviceManagerConfig::from_json_str("{ not json").unwrap_err();
        assert!(matches!(err, GraphicsError::Configuration(_)));
    }

    #[test]
    fn command_line_overrides_file() {
        let mut config = DeviceManagerConfig {
            graphics_api: GraphicsApi::Vulkan,
            ..Default::default()
        };
        config.apply_args(["app", "-dx12"]);
        assert_eq!(config.graphics_api, GraphicsApi::D3D12);
        config.apply_args(["app"]);
        assert_eq!(config.graphics_api, GraphicsApi::D3D12);
    }

    #[test]
    fn frame_sync_slots_exceed_frames_in_flight() {
        let config = DeviceManagerConfig::default();
        assert_eq!(config.num_frame_sync_slots(), 3);
    }
}
