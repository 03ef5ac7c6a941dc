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

//! Capability data read from a device and its queue families.

use super::adapter::ApiVersion;
use bitflags::bitflags;

/// Capabilities of a logical device, read once at creation.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DeviceCaps {
    /// Highest feature level / API version the device runs at.
    pub api_version: ApiVersion,
    /// Largest width or height of a 2D texture.
    pub max_texture_dimension_2d: u32,
    /// Largest number of array layers in a texture.
    pub max_texture_array_layers: u32,
    /// Largest multisample count supported for render targets.
    pub max_sample_count: u32,
    /// Whether timestamp queries are available.
    pub supports_timestamp_queries: bool,
    /// Whether the presentation engine can tear (present without vsync).
    pub supports_tearing: bool,
    /// Number of physical nodes behind the device.
    pub num_device_nodes: u32,
}

impl DeviceCaps {
    /// Logs the capability table at info level on `target`.
    pub fn log_caps(&self, target: &str) {
        log::info!(target: target, "  Device Caps");
        log::info!(target: target, "    {:40} {}", "API version:", self.api_version);
        log::info!(target: target, "    {:40} {}", "Max 2D texture dimension:", self.max_texture_dimension_2d);
        log::info!(target: target, "    {:40} {}", "Max texture array layers:", self.max_texture_array_layers);
        log::info!(target: target, "    {:40} {}", "Max sample count:", self.max_sample_count);
        log::info!(target: target, "    {:40} {}", "Timestamp queries:", self.supports_timestamp_queries);
        log::info!(target: target, "    {:40} {}", "Tearing:", self.supports_tearing);
        log::info!(target: target, "    {:40} {}", "Device nodes:", self.num_device_nodes);
    }
}

bitflags! {
    /// Work a native queue family accepts.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct QueueFamilyFlags: u32 {
        /// Graphics work.
        const GRAPHICS = 1 << 0;
        /// Compute work.
        const COMPUTE = 1 << 1;
        /// Transfer work.
        const TRANSFER = 1 << 2;
    }
}

/// One queue family as reported by the native API.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueueFamilyProperties {
    /// Work the family accepts.
    pub flags: QueueFamilyFlags,
    /// Number of queues in the family.
    pub queue_count: u32,
    /// Whether the family can present to the window's surface.
    pub supports_present: bool,
}

/// The queue families chosen for each queue type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct QueueFamilyIndices {
    /// Family for the graphics queue.
    pub graphics: u32,
    /// Family for the compute queue.
    pub compute: u32,
    /// Family for the copy queue.
    pub transfer: u32,
    /// Family that presents, if any supports it.
    pub present: Option<u32>,
}

impl QueueFamilyIndices {
    /// The distinct families a device must create queues from.
    pub fn unique_families(&self) -> Vec<u32> {
        let mut families = vec![self.graphics, self.compute, self.transfer];
        families.extend(self.present);
        families.sort_unstable();
        families.dedup();
        families
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unique_families_deduplicates() {
        let indices = QueueFamilyIndices {
            graphics: 0,
            compute: 2,
            transfer: 1,
            present: Some(0),
        };
        assert_eq!(indices.unique_families(), vec![0, 1, 2]);
    }
}
