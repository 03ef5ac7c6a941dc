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

//! Describes physical adapters as reported by a native backend.

use super::enums::GraphicsApi;
use std::fmt;

/// The class of a physical adapter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum AdapterClass {
    /// A dedicated GPU with its own memory.
    Discrete,
    /// A GPU integrated with the CPU, sharing system memory.
    Integrated,
    /// A software rasterizer.
    Software,
    /// Anything else. Never selected.
    #[default]
    Other,
}

impl fmt::Display for AdapterClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Discrete => "Discrete",
            Self::Integrated => "Integrated",
            Self::Software => "Software",
            Self::Other => "Other",
        };
        f.write_str(name)
    }
}

/// The hardware vendor of an adapter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum HardwareVendor {
    /// A vendor id the device layer does not know.
    #[default]
    Unknown,
    /// AMD.
    Amd,
    /// Intel.
    Intel,
    /// NVIDIA.
    Nvidia,
    /// Microsoft (software adapters such as WARP).
    Microsoft,
}

impl HardwareVendor {
    /// Maps a PCI vendor id to a vendor.
    pub const fn from_vendor_id(vendor_id: u32) -> Self {
        match vendor_id {
            0x10de => Self::Nvidia,
            0x1002 | 0x1022 => Self::Amd,
            0x163c | 0x8086 | 0x8087 => Self::Intel,
            0x1414 => Self::Microsoft,
            _ => Self::Unknown,
        }
    }
}

impl fmt::Display for HardwareVendor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Unknown => "Unknown",
            Self::Amd => "AMD",
            Self::Intel => "Intel",
            Self::Nvidia => "NVIDIA",
            Self::Microsoft => "Microsoft",
        };
        f.write_str(name)
    }
}

/// A feature level (D3D12) or API version (Vulkan) supported by an adapter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct ApiVersion {
    /// Major version.
    pub major: u32,
    /// Minor version.
    pub minor: u32,
    /// Patch version. Always zero for D3D12 feature levels.
    pub patch: u32,
}

impl ApiVersion {
    /// Creates a version.
    pub const fn new(major: u32, minor: u32, patch: u32) -> Self {
        Self {
            major,
            minor,
            patch,
        }
    }

    /// The lowest version an adapter must support for the given API.
    pub const fn minimum_for(api: GraphicsApi) -> Self {
        match api {
            GraphicsApi::D3D12 => Self::new(11, 0, 0),
            GraphicsApi::Vulkan => Self::new(1, 3, 0),
            GraphicsApi::Headless => Self::new(0, 0, 0),
        }
    }
}

impl fmt::Display for ApiVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

/// A read-only snapshot describing one physical adapter.
///
/// Produced by enumeration; nothing long-lived owns it.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AdapterInfo {
    /// Position of the adapter in the native enumeration order.
    pub index: usize,
    /// The adapter's name.
    pub name: String,
    /// PCI vendor id.
    pub vendor_id: u32,
    /// PCI device id.
    pub device_id: u32,
    /// Vendor decoded from `vendor_id`.
    pub vendor: HardwareVendor,
    /// Adapter class.
    pub class: AdapterClass,
    /// Video memory dedicated to the adapter, in bytes.
    pub dedicated_video_memory: u64,
    /// System memory dedicated to the adapter, in bytes.
    pub dedicated_system_memory: u64,
    /// System memory shared with the adapter, in bytes.
    pub shared_system_memory: u64,
    /// Highest feature level / API version the adapter supports.
    pub api_version: ApiVersion,
}

impl AdapterInfo {
    /// Returns the dedicated video memory in MiB.
    pub fn dedicated_video_memory_mib(&self) -> u64 {
        self.dedicated_video_memory >> 20
    }
}

impl fmt::Display for AdapterInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "\"{}\" ({}, VendorId: {:#x}, DeviceId: {:#x}, {} MiB dedicated, API {})",
            self.name,
            self.class,
            self.vendor_id,
            self.device_id,
            self.dedicated_video_memory_mib(),
            self.api_version
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vendor_ids_map_to_vendors() {
        assert_eq!(HardwareVendor::from_vendor_id(0x10de), HardwareVendor::Nvidia);
        assert_eq!(HardwareVendor::from_vendor_id(0x1002), HardwareVendor::Amd);
        assert_eq!(HardwareVendor::from_vendor_id(0x1022), HardwareVendor::Amd);
        assert_eq!(HardwareVendor::from_vendor_id(0x8086), HardwareVendor::Intel);
        assert_eq!(HardwareVendor::from_vendor_id(0x163c), HardwareVendor::Intel);
        assert_eq!(HardwareVendor::from_vendor_id(0x1414), HardwareVendor::Microsoft);
        assert_eq!(HardwareVendor::from_vendor_id(0xdead), HardwareVendor::Unknown);
    }

    #[test]
    fn api_versions_order_lexicographically() {
        assert!(ApiVersion::new(1, 3, 0) > ApiVersion::new(1, 2, 250));
        assert!(ApiVersion::new(12, 0, 0) >= ApiVersion::minimum_for(GraphicsApi::D3D12));
        assert!(ApiVersion::new(10, 1, 0) < ApiVersion::minimum_for(GraphicsApi::D3D12));
    }
}
