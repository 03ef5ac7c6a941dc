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

//! Provides the backend-agnostic GPU device layer.
//!
//! This module defines the common language shared by every native backend:
//! plain data types (`api`), the native contracts a backend implements
//! (`traits`), and the logic that sits on top of those contracts and is
//! identical for every backend (adapter selection, queues and fences, command
//! contexts, resource state tracking, and the startup orchestration in
//! [`DeviceManager`]).
//!
//! A concrete backend only answers narrow questions ("submit this list and
//! signal that value", "create an image with this description"). Everything
//! that must behave the same on D3D12 and Vulkan lives here.

pub mod adapter;
pub mod api;
pub mod context;
pub mod device;
pub mod error;
pub mod manager;
#[cfg(test)]
pub(crate) mod mock;
pub mod resource;
pub mod traits;

// Re-export the most important types for easier use.
pub use self::api::*;
pub use self::context::{CommandContext, ComputeContext, GraphicsContext};
pub use self::device::{Device, Queue};
pub use self::error::{ContractViolation, GraphicsError, NativeError};
pub use self::manager::{DeviceManager, DeviceManagerState, SwapChain};
pub use self::resource::{ColorBuffer, DepthBuffer, GpuResource, PixelBuffer};
pub use self::traits::NativeBackend;

/// Log target for messages about the device layer as a whole.
pub const LOG_GRAPHICS: &str = "kiln::graphics";
/// Log target for messages specific to the D3D12 flavour.
pub const LOG_DX12: &str = "kiln::dx12";
/// Log target for messages specific to the Vulkan flavour.
pub const LOG_VULKAN: &str = "kiln::vulkan";

/// Returns the log target associated with a graphics API.
pub fn log_target(api: GraphicsApi) -> &'static str {
    match api {
        GraphicsApi::D3D12 => LOG_DX12,
        GraphicsApi::Vulkan => LOG_VULKAN,
        GraphicsApi::Headless => LOG_GRAPHICS,
    }
}
