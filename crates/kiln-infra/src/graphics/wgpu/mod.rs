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

//! Native backends driving a real GPU through wgpu.
//!
//! [`WgpuBackend`] is pinned to one [`WgpuFlavour`]: DX12 for the D3D12
//! device layer, Vulkan for the Vulkan one.

mod backend;
mod command;
mod conversions;
mod device;
mod image;
mod swap_chain;

pub use self::backend::{WgpuBackend, WgpuFlavour};
pub use self::command::{WgpuCommandAllocator, WgpuCommandList};
pub use self::conversions::{adapter_class, from_wgpu_texture_format, IntoWgpu};
pub use self::device::{WgpuDevice, WgpuQueue};
pub use self::image::{WgpuImage, WgpuImageView};
pub use self::swap_chain::WgpuSwapChain;
