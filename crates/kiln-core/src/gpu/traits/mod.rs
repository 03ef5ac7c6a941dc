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

//! Native contracts implemented by each graphics backend.
//!
//! The device layer talks to a native API only through these traits. A backend
//! is selected once at startup and then used through trait objects, so no call
//! site branches on the API in use.

mod backend;
mod command;
mod device;
mod queue;
mod resource;
mod swap_chain;

pub use self::backend::{DeviceDesc, InstanceDesc, NativeBackend, NativeInstance};
pub use self::command::{NativeCommandAllocator, NativeCommandList};
pub use self::device::NativeDevice;
pub use self::queue::NativeQueue;
pub use self::resource::{NativeImage, NativeImageView};
pub use self::swap_chain::NativeSwapChain;
