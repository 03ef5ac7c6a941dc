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

//! # Kiln Core
//!
//! Foundational crate containing the backend-agnostic GPU device layer: adapter
//! selection, queues with fence synchronization, command-allocator pooling,
//! command contexts with barrier batching, and resource state tracking.
//!
//! Native graphics APIs plug in underneath through the traits in
//! [`gpu::traits`]; concrete backends live in the `kiln-infra` crate.

#![warn(missing_docs)]

pub mod gpu;
pub mod platform;

pub use gpu::{Device, DeviceManager, GraphicsError};
