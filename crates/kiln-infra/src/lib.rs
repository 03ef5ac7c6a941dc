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

//! # Kiln Infra
//!
//! Concrete native backends for the `kiln-core` device layer.
//!
//! Everything here implements the contracts of [`kiln_core::gpu::traits`].
//! Applications normally only call [`create_backend`] and hand the result to a
//! [`DeviceManager`](kiln_core::DeviceManager).

#![warn(missing_docs)]

pub mod graphics;

pub use graphics::create_backend;
pub use graphics::headless::{CompletionMode, HeadlessAdapter, HeadlessBackend};
