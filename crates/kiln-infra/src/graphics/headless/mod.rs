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

//! An in-process simulated GPU.
//!
//! The headless backend implements every native contract without touching a
//! driver. Submissions complete on a timeline thread (or when a test says so)
//! and all native traffic is recorded in a [`HeadlessJournal`], which makes
//! the backend the reference target for CI and the integration tests.

mod backend;
mod command;
mod device;
mod image;
mod journal;
mod swap_chain;
mod timeline;

pub use self::backend::{HeadlessAdapter, HeadlessBackend, HeadlessBackendBuilder};
pub use self::command::{HeadlessCommandAllocator, HeadlessCommandList};
pub use self::device::{HeadlessDevice, HeadlessQueue};
pub use self::image::{HeadlessImage, HeadlessImageView};
pub use self::journal::{HeadlessCommand, HeadlessJournal, JournalBarrier, JournalEvent};
pub use self::swap_chain::HeadlessSwapChain;
pub use self::timeline::CompletionMode;
