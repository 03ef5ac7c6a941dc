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

//! Command contexts: recording, barrier batching and submission.

mod command_context;
mod compute;
mod graphics;
mod manager;

pub use self::command_context::{CommandContext, ContextState, MAX_PENDING_BARRIERS};
pub use self::compute::ComputeContext;
pub use self::graphics::GraphicsContext;
pub(crate) use self::manager::ContextManager;
pub use self::manager::ContextPoolStats;
