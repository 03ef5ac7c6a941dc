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

//! Adapter enumeration, adapter selection and queue-family resolution.

mod enumerator;
mod queue_family;
mod selection;

pub use self::enumerator::enumerate_adapters;
pub use self::queue_family::resolve_queue_families;
pub use self::selection::{select_adapter, SelectionPolicy};
