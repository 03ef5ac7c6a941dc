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

//! Plain data types shared by the device layer and every native backend.

pub mod adapter;
pub mod barrier;
pub mod caps;
pub mod config;
pub mod enums;
pub mod fence;
pub mod format;
pub mod params;
pub mod state;

pub use self::adapter::*;
pub use self::barrier::*;
pub use self::caps::*;
pub use self::config::*;
pub use self::enums::*;
pub use self::fence::*;
pub use self::format::*;
pub use self::params::*;
pub use self::state::*;
