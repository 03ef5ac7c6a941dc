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

//! The logical device, its queues and the pools that live on them.

pub mod allocator_pool;
pub mod descriptor;
mod gpu_device;
pub mod queue;

pub use self::allocator_pool::{AllocatorPoolStats, CommandAllocator, CommandAllocatorPool};
pub use self::descriptor::{
    DescriptorAllocator, DescriptorHandle, DescriptorHeapKind, DescriptorHeapStats, DESCRIPTORS_PER_PAGE,
};
pub use self::gpu_device::{Device, DeviceOptions};
pub use self::queue::{Queue, QueueSet};
