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

use super::command::NativeCommandList;
use crate::gpu::api::{FenceValue, QueueType};
use crate::gpu::error::NativeError;
use std::fmt::Debug;

/// A native submission channel paired with its fence.
pub trait NativeQueue: Send + Sync + Debug {
    /// The queue type this channel was created for.
    fn queue_type(&self) -> QueueType;

    /// Submits a closed command list and signals `signal` on the queue's
    /// fence once the GPU has executed it.
    ///
    /// Called with the queue's fence lock held, so values arrive in strictly
    /// increasing order.
    fn submit(&self, list: &mut dyn NativeCommandList, signal: FenceValue) -> Result<(), NativeError>;

    /// Returns the last value the GPU signalled. Never blocks.
    fn completed_value(&self) -> FenceValue;

    /// Blocks the calling thread until the fence reaches `value`.
    fn wait_for_value(&self, value: FenceValue) -> Result<(), NativeError>;
}
