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

use crate::gpu::api::{QueueFamilyFlags, QueueFamilyIndices, QueueFamilyProperties, QueueType};
use crate::gpu::error::GraphicsError;

/// Chooses the queue family for each queue type.
///
/// Compute prefers a family without graphics and transfer a family without
/// graphics or compute, so that async work lands on dedicated hardware
/// queues when they exist. Present is the first family able to present.
pub fn resolve_queue_families(
    families: &[QueueFamilyProperties],
) -> Result<QueueFamilyIndices, GraphicsError> {
    let find = |required: QueueFamilyFlags, excluded: QueueFamilyFlags| {
        families
            .iter()
            .position(|f| f.queue_count > 0 && f.flags.contains(required) && !f.flags.intersects(excluded))
            .map(|i| i as u32)
    };

    let graphics = find(QueueFamilyFlags::GRAPHICS, QueueFamilyFlags::empty())
        .ok_or(GraphicsError::QueueFamilyUnavailable(QueueType::Graphics))?;
    let compute = find(QueueFamilyFlags::COMPUTE, QueueFamilyFlags::GRAPHICS)
        .or_else(|| find(QueueFamilyFlags::COMPUTE, QueueFamilyFlags::empty()))
        .ok_or(GraphicsError::QueueFamilyUnavailable(QueueType::Compute))?;
    let transfer = find(
        QueueFamilyFlags::TRANSFER,
        QueueFamilyFlags::GRAPHICS | QueueFamilyFlags::COMPUTE,
    )
    .or_else(|| find(QueueFamilyFlags::TRANSFER, QueueFamilyFlags::empty()))
    .ok_or(GraphicsError::QueueFamilyUnavailable(QueueType::Copy))?;
    let present = families
        .iter()
        .position(|f| f.queue_count > 0 && f.supports_present)
        .map(|i| i as u32);

    Ok(QueueFamilyIndices {
        graphics,
        compute,
        transfer,
        present,
    })
}
