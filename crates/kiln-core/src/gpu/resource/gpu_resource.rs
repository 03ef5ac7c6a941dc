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

use crate::gpu::api::{ResourceState, ResourceType, SubresourceRange};
use crate::gpu::traits::NativeImage;
use std::fmt;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

const NO_TRANSITION: u32 = u32::MAX;

struct ResourceInner {
    name: String,
    resource_type: ResourceType,
    image: Arc<dyn NativeImage>,
    range: SubresourceRange,
    usage_state: AtomicU32,
    transitioning_state: AtomicU32,
}

/// A GPU resource and the execution state it is tracked in.
///
/// Cloning is cheap and yields another handle to the same resource. The usage
/// state changes only when a command context flushes a barrier on the
/// resource; a requested but unflushed transition is visible through
/// [`GpuResource::transitioning_state`] only.
#[derive(Clone)]
pub struct GpuResource {
    inner: Arc<ResourceInner>,
}

impl GpuResource {
    pub(crate) fn new(
        name: impl Into<String>,
        resource_type: ResourceType,
        image: Arc<dyn NativeImage>,
        range: SubresourceRange,
        initial_state: ResourceState,
    ) -> Self {
        Self {
            inner: Arc::new(ResourceInner {
                name: name.into(),
                resource_type,
                image,
                range,
                usage_state: AtomicU32::new(initial_state.bits()),
                transitioning_state: AtomicU32::new(NO_TRANSITION),
            }),
        }
    }

    /// The resource's debug name.
    pub fn name(&self) -> &str {
        &self.inner.name
    }

    /// The resource kind.
    pub fn resource_type(&self) -> ResourceType {
        self.inner.resource_type
    }

    /// The native image backing the resource.
    pub fn native_image(&self) -> &Arc<dyn NativeImage> {
        &self.inner.image
    }

    /// The range covering every subresource.
    pub fn whole_range(&self) -> SubresourceRange {
        self.inner.range
    }

    /// The state set by the last flushed barrier.
    pub fn usage_state(&self) -> ResourceState {
        ResourceState::from_bits_retain(self.inner.usage_state.load(Ordering::Acquire))
    }

    /// The state a pending barrier moves the resource into, if any.
    pub fn transitioning_state(&self) -> Option<ResourceState> {
        match self.inner.transitioning_state.load(Ordering::Acquire) {
            NO_TRANSITION => None,
            bits => Some(ResourceState::from_bits_retain(bits)),
        }
    }

    /// Returns `true` if both handles refer to the same resource.
    pub fn ptr_eq(&self, other: &GpuResource) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    pub(crate) fn set_transitioning_state(&self, state: Option<ResourceState>) {
        let bits = state.map_or(NO_TRANSITION, |s| s.bits());
        self.inner.transitioning_state.store(bits, Ordering::Release);
    }

    pub(crate) fn complete_transition(&self, state: ResourceState) {
        self.inner.usage_state.store(state.bits(), Ordering::Release);
        self.inner
            .transitioning_state
            .store(NO_TRANSITION, Ordering::Release);
    }
}

impl AsRef<GpuResource> for GpuResource {
    fn as_ref(&self) -> &GpuResource {
        self
    }
}

impl fmt::Debug for GpuResource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GpuResource")
            .field("name", &self.inner.name)
            .field("resource_type", &self.inner.resource_type)
            .field("usage_state", &self.usage_state())
            .field("transitioning_state", &self.transitioning_state())
            .finish()
    }
}
