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

use super::device::NativeDevice;
use crate::gpu::api::{AdapterInfo, ApiVersion, GraphicsApi, QueueFamilyIndices, QueueFamilyProperties};
use crate::gpu::error::NativeError;
use std::fmt::Debug;
use std::sync::Arc;

/// Parameters for creating a native instance.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct InstanceDesc {
    /// Application name reported to the driver.
    pub app_name: String,
    /// Enables the native validation / debug layer.
    pub enable_validation: bool,
    /// Enables debug-marker support.
    pub enable_debug_markers: bool,
}

/// Parameters for creating a native logical device.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DeviceDesc {
    /// Debug name of the device.
    pub name: String,
    /// The families queues are created from. `None` on APIs with a fixed
    /// queue set.
    pub queue_families: Option<QueueFamilyIndices>,
    /// Enables the native validation / debug layer.
    pub enable_validation: bool,
    /// Enables debug-marker support.
    pub enable_debug_markers: bool,
}

/// The entry point of a native backend: the process-level choice between
/// native APIs.
pub trait NativeBackend: Send + Sync + Debug + 'static {
    /// The API this backend drives.
    fn api(&self) -> GraphicsApi;

    /// Creates the native instance (factory / loader).
    ///
    /// # Arguments
    ///
    /// * `desc`: Application name and debug-layer options.
    ///
    /// # Returns
    ///
    /// A shared handle to the instance, or the native error that prevented it.
    fn create_instance(&self, desc: &InstanceDesc) -> Result<Arc<dyn NativeInstance>, NativeError>;
}

/// A created native instance, able to enumerate adapters and create devices.
pub trait NativeInstance: Send + Sync + Debug + 'static {
    /// The API this instance belongs to.
    fn api(&self) -> GraphicsApi;

    /// Lists the physical adapters in native enumeration order.
    ///
    /// Every call re-queries the native stack.
    fn adapters(&self) -> Result<Vec<AdapterInfo>, NativeError>;

    /// Creates and immediately destroys a logical device on `adapter` at the
    /// minimum required feature level, to read what the adapter supports.
    ///
    /// # Returns
    ///
    /// The highest feature level / API version the adapter supports.
    fn probe_adapter(&self, adapter: &AdapterInfo) -> Result<ApiVersion, NativeError>;

    /// Returns the queue families of `adapter`, or `None` if the API exposes
    /// a fixed queue set instead of families.
    fn queue_families(&self, adapter: &AdapterInfo) -> Option<Vec<QueueFamilyProperties>>;

    /// Creates the logical device on `adapter`.
    fn create_device(
        &self,
        adapter: &AdapterInfo,
        desc: &DeviceDesc,
    ) -> Result<Arc<dyn NativeDevice>, NativeError>;
}
