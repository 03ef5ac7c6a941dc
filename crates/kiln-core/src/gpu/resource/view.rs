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

use crate::gpu::api::ImageViewDesc;
use crate::gpu::device::DescriptorHandle;
use crate::gpu::traits::NativeImageView;
use std::fmt;
use std::sync::Arc;

/// A pre-built view onto a pixel buffer, together with the descriptor slot
/// that holds it.
pub struct ImageView {
    native: Arc<dyn NativeImageView>,
    descriptor: DescriptorHandle,
}

impl ImageView {
    pub(crate) fn new(native: Arc<dyn NativeImageView>, descriptor: DescriptorHandle) -> Self {
        Self { native, descriptor }
    }

    /// The native view.
    pub fn native(&self) -> &dyn NativeImageView {
        self.native.as_ref()
    }

    /// The description the view was created from.
    pub fn desc(&self) -> &ImageViewDesc {
        self.native.desc()
    }

    /// The descriptor slot of the view.
    pub fn descriptor(&self) -> &DescriptorHandle {
        &self.descriptor
    }
}

impl fmt::Debug for ImageView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ImageView")
            .field("name", &self.desc().name)
            .field("usage", &self.desc().usage)
            .field("descriptor", &self.descriptor)
            .finish()
    }
}
