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

use raw_window_handle::{HasDisplayHandle, HasWindowHandle};
use std::fmt;
use std::sync::Arc;

/// Combines the windowing handle traits required by graphics backends so the
/// pair can be used as a single trait object.
pub trait WindowHandle: HasWindowHandle + HasDisplayHandle {}

impl<T: HasWindowHandle + HasDisplayHandle> WindowHandle for T {}

/// A thread-safe, reference-counted native window handle.
pub type PlatformWindow = Arc<dyn WindowHandle + Send + Sync>;

/// The platform resources the device layer accepts from the shell.
///
/// Both handles are opaque here: the core never dereferences them, it only
/// forwards them to the native backend when a presentable swap chain is built.
#[derive(Clone, Default)]
pub struct PlatformHandles {
    /// The window the swap chain presents into. `None` selects an offscreen
    /// swap chain.
    pub window: Option<PlatformWindow>,
    /// The native module/instance handle of the running process, if the
    /// platform has one.
    pub module: Option<usize>,
}

impl PlatformHandles {
    /// Handles for a run without any window.
    pub fn headless() -> Self {
        Self::default()
    }

    /// Handles wrapping the given window.
    pub fn with_window(window: PlatformWindow) -> Self {
        Self {
            window: Some(window),
            module: None,
        }
    }

    /// Returns `true` if a window was supplied.
    pub fn has_window(&self) -> bool {
        self.window.is_some()
    }
}

impl fmt::Debug for PlatformHandles {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PlatformHandles")
            .field("window", &self.window.as_ref().map(|_| "<native window>"))
            .field("module", &self.module)
            .finish()
    }
}
