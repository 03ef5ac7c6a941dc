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

use super::command_context::CommandContext;
use crate::gpu::api::{FenceValue, ResourceState};
use crate::gpu::error::{ContractViolation, GraphicsError};
use crate::gpu::resource::{ColorBuffer, DepthBuffer};
use std::ops::{Deref, DerefMut};

/// A command context on the graphics queue, adding render-target clears.
#[derive(Debug)]
pub struct GraphicsContext {
    context: CommandContext,
}

impl GraphicsContext {
    pub(crate) fn new(context: CommandContext) -> Self {
        Self { context }
    }

    /// Clears `target` to its fast-clear color.
    pub fn clear_color(&mut self, target: &ColorBuffer) -> Result<(), GraphicsError> {
        self.clear_color_with(target, target.clear_color())
    }

    /// Clears `target` to `color`.
    pub fn clear_color_with(&mut self, target: &ColorBuffer, color: [f32; 4]) -> Result<(), GraphicsError> {
        self.context
            .transition_resource(target, ResourceState::RENDER_TARGET, false)?;
        self.context
            .record(|list| list.clear_color(target.rtv().native(), color))
    }

    /// Clears the depth plane of `target`.
    pub fn clear_depth(&mut self, target: &DepthBuffer) -> Result<(), GraphicsError> {
        self.clear_depth_stencil(target, Some(target.clear_depth()), None)
    }

    /// Clears the stencil plane of `target`.
    pub fn clear_stencil(&mut self, target: &DepthBuffer) -> Result<(), GraphicsError> {
        self.clear_depth_stencil(target, None, Some(target.clear_stencil()))
    }

    /// Clears both planes of `target`.
    pub fn clear_depth_and_stencil(&mut self, target: &DepthBuffer) -> Result<(), GraphicsError> {
        self.clear_depth_stencil(
            target,
            Some(target.clear_depth()),
            Some(target.clear_stencil()),
        )
    }

    fn clear_depth_stencil(
        &mut self,
        target: &DepthBuffer,
        depth: Option<f32>,
        stencil: Option<u8>,
    ) -> Result<(), GraphicsError> {
        if stencil.is_some() && !target.has_stencil() {
            return Err(ContractViolation::UnsupportedInterface {
                resource: target.resource().name().to_owned(),
                interface: "Stencil",
            }
            .into());
        }
        self.context
            .transition_resource(target, ResourceState::DEPTH_WRITE, false)?;
        self.context
            .record(|list| list.clear_depth_stencil(target.dsv().native(), depth, stencil))
    }

    /// Submits the recorded work. See [`CommandContext::finish`].
    pub fn finish(self, wait_for_completion: bool) -> Result<FenceValue, GraphicsError> {
        self.context.finish(wait_for_completion)
    }
}

impl Deref for GraphicsContext {
    type Target = CommandContext;

    fn deref(&self) -> &Self::Target {
        &self.context
    }
}

impl DerefMut for GraphicsContext {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.context
    }
}

#[cfg(test)]
mod tests {
    use crate::gpu::api::{
        AdapterInfo, ColorBufferDesc, DepthBufferDesc, Format, GraphicsApi, ResourceState,
    };
    use crate::gpu::device::{Device, DeviceOptions};
    use crate::gpu::error::{ContractViolation, GraphicsError};
    use crate::gpu::mock::MockDevice;

    #[test]
    fn clears_move_targets_into_writable_states() {
        let mock = MockDevice::new();
        let device = Device::new(
            GraphicsApi::Headless,
            AdapterInfo::default(),
            mock.clone(),
            DeviceOptions::default(),
        )
        .unwrap();
        let color = device
            .create_color_buffer(&ColorBufferDesc::new("Color").size(8, 8).format(Format::RGBA8_UNorm))
            .unwrap();
        let depth = device
            .create_depth_buffer(&DepthBufferDesc::new("Depth").size(8, 8).format(Format::D32S8))
            .unwrap();

        let mut context = device.begin_graphics_context("").unwrap();
        context.clear_color(&color).unwrap();
        context.clear_depth_and_stencil(&depth).unwrap();
        context.finish(false).unwrap();

        assert_eq!(color.resource().usage_state(), ResourceState::RENDER_TARGET);
        assert_eq!(depth.resource().usage_state(), ResourceState::DEPTH_WRITE);
        assert_eq!(
            mock.commands(),
            vec![
                "clear_color Color RTV [0.0, 0.0, 0.0, 1.0]".to_owned(),
                "clear_depth_stencil Depth DSV Some(1.0) Some(0)".to_owned(),
            ]
        );
    }

    #[test]
    fn stencil_clear_needs_a_stencil_plane() {
        let mock = MockDevice::new();
        let device = Device::new(
            GraphicsApi::Headless,
            AdapterInfo::default(),
            mock,
            DeviceOptions::default(),
        )
        .unwrap();
        let depth = device
            .create_depth_buffer(&DepthBufferDesc::new("Depth").size(8, 8).format(Format::D16_UNorm))
            .unwrap();

        let mut context = device.begin_graphics_context("").unwrap();
        let err = context.clear_stencil(&depth).unwrap_err();
        assert!(matches!(
            err,
            GraphicsError::Contract(ContractViolation::UnsupportedInterface { .. })
        ));
        context.clear_depth(&depth).unwrap();
        context.finish(false).unwrap();
    }
}
