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

mod common;

use common::{device, manager, native, start};
use kiln_core::gpu::api::{
    AdapterClass, BarrierKind, ColorBufferDesc, FenceValue, Format, QueueType, ResourceState,
};
use kiln_core::gpu::{DeviceManagerState, GraphicsError};
use kiln_infra::graphics::headless::{CompletionMode, HeadlessAdapter, HeadlessBackend};
use std::time::Duration;

#[test]
fn prefer_discrete_picks_the_discrete_adapter() {
    let backend = HeadlessBackend::builder()
        .adapter(HeadlessAdapter::new("Integrated 1 GB", AdapterClass::Integrated).memory_mib(1024))
        .adapter(HeadlessAdapter::new("Discrete 8 GB", AdapterClass::Discrete).memory_mib(8192))
        .build();
    let manager = start(&backend);

    let adapter = manager.adapter().expect("an adapter should be selected");
    assert_eq!(adapter.name, "Discrete 8 GB");
    assert_eq!(adapter.class, AdapterClass::Discrete);
    assert_eq!(adapter.dedicated_video_memory_mib(), 8192);
}

#[test]
fn allocator_is_not_reused_before_its_fence_completes() {
    let backend = HeadlessBackend::builder()
        .completion(CompletionMode::Manual)
        .wait_timeout(Duration::from_millis(200))
        .build();
    let manager = start(&backend);
    let device = device(&manager);
    let gpu = native(&backend);
    let queue = device.queue(QueueType::Graphics);

    let allocator = queue.request_allocator().unwrap();
    let reused_id = allocator.id();
    let fence_five = FenceValue(QueueType::Graphics.fence_base() | 5);
    queue.discard_allocator(fence_five, allocator);

    let fresh = queue.request_allocator().unwrap();
    assert_ne!(fresh.id(), reused_id, "allocator tagged with fence 5 must not be handed out yet");
    queue.discard_allocator(queue.last_signaled_fence_value(), fresh);

    // Five submissions bring the graphics fence to 5.
    for _ in 0..5 {
        device.begin_graphics_context("").unwrap().finish(false).unwrap();
    }
    assert_eq!(queue.last_signaled_fence_value(), fence_five);
    gpu.complete_all();

    let recycled = queue.request_allocator().unwrap();
    assert_eq!(recycled.id(), reused_id, "allocator should be recycled once fence 5 completed");
    queue.discard_allocator(queue.last_signaled_fence_value(), recycled);
}

#[test]
fn two_transitions_before_a_flush_issue_one_barrier() {
    let backend = HeadlessBackend::new();
    let manager = start(&backend);
    let device = device(&manager);

    let buffer = device
        .create_color_buffer(&ColorBufferDesc::new("Scene Color").size(32, 32).format(Format::RGBA8_UNorm))
        .unwrap();
    let before = buffer.resource().usage_state();
    backend.journal().clear();

    let mut context = device.begin_graphics_context("").unwrap();
    context
        .transition_resource(&buffer, ResourceState::SHADER_RESOURCE, false)
        .unwrap();
    context
        .transition_resource(&buffer, ResourceState::COPY_SOURCE, false)
        .unwrap();
    assert_eq!(context.pending_barrier_count(), 1);
    context.flush_resource_barriers().unwrap();

    let batches = backend.journal().barrier_batches();
    assert_eq!(batches.len(), 1, "exactly one native barrier call expected");
    assert_eq!(batches[0].len(), 1);
    assert_eq!(
        batches[0][0].kind,
        BarrierKind::Transition {
            before,
            after: ResourceState::COPY_SOURCE,
        }
    );
    assert_eq!(buffer.resource().usage_state(), ResourceState::COPY_SOURCE);
    context.finish(true).unwrap();
}

#[test]
fn finish_with_wait_returns_a_completed_fence() {
    let backend = HeadlessBackend::builder()
        .completion(CompletionMode::Automatic {
            delay: Duration::from_millis(20),
        })
        .build();
    let manager = start(&backend);
    let device = device(&manager);

    for _ in 0..3 {
        let mut context = device.begin_graphics_context("Wait Test").unwrap();
        context.set_marker("work").unwrap();
        let fence = context.finish(true).unwrap();
        assert!(device.is_fence_complete(fence), "fence {fence} should be complete on return");
    }
}

#[test]
fn blocking_finish_outlasts_the_manual_wait_bound() {
    let backend = HeadlessBackend::builder()
        .completion(CompletionMode::Automatic {
            delay: Duration::from_millis(150),
        })
        .wait_timeout(Duration::from_millis(30))
        .build();
    let mut manager = start(&backend);
    let device = device(&manager);

    let fence = device
        .begin_graphics_context("")
        .unwrap()
        .finish(true)
        .expect("a slow GPU still completes its work");
    assert!(device.is_fence_complete(fence));

    device.begin_graphics_context("").unwrap().finish(false).unwrap();
    device.wait_for_gpu_idle().expect("idle waits are not bounded either");
    drop(device);
    manager.shutdown();
}

#[test]
fn no_qualifying_adapter_fails_startup() {
    common::init_logging();
    for backend in [
        HeadlessBackend::builder().no_adapters().build(),
        HeadlessBackend::builder()
            .adapter(HeadlessAdapter::new("WARP", AdapterClass::Software))
            .build(),
        HeadlessBackend::builder()
            .adapter(HeadlessAdapter::new("Broken", AdapterClass::Discrete).probe_failure("device lost"))
            .build(),
    ] {
        let mut manager = manager(&backend);
        let err = manager.create_device_and_swap_chain().unwrap_err();
        assert!(matches!(err, GraphicsError::NoSuitableAdapter), "unexpected error: {err}");
        assert!(err.is_fatal());
        assert!(manager.device().is_none());
        assert!(backend.device().is_none());
        assert_eq!(manager.state(), DeviceManagerState::InstanceCreated);
    }
}
