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

use common::{device, native, start};
use kiln_core::gpu::adapter::{select_adapter, SelectionPolicy};
use kiln_core::gpu::api::{
    AdapterClass, AdapterInfo, ColorBufferDesc, CommandListType, FenceValue, Format, QueueType,
    ResourceState,
};
use kiln_core::gpu::context::ContextState;
use kiln_infra::graphics::headless::{CompletionMode, HeadlessAdapter, HeadlessBackend};
use proptest::prelude::*;
use std::collections::HashMap;
use std::time::Duration;

const STATES: [ResourceState; 6] = [
    ResourceState::RENDER_TARGET,
    ResourceState::SHADER_RESOURCE,
    ResourceState::COPY_SOURCE,
    ResourceState::COPY_DEST,
    ResourceState::COMMON,
    ResourceState::SHADER_RESOURCE.union(ResourceState::COPY_SOURCE),
];

#[derive(Debug, Clone, Copy)]
enum Submission {
    Graphics,
    AsyncCompute,
    Copy { wait: bool },
}

fn submission_strategy() -> impl Strategy<Value = Submission> {
    prop_oneof![
        Just(Submission::Graphics),
        Just(Submission::AsyncCompute),
        any::<bool>().prop_map(|wait| Submission::Copy { wait }),
    ]
}

#[derive(Debug, Clone, Copy)]
enum AllocatorOp {
    Request,
    Discard,
    Submit,
    /// Completes `1 + n % pending` of the outstanding submissions.
    Complete(u64),
}

fn allocator_op_strategy() -> impl Strategy<Value = AllocatorOp> {
    prop_oneof![
        Just(AllocatorOp::Request),
        Just(AllocatorOp::Discard),
        Just(AllocatorOp::Submit),
        any::<u64>().prop_map(AllocatorOp::Complete),
    ]
}

fn adapter_class_strategy() -> impl Strategy<Value = AdapterClass> {
    prop_oneof![
        Just(AdapterClass::Discrete),
        Just(AdapterClass::Integrated),
        Just(AdapterClass::Software),
        Just(AdapterClass::Other),
    ]
}

fn adapters_strategy() -> impl Strategy<Value = Vec<AdapterInfo>> {
    prop::collection::vec((adapter_class_strategy(), 1u64..=4), 0..5).prop_map(|specs| {
        specs
            .into_iter()
            .enumerate()
            .map(|(i, (class, gib))| {
                let mut info = HeadlessAdapter::new(format!("GPU {i}"), class)
                    .memory_mib(gib * 1024)
                    .info()
                    .clone();
                info.index = i;
                info
            })
            .collect()
    })
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 32,
        .. ProptestConfig::default()
    })]

    #[test]
    fn fence_values_strictly_increase_per_queue(
        submissions in prop::collection::vec(submission_strategy(), 1..80),
    ) {
        let backend = HeadlessBackend::new();
        let manager = start(&backend);
        let device = device(&manager);
        let mut last: HashMap<QueueType, FenceValue> = HashMap::new();

        for submission in submissions {
            let fence = match submission {
                Submission::Graphics => device.begin_graphics_context("").unwrap().finish(false).unwrap(),
                Submission::AsyncCompute => device.begin_compute_context("", true).unwrap().finish(false).unwrap(),
                Submission::Copy { wait } => device
                    .begin_context("", CommandListType::Copy)
                    .unwrap()
                    .finish(wait)
                    .unwrap(),
            };
            let queue = fence.queue_type().expect("fence encodes its queue");
            if let Some(previous) = last.insert(queue, fence) {
                prop_assert!(fence > previous, "{} does not follow {}", fence, previous);
            }
        }
        device.wait_for_gpu_idle().unwrap();
    }

    #[test]
    fn recycled_allocators_never_outrun_the_completed_fence(
        ops in prop::collection::vec(allocator_op_strategy(), 1..200),
    ) {
        let backend = HeadlessBackend::builder()
            .completion(CompletionMode::Manual)
            .wait_timeout(Duration::from_millis(200))
            .build();
        let manager = start(&backend);
        let device = device(&manager);
        let gpu = native(&backend);
        let queue = device.queue(QueueType::Graphics);
        let mut tags: HashMap<u64, FenceValue> = HashMap::new();
        let mut held = Vec::new();

        for op in ops {
            match op {
                AllocatorOp::Request => {
                    let allocator = queue.request_allocator().unwrap();
                    if let Some(tag) = tags.remove(&allocator.id()) {
                        prop_assert!(
                            tag <= queue.last_completed_fence_value(),
                            "allocator #{} tagged {} handed out at {}",
                            allocator.id(),
                            tag,
                            queue.last_completed_fence_value()
                        );
                    }
                    held.push(allocator);
                }
                AllocatorOp::Discard => {
                    if let Some(allocator) = held.pop() {
                        let tag = queue.last_signaled_fence_value();
                        tags.insert(allocator.id(), tag);
                        queue.discard_allocator(tag, allocator);
                    }
                }
                AllocatorOp::Submit => {
                    device.begin_graphics_context("").unwrap().finish(false).unwrap();
                }
                AllocatorOp::Complete(n) => {
                    let submitted = gpu.last_submitted(QueueType::Graphics);
                    let completed = gpu.completed_value(QueueType::Graphics);
                    let pending = submitted.counter() - completed.counter();
                    if pending > 0 {
                        gpu.complete(QueueType::Graphics, FenceValue(completed.0 + 1 + n % pending));
                    }
                }
            }
        }

        for allocator in held.drain(..) {
            queue.discard_allocator(queue.last_signaled_fence_value(), allocator);
        }
        gpu.complete_all();
    }

    #[test]
    fn last_requested_state_wins_after_a_flush(
        rounds in prop::collection::vec(
            prop::collection::vec(0..STATES.len(), 1..6),
            1..30,
        ),
    ) {
        let backend = HeadlessBackend::new();
        let manager = start(&backend);
        let device = device(&manager);
        let buffer = device
            .create_color_buffer(&ColorBufferDesc::new("Property Target").size(16, 16).format(Format::RGBA8_UNorm))
            .unwrap();

        for (round, requests) in rounds.into_iter().enumerate() {
            let mut context = device.begin_graphics_context("").unwrap();
            let before = buffer.resource().usage_state();
            let mut last = before;
            for index in requests {
                last = STATES[index];
                context.transition_resource(&buffer, last, false).unwrap();
            }
            prop_assert!(context.pending_barrier_count() <= 1, "round {}: transitions were not merged", round);

            backend.journal().clear();
            context.flush_resource_barriers().unwrap();
            let batches = backend.journal().barrier_batches();
            prop_assert_eq!(buffer.resource().usage_state(), last, "round {}", round);
            if last == before {
                prop_assert!(batches.is_empty(), "round {}: redundant transition reached the GPU", round);
            } else {
                prop_assert_eq!(batches.len(), 1, "round {}", round);
                prop_assert_eq!(batches[0].len(), 1, "round {}", round);
            }
            context.finish(false).unwrap();
        }
        device.wait_for_gpu_idle().unwrap();
    }

    #[test]
    fn adapter_selection_is_deterministic(
        adapters in adapters_strategy(),
        prefer_discrete in any::<bool>(),
        allow_software in any::<bool>(),
    ) {
        let policy = SelectionPolicy {
            prefer_discrete,
            allow_software,
        };

        let first = select_adapter(&adapters, policy).map(|a| a.index);
        let second = select_adapter(&adapters, policy).map(|a| a.index);
        prop_assert_eq!(first, second);
        if let Some(index) = first {
            let chosen = &adapters[index];
            prop_assert_ne!(chosen.class, AdapterClass::Other);
            prop_assert!(policy.allow_software || chosen.class != AdapterClass::Software);
        }
    }

    #[test]
    fn pooled_contexts_are_never_recording(
        rounds in prop::collection::vec(prop::collection::vec(any::<bool>(), 1..5), 1..20),
    ) {
        let backend = HeadlessBackend::new();
        let manager = start(&backend);
        let device = device(&manager);

        for finishes in rounds {
            let mut open = Vec::new();
            for _ in &finishes {
                let context = device.begin_context("", CommandListType::Direct).unwrap();
                prop_assert_eq!(context.state(), ContextState::Recording);
                open.push(context);
            }
            // Dropped contexts are abandoned, finished ones submitted.
            for (context, finish) in open.into_iter().zip(finishes) {
                if finish {
                    context.finish(false).unwrap();
                } else {
                    drop(context);
                }
            }
            let stats = device.context_stats(CommandListType::Direct);
            prop_assert_eq!(stats.free, stats.created, "every context should be back in its pool");
        }

        // Reuse proves the pooled contexts were left closed.
        let reused = device.begin_context("", CommandListType::Direct).unwrap();
        prop_assert_eq!(reused.state(), ContextState::Recording);
        reused.finish(true).unwrap();
    }
}
