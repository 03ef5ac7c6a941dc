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

//! The simulated GPU timeline: one fence per submission queue and an optional
//! worker thread that completes submissions in order.

use super::journal::{HeadlessJournal, JournalEvent};
use kiln_core::gpu::api::{FenceValue, QueueType};
use kiln_core::gpu::error::NativeError;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Condvar, Mutex, PoisonError};
use std::thread;
use std::time::Duration;

/// How the headless GPU completes submitted work.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompletionMode {
    /// A worker thread signals every submission in order, `delay` after it
    /// reaches the front of the timeline.
    Automatic {
        /// Simulated execution time of one submission.
        delay: Duration,
    },
    /// Nothing completes until the test calls
    /// [`HeadlessDevice::complete`](super::HeadlessDevice::complete).
    Manual,
}

impl Default for CompletionMode {
    fn default() -> Self {
        Self::Automatic {
            delay: Duration::ZERO,
        }
    }
}

/// The fence of one simulated queue.
#[derive(Debug)]
pub(crate) struct HeadlessFence {
    queue_type: QueueType,
    completed: Mutex<FenceValue>,
    signaled: Condvar,
    submitted: AtomicU64,
}

impl HeadlessFence {
    fn new(queue_type: QueueType) -> Self {
        let initial = FenceValue::initial_completed(queue_type);
        Self {
            queue_type,
            completed: Mutex::new(initial),
            signaled: Condvar::new(),
            submitted: AtomicU64::new(initial.0),
        }
    }

    pub(crate) fn completed(&self) -> FenceValue {
        *self.completed.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub(crate) fn last_submitted(&self) -> FenceValue {
        FenceValue(self.submitted.load(Ordering::Acquire))
    }

    /// Raises the completed value. Never lowers it.
    fn signal(&self, value: FenceValue) {
        let mut completed = self.completed.lock().unwrap_or_else(PoisonError::into_inner);
        if value > *completed {
            *completed = value;
        }
        self.signaled.notify_all();
    }

    /// Blocks until the fence reaches `value`. `None` waits without a bound.
    pub(crate) fn wait(&self, value: FenceValue, timeout: Option<Duration>) -> Result<(), NativeError> {
        let completed = self.completed.lock().unwrap_or_else(PoisonError::into_inner);
        let Some(timeout) = timeout else {
            let _completed = self
                .signaled
                .wait_while(completed, |completed| *completed < value)
                .unwrap_or_else(PoisonError::into_inner);
            return Ok(());
        };
        let (completed, result) = self
            .signaled
            .wait_timeout_while(completed, timeout, |completed| *completed < value)
            .unwrap_or_else(PoisonError::into_inner);
        if result.timed_out() && *completed < value {
            return Err(NativeError::new(
                "wait_for_value",
                format!(
                    "{} fence stuck at {} while waiting for {}",
                    self.queue_type, *completed, value
                ),
            ));
        }
        Ok(())
    }
}

struct Signal {
    fence: Arc<HeadlessFence>,
    value: FenceValue,
}

/// The fences of the three submission queues and the worker completing them.
#[derive(Debug)]
pub(crate) struct Timeline {
    fences: [Arc<HeadlessFence>; 3],
    journal: Arc<HeadlessJournal>,
    sender: Option<flume::Sender<Signal>>,
    worker: Option<thread::JoinHandle<()>>,
    wait_timeout: Option<Duration>,
}

impl std::fmt::Debug for Signal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Signal({})", self.value)
    }
}

impl Timeline {
    pub(crate) fn new(
        mode: CompletionMode,
        wait_timeout: Duration,
        journal: Arc<HeadlessJournal>,
    ) -> Result<Self, NativeError> {
        let fences = QueueType::SUBMISSION.map(|queue| Arc::new(HeadlessFence::new(queue)));

        let (sender, worker) = match mode {
            CompletionMode::Automatic { delay } => {
                let (sender, receiver) = flume::unbounded::<Signal>();
                let journal = Arc::clone(&journal);
                let worker = thread::Builder::new()
                    .name("kiln-headless-gpu".to_owned())
                    .spawn(move || {
                        log::debug!(target: kiln_core::gpu::LOG_GRAPHICS, "Headless GPU timeline started");
                        for signal in receiver.iter() {
                            if !delay.is_zero() {
                                thread::sleep(delay);
                            }
                            signal.fence.signal(signal.value);
                            journal.record(JournalEvent::Completed {
                                queue: signal.fence.queue_type,
                                fence: signal.value,
                            });
                        }
                        log::debug!(target: kiln_core::gpu::LOG_GRAPHICS, "Headless GPU timeline stopped");
                    })
                    .map_err(|e| NativeError::new("create_device", format!("cannot start the GPU timeline: {e}")))?;
                (Some(sender), Some(worker))
            }
            CompletionMode::Manual => (None, None),
        };
        // Only manual fences can stall forever; the worker always catches up.
        let wait_timeout = match mode {
            CompletionMode::Automatic { .. } => None,
            CompletionMode::Manual => Some(wait_timeout),
        };

        Ok(Self {
            fences,
            journal,
            sender,
            worker,
            wait_timeout,
        })
    }

    pub(crate) fn fence(&self, queue_type: QueueType) -> &Arc<HeadlessFence> {
        &self.fences[queue_type.index()]
    }

    pub(crate) fn wait_timeout(&self) -> Option<Duration> {
        self.wait_timeout
    }

    /// Queues `value` for completion on `queue_type`'s fence.
    pub(crate) fn submit(&self, queue_type: QueueType, value: FenceValue) {
        let fence = self.fence(queue_type);
        fence.submitted.fetch_max(value.0, Ordering::AcqRel);
        if let Some(sender) = &self.sender {
            let signal = Signal {
                fence: Arc::clone(fence),
                value,
            };
            if let Err(flume::SendError(signal)) = sender.send(signal) {
                log::warn!(target: kiln_core::gpu::LOG_GRAPHICS, "Headless GPU timeline is gone, completing inline");
                signal.fence.signal(signal.value);
            }
        }
    }

    /// Completes every submission on `queue_type` up to `value`. Values
    /// beyond the last submission are clamped to it.
    pub(crate) fn complete(&self, queue_type: QueueType, value: FenceValue) {
        let fence = self.fence(queue_type);
        let value = value.min(fence.last_submitted());
        if value > fence.completed() {
            fence.signal(value);
            self.journal.record(JournalEvent::Completed {
                queue: queue_type,
                fence: value,
            });
        }
    }

    /// Completes everything submitted so far on every queue.
    pub(crate) fn complete_all(&self) {
        for queue in QueueType::SUBMISSION {
            self.complete(queue, self.fence(queue).last_submitted());
        }
    }

    /// Blocks until every queue has completed its last submission.
    pub(crate) fn wait_idle(&self) -> Result<(), NativeError> {
        for fence in &self.fences {
            fence.wait(fence.last_submitted(), self.wait_timeout)?;
        }
        Ok(())
    }
}

impl Drop for Timeline {
    fn drop(&mut self) {
        // Closing the channel lets the worker drain the remaining signals and exit.
        self.sender = None;
        if let Some(worker) = self.worker.take() {
            if worker.join().is_err() {
                log::error!(target: kiln_core::gpu::LOG_GRAPHICS, "Headless GPU timeline panicked");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn timeline(mode: CompletionMode) -> Timeline {
        Timeline::new(mode, Duration::from_millis(200), Arc::new(HeadlessJournal::new())).unwrap()
    }

    #[test]
    fn automatic_mode_completes_in_order() {
        let timeline = timeline(CompletionMode::Automatic {
            delay: Duration::from_millis(1),
        });
        let first = FenceValue::first_signal(QueueType::Graphics);
        timeline.submit(QueueType::Graphics, first);
        timeline.submit(QueueType::Graphics, first.next());

        let fence = timeline.fence(QueueType::Graphics);
        fence.wait(first.next(), Some(Duration::from_secs(5))).unwrap();
        assert_eq!(fence.completed(), first.next());
    }

    #[test]
    fn automatic_waits_outlast_the_manual_timeout() {
        let timeline = Timeline::new(
            CompletionMode::Automatic {
                delay: Duration::from_millis(60),
            },
            Duration::from_millis(10),
            Arc::new(HeadlessJournal::new()),
        )
        .unwrap();
        assert_eq!(timeline.wait_timeout(), None);

        let first = FenceValue::first_signal(QueueType::Graphics);
        timeline.submit(QueueType::Graphics, first);
        timeline.fence(QueueType::Graphics).wait(first, timeline.wait_timeout()).unwrap();
        timeline.wait_idle().unwrap();
    }

    #[test]
    fn manual_mode_waits_time_out() {
        let timeline = timeline(CompletionMode::Manual);
        let first = FenceValue::first_signal(QueueType::Copy);
        timeline.submit(QueueType::Copy, first);

        let err = timeline.fence(QueueType::Copy).wait(first, Some(Duration::from_millis(10))).unwrap_err();
        assert_eq!(err.call, "wait_for_value");

        timeline.complete(QueueType::Copy, first);
        timeline.fence(QueueType::Copy).wait(first, Some(Duration::from_millis(10))).unwrap();
    }

    #[test]
    fn manual_completion_is_clamped_to_submissions() {
        let timeline = timeline(CompletionMode::Manual);
        let first = FenceValue::first_signal(QueueType::Compute);
        timeline.submit(QueueType::Compute, first);
        timeline.complete(QueueType::Compute, first.next().next());
        assert_eq!(timeline.fence(QueueType::Compute).completed(), first);
    }

    #[test]
    fn idle_waits_for_every_queue() {
        let timeline = timeline(CompletionMode::Manual);
        for queue in QueueType::SUBMISSION {
            timeline.submit(queue, FenceValue::first_signal(queue));
        }
        assert!(timeline.wait_idle().is_err());
        timeline.complete_all();
        timeline.wait_idle().unwrap();
    }
}
