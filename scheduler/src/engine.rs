//! The synchronous scheduler core.
//!
//! Each drain cycle:
//!   1. Stops and marks the scheduler idle if the queue is empty.
//!   2. Feeds the cycle timestamp to the [`PerformanceMonitor`].
//!   3. Pops up to `batch_size` tasks for the current mode in drain order.
//!   4. Runs each callback with its own panic isolation.
//!   5. Hands back the delay before the next cycle.
//!
//! The core never sleeps or spawns. [`crate::driver::FrameLoop`] splits a cycle
//! into [`FrameScheduler::begin_drain`] and [`FrameScheduler::finish_drain`] so
//! its lock is released while callbacks run; hosts that own the scheduler
//! directly call [`FrameScheduler::drain`].

use std::any::Any;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::time::Duration;

use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::error::FrameError;
use crate::policy::{ModeChange, PerformanceMode, PerformanceMonitor};
use crate::state::{Callback, QueuedTask, TaskQueue};
use crate::types::{MotionPreference, SchedulerConfig, TaskId, TaskPriority};

/// Outcome of [`FrameScheduler::enqueue`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Enqueued {
    /// Reduced motion was active; the callback already ran and nothing was queued.
    Ran(TaskId),
    /// Queued. `start_drain` is true when no cycle was scheduled before.
    Queued { id: TaskId, start_drain: bool },
}

impl Enqueued {
    pub fn id(&self) -> TaskId {
        match *self {
            Enqueued::Ran(id) | Enqueued::Queued { id, .. } => id,
        }
    }
}

#[derive(Debug, Default)]
pub struct DrainReport {
    /// Tasks that ran to completion, in execution order.
    pub executed: Vec<TaskId>,
    pub failures: Vec<FrameError>,
    pub mode_change: Option<ModeChange>,
    /// `None` means the scheduler went idle.
    pub next_wake: Option<Duration>,
}

/// Tasks popped by [`FrameScheduler::begin_drain`], to be run outside any lock.
#[derive(Debug)]
pub(crate) struct DrainBatch {
    pub(crate) tasks: Vec<QueuedTask>,
    pub(crate) interval: Duration,
    pub(crate) mode_change: Option<ModeChange>,
}

#[derive(Debug)]
pub struct FrameScheduler {
    queue: TaskQueue,
    monitor: PerformanceMonitor,
    motion: MotionPreference,
    next_id: u64,
    wake_pending: bool,
    visible: bool,
    torn_down: bool,
}

impl FrameScheduler {
    pub fn new(config: &SchedulerConfig, motion: MotionPreference) -> Self {
        Self {
            queue: TaskQueue::default(),
            monitor: PerformanceMonitor::new(config.performance_threshold_fps, config.initial_mode),
            motion,
            next_id: 0,
            wake_pending: false,
            visible: true,
            torn_down: false,
        }
    }

    /// Queues `callback`, or runs it right away when reduced motion is active.
    pub fn enqueue<F>(
        &mut self,
        callback: F,
        priority: TaskPriority,
        now: Instant,
    ) -> Result<Enqueued, FrameError>
    where
        F: FnOnce() + Send + 'static,
    {
        if self.motion.is_reduced() {
            let id = self.allocate_id()?;
            if let Err(err) = run_isolated(id, Box::new(callback)) {
                warn!(error = %err, "animation task failed");
            }
            return Ok(Enqueued::Ran(id));
        }

        let (id, start_drain) = self.push(Box::new(callback), priority, now)?;
        Ok(Enqueued::Queued { id, start_drain })
    }

    pub(crate) fn allocate_id(&mut self) -> Result<TaskId, FrameError> {
        if self.torn_down {
            return Err(FrameError::TornDown);
        }
        self.next_id += 1;
        Ok(TaskId(self.next_id))
    }

    /// Appends without looking at the motion preference. Returns the new id and
    /// whether the caller must start a drain cycle.
    pub(crate) fn push(
        &mut self,
        callback: Callback,
        priority: TaskPriority,
        now: Instant,
    ) -> Result<(TaskId, bool), FrameError> {
        let id = self.allocate_id()?;
        self.queue.push(QueuedTask {
            id,
            callback,
            priority,
            enqueued_at: now,
        });
        debug!(task_id = %id, ?priority, queued = self.queue.len(), "animation task queued");
        Ok((id, self.request_wake()))
    }

    /// Marks a cycle as scheduled if one is needed and none is pending.
    fn request_wake(&mut self) -> bool {
        if self.wake_pending || !self.visible || self.torn_down || self.queue.is_empty() {
            return false;
        }
        self.wake_pending = true;
        true
    }

    /// Removes a task that has not run yet. Returns whether it was still queued.
    pub fn cancel(&mut self, id: TaskId) -> bool {
        let removed = self.queue.remove(id);
        if removed {
            debug!(task_id = %id, "animation task cancelled");
        }
        removed
    }

    /// Records page visibility. Returns true when a drain cycle must start now.
    pub fn set_visible(&mut self, visible: bool) -> bool {
        if self.visible == visible {
            return false;
        }
        self.visible = visible;
        debug!(visible, queued = self.queue.len(), "visibility changed");

        if visible {
            self.request_wake()
        } else {
            self.wake_pending = false;
            false
        }
    }

    /// Runs one full drain cycle inline.
    pub fn drain(&mut self, now: Instant) -> DrainReport {
        let Some(batch) = self.begin_drain(now) else {
            return DrainReport::default();
        };

        let (executed, failures) = run_batch(batch.tasks);
        let next_wake = self.finish_drain(batch.interval);

        DrainReport {
            executed,
            failures,
            mode_change: batch.mode_change,
            next_wake,
        }
    }

    /// First half of a cycle: idle check, performance step, and batch selection.
    pub(crate) fn begin_drain(&mut self, now: Instant) -> Option<DrainBatch> {
        if self.torn_down || !self.visible || self.queue.is_empty() {
            self.wake_pending = false;
            return None;
        }

        let mode_change = self.monitor.observe_frame(now);
        let mode = self.monitor.mode();
        let interval = if self.motion.is_reduced() {
            Duration::ZERO
        } else {
            mode.frame_interval()
        };
        let tasks = self.queue.pop_batch(mode.batch_size());

        Some(DrainBatch {
            tasks,
            interval,
            mode_change,
        })
    }

    /// Second half of a cycle: the delay before the next one, if any.
    pub(crate) fn finish_drain(&mut self, interval: Duration) -> Option<Duration> {
        if self.torn_down || !self.visible {
            self.wake_pending = false;
            return None;
        }
        self.wake_pending = true;
        Some(interval)
    }

    /// Drops every queued task without running it. Later enqueues are rejected.
    pub fn teardown(&mut self) {
        if self.torn_down {
            return;
        }
        self.torn_down = true;
        self.wake_pending = false;
        let dropped = self.queue.clear();
        info!(dropped, "frame scheduler torn down");
    }

    pub fn mode(&self) -> PerformanceMode {
        self.monitor.mode()
    }

    pub fn set_mode(&mut self, mode: PerformanceMode) {
        self.monitor.set_mode(mode);
    }

    pub fn monitor(&self) -> &PerformanceMonitor {
        &self.monitor
    }

    pub fn queue_len(&self) -> usize {
        self.queue.len()
    }

    /// True while a drain cycle is scheduled or running.
    pub fn is_animating(&self) -> bool {
        self.wake_pending
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn is_torn_down(&self) -> bool {
        self.torn_down
    }
}

/// Runs a popped batch in order. One failing callback never stops the rest.
pub(crate) fn run_batch(tasks: Vec<QueuedTask>) -> (Vec<TaskId>, Vec<FrameError>) {
    let mut executed = Vec::with_capacity(tasks.len());
    let mut failures = Vec::new();

    for task in tasks {
        match run_isolated(task.id, task.callback) {
            Ok(()) => executed.push(task.id),
            Err(err) => {
                warn!(error = %err, "animation task failed");
                failures.push(err);
            }
        }
    }

    (executed, failures)
}

pub(crate) fn run_isolated(id: TaskId, callback: Callback) -> Result<(), FrameError> {
    catch_unwind(AssertUnwindSafe(callback)).map_err(|payload| FrameError::CallbackPanicked {
        task_id: id,
        message: panic_message(payload.as_ref()),
    })
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    }
}
