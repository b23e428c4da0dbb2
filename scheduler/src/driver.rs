//! Tokio driver for a [`FrameScheduler`].
//!
//! One background task owns the drain loop, so two cycles can never overlap.
//! The scheduler lock is held only to pick a batch and to book the next wake;
//! callbacks run with the lock released.

use std::sync::Arc;

use common::logger::time_if_slow;
use parking_lot::Mutex;
use tokio::sync::{Notify, watch};
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, info};

use crate::engine::{FrameScheduler, run_batch, run_isolated};
use crate::error::FrameError;
use crate::policy::PerformanceMode;
use crate::types::{MotionPreference, SchedulerConfig, TaskId, TaskPriority};

struct Shared {
    scheduler: Mutex<FrameScheduler>,
    motion: MotionPreference,
    config: SchedulerConfig,
    kick: Notify,
    shutdown: watch::Sender<bool>,
    task: Mutex<Option<JoinHandle<()>>>,
}

/// Cloneable handle to a running frame loop.
#[derive(Clone)]
pub struct FrameLoop {
    shared: Arc<Shared>,
}

impl FrameLoop {
    /// Builds the scheduler and spawns its drain task on the current runtime.
    pub fn spawn(config: SchedulerConfig, motion: MotionPreference) -> Self {
        let (shutdown, shutdown_rx) = watch::channel(false);
        let shared = Arc::new(Shared {
            scheduler: Mutex::new(FrameScheduler::new(&config, motion.clone())),
            motion,
            config,
            kick: Notify::new(),
            shutdown,
            task: Mutex::new(None),
        });

        let handle = tokio::spawn(drain_loop(shared.clone(), shutdown_rx));
        *shared.task.lock() = Some(handle);

        info!(
            threshold_fps = shared.config.performance_threshold_fps,
            mode = ?shared.config.initial_mode,
            "frame loop started"
        );

        Self { shared }
    }

    pub fn enqueue<F>(&self, callback: F, priority: TaskPriority) -> Result<TaskId, FrameError>
    where
        F: FnOnce() + Send + 'static,
    {
        if self.shared.motion.is_reduced() {
            let id = self.shared.scheduler.lock().allocate_id()?;
            if let Err(err) = run_isolated(id, Box::new(callback)) {
                tracing::warn!(error = %err, "animation task failed");
            }
            return Ok(id);
        }

        let (id, start_drain) =
            self.shared
                .scheduler
                .lock()
                .push(Box::new(callback), priority, Instant::now())?;
        if start_drain {
            self.shared.kick.notify_one();
        }
        Ok(id)
    }

    pub fn cancel(&self, id: TaskId) -> bool {
        self.shared.scheduler.lock().cancel(id)
    }

    pub fn set_visible(&self, visible: bool) {
        if self.shared.scheduler.lock().set_visible(visible) {
            self.shared.kick.notify_one();
        }
    }

    pub fn mode(&self) -> PerformanceMode {
        self.shared.scheduler.lock().mode()
    }

    pub fn queue_len(&self) -> usize {
        self.shared.scheduler.lock().queue_len()
    }

    pub fn is_animating(&self) -> bool {
        self.shared.scheduler.lock().is_animating()
    }

    pub fn motion(&self) -> &MotionPreference {
        &self.shared.motion
    }

    /// Cancels the pending wake and drops queued tasks without running them.
    pub fn teardown(&self) {
        self.shared.scheduler.lock().teardown();
        let _ = self.shared.shutdown.send(true);
        if let Some(handle) = self.shared.task.lock().take() {
            handle.abort();
        }
    }
}

async fn drain_loop(shared: Arc<Shared>, mut shutdown: watch::Receiver<bool>) {
    loop {
        tokio::select! {
            _ = shared.kick.notified() => {}
            _ = shutdown.changed() => break,
        }

        loop {
            let batch = shared.scheduler.lock().begin_drain(Instant::now());
            let Some(batch) = batch else {
                debug!("frame loop idle");
                break;
            };

            let (executed, failures) =
                time_if_slow("frame_drain", shared.config.slow_drain, || run_batch(batch.tasks));
            debug!(
                executed = executed.len(),
                failed = failures.len(),
                interval_ms = batch.interval.as_millis() as u64,
                "drain cycle finished"
            );

            let next = shared.scheduler.lock().finish_drain(batch.interval);
            match next {
                None => break,
                Some(delay) if delay.is_zero() => tokio::task::yield_now().await,
                Some(delay) => {
                    tokio::select! {
                        _ = tokio::time::sleep(delay) => {}
                        _ = shared.kick.notified() => {}
                        _ = shutdown.changed() => return,
                    }
                }
            }
        }
    }
}
