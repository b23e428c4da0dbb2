//! Shared types used by the scheduler subsystem.

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use crate::policy::PerformanceMode;

/// Identifier handed out by `enqueue`, used for cancellation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TaskId(pub(crate) u64);

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "anim_{}", self.0)
    }
}

/// Priority band of a queued animation task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum TaskPriority {
    High,
    #[default]
    Normal,
    Low,
}

impl TaskPriority {
    /// Higher rank drains first.
    pub(crate) fn rank(self) -> u8 {
        match self {
            TaskPriority::High => 3,
            TaskPriority::Normal => 2,
            TaskPriority::Low => 1,
        }
    }
}

/// The user's reduced-motion accessibility preference.
///
/// Cloned into every component that must honour it; flipping it on one clone is
/// visible to all of them.
#[derive(Debug, Clone, Default)]
pub struct MotionPreference(Arc<AtomicBool>);

impl MotionPreference {
    pub fn new(reduced: bool) -> Self {
        Self(Arc::new(AtomicBool::new(reduced)))
    }

    pub fn is_reduced(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }

    pub fn set_reduced(&self, reduced: bool) {
        self.0.store(reduced, Ordering::Release);
    }
}

/// Configuration knobs for the frame scheduler.
#[derive(Debug, Clone)]
pub struct SchedulerConfig {
    /// Target frame rate the performance monitor compares its trailing average
    /// against. Fixed for the lifetime of the scheduler.
    pub performance_threshold_fps: f64,

    /// Mode the scheduler starts in before any samples exist.
    pub initial_mode: PerformanceMode,

    /// Drain cycles slower than this are reported under the `performance` target.
    pub slow_drain: Duration,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            performance_threshold_fps: 30.0,
            initial_mode: PerformanceMode::Balanced,
            slow_drain: Duration::from_millis(16),
        }
    }
}
