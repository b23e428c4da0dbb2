//! Animation frame scheduling.
//!
//! [`engine::FrameScheduler`] is the synchronous core: a priority queue of
//! animation callbacks drained in bounded batches whose size and cadence follow
//! the adaptive [`policy::PerformanceMode`]. [`driver::FrameLoop`] owns one
//! scheduler behind a mutex and runs its drain cycles on a tokio task.

pub mod boundary;
pub mod driver;
pub mod engine;
pub mod error;
pub mod motion;
pub mod policy;
pub mod state;
pub mod types;

pub use boundary::RetryBoundary;
pub use driver::FrameLoop;
pub use engine::{DrainReport, Enqueued, FrameScheduler};
pub use error::FrameError;
pub use motion::{Motion, MotionSpec, RenderSink, Transition, VisualState};
pub use policy::{ModeChange, PerformanceMode, PerformanceMonitor};
pub use types::{MotionPreference, SchedulerConfig, TaskId, TaskPriority};
