//! Adaptive throughput policy.
//!
//! The monitor keeps a trailing window of instantaneous frame rates measured
//! between drain cycles and moves the [`PerformanceMode`] one step at a time,
//! with asymmetric thresholds so the mode does not oscillate around a single
//! cut-off.

use std::collections::VecDeque;
use std::time::Duration;

use tokio::time::Instant;
use tracing::info;

/// Samples kept for the trailing average.
pub const LIVE_SAMPLES: usize = 60;

/// Upper bound the window may ever reach; the live cap keeps it well below.
pub const HARD_SAMPLE_LIMIT: usize = 120;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PerformanceMode {
    High,
    #[default]
    Balanced,
    Performance,
}

impl PerformanceMode {
    pub fn target_fps(self) -> u32 {
        match self {
            PerformanceMode::High => 60,
            PerformanceMode::Balanced => 30,
            PerformanceMode::Performance => 15,
        }
    }

    /// Delay between two drain cycles in this mode.
    pub fn frame_interval(self) -> Duration {
        Duration::from_secs_f64(1.0 / f64::from(self.target_fps()))
    }

    /// Maximum number of tasks popped per drain cycle.
    pub fn batch_size(self) -> usize {
        match self {
            PerformanceMode::High => 10,
            PerformanceMode::Balanced => 5,
            PerformanceMode::Performance => 2,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ModeChange {
    pub from: PerformanceMode,
    pub to: PerformanceMode,
    pub average_fps: f64,
}

#[derive(Debug)]
pub struct PerformanceMonitor {
    threshold_fps: f64,
    mode: PerformanceMode,
    samples: VecDeque<f64>,
    last_frame: Option<Instant>,
}

impl PerformanceMonitor {
    pub fn new(threshold_fps: f64, initial_mode: PerformanceMode) -> Self {
        Self {
            threshold_fps,
            mode: initial_mode,
            samples: VecDeque::with_capacity(LIVE_SAMPLES + 1),
            last_frame: None,
        }
    }

    pub fn mode(&self) -> PerformanceMode {
        self.mode
    }

    /// Manual override; the next evaluations continue from the new mode.
    pub fn set_mode(&mut self, mode: PerformanceMode) {
        self.mode = mode;
    }

    pub fn threshold_fps(&self) -> f64 {
        self.threshold_fps
    }

    pub fn sample_count(&self) -> usize {
        self.samples.len()
    }

    pub fn average_fps(&self) -> Option<f64> {
        if self.samples.is_empty() {
            return None;
        }
        Some(self.samples.iter().sum::<f64>() / self.samples.len() as f64)
    }

    /// Records the time of a drain cycle.
    ///
    /// The first call only establishes the reference point; a zero-length gap
    /// carries no rate information and is skipped.
    pub fn observe_frame(&mut self, now: Instant) -> Option<ModeChange> {
        let prev = self.last_frame.replace(now)?;
        let elapsed = now.saturating_duration_since(prev);
        if elapsed.is_zero() {
            return None;
        }
        self.record_fps(1.0 / elapsed.as_secs_f64())
    }

    /// Appends one instantaneous fps sample and runs one evaluation.
    pub fn record_fps(&mut self, fps: f64) -> Option<ModeChange> {
        if !fps.is_finite() || fps < 0.0 {
            return None;
        }

        self.samples.push_back(fps);
        while self.samples.len() > LIVE_SAMPLES {
            self.samples.pop_front();
        }
        debug_assert!(self.samples.len() <= HARD_SAMPLE_LIMIT);

        let average_fps = self.average_fps()?;
        self.evaluate(average_fps)
    }

    /// At most one transition per evaluation, checked in a fixed order.
    fn evaluate(&mut self, average_fps: f64) -> Option<ModeChange> {
        let t = self.threshold_fps;
        let next = match self.mode {
            PerformanceMode::High if average_fps < t => PerformanceMode::Balanced,
            PerformanceMode::Balanced if average_fps < t / 2.0 => PerformanceMode::Performance,
            PerformanceMode::Performance if average_fps > t * 1.5 => PerformanceMode::Balanced,
            PerformanceMode::Balanced if average_fps > t * 2.0 => PerformanceMode::High,
            _ => return None,
        };

        let change = ModeChange {
            from: self.mode,
            to: next,
            average_fps,
        };
        self.mode = next;

        info!(
            from = ?change.from,
            to = ?change.to,
            average_fps = change.average_fps,
            "performance mode changed"
        );

        Some(change)
    }
}
