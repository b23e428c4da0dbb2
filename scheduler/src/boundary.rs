//! Retry boundary around a rendering step.
//!
//! A failing render is retried automatically after 1s, 2s, then 4s. Once the
//! automatic budget is spent the boundary stays failed until
//! [`RetryBoundary::manual_retry`] resets it.

use std::panic::{AssertUnwindSafe, catch_unwind};
use std::time::Duration;

use tracing::{info, warn};

use crate::error::FrameError;

pub const MAX_AUTO_RETRIES: u32 = 3;
pub const BASE_RETRY_DELAY: Duration = Duration::from_secs(1);

#[derive(Debug, Clone)]
pub struct RetryBoundary {
    max_retries: u32,
    base_delay: Duration,
    retry_count: u32,
    last_error: Option<String>,
}

impl Default for RetryBoundary {
    fn default() -> Self {
        Self::new(MAX_AUTO_RETRIES, BASE_RETRY_DELAY)
    }
}

impl RetryBoundary {
    pub fn new(max_retries: u32, base_delay: Duration) -> Self {
        Self {
            max_retries,
            base_delay,
            retry_count: 0,
            last_error: None,
        }
    }

    pub fn retry_count(&self) -> u32 {
        self.retry_count
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn has_error(&self) -> bool {
        self.last_error.is_some()
    }

    /// True once automatic retries are exhausted and the render is still failing.
    pub fn needs_manual_retry(&self) -> bool {
        self.has_error() && self.retry_count >= self.max_retries
    }

    /// Records a failure. Returns the delay before the next automatic retry, or
    /// `None` when only a manual retry remains.
    pub fn on_error(&mut self, message: impl Into<String>) -> Option<Duration> {
        let message = message.into();
        warn!(retry_count = self.retry_count, error = %message, "render failed");
        self.last_error = Some(message);

        if self.retry_count >= self.max_retries {
            return None;
        }
        Some(self.base_delay * 2u32.pow(self.retry_count))
    }

    /// The auto-retry delay elapsed; the next render counts as one more retry.
    pub fn on_retry_elapsed(&mut self) {
        self.retry_count += 1;
        self.last_error = None;
    }

    pub fn manual_retry(&mut self) {
        info!(retry_count = self.retry_count, "manual render retry");
        self.retry_count = 0;
        self.last_error = None;
    }

    /// Runs `render` until it succeeds or the automatic budget is spent.
    ///
    /// Panics inside `render` count as failures.
    pub async fn render_with_retry<F>(&mut self, mut render: F) -> Result<(), FrameError>
    where
        F: FnMut() -> anyhow::Result<()>,
    {
        let mut attempts = 0;
        loop {
            attempts += 1;
            let message = match catch_unwind(AssertUnwindSafe(&mut render)) {
                Ok(Ok(())) => {
                    self.last_error = None;
                    return Ok(());
                }
                Ok(Err(err)) => format!("{err:#}"),
                Err(_) => "render panicked".to_string(),
            };

            match self.on_error(message.clone()) {
                Some(delay) => {
                    tokio::time::sleep(delay).await;
                    self.on_retry_elapsed();
                }
                None => return Err(FrameError::RetriesExhausted { attempts, message }),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn delays_double_then_stop() {
        let mut b = RetryBoundary::default();
        let mut delays = Vec::new();
        while let Some(d) = b.on_error("boom") {
            delays.push(d);
            b.on_retry_elapsed();
        }
        assert_eq!(
            delays,
            vec![
                Duration::from_secs(1),
                Duration::from_secs(2),
                Duration::from_secs(4)
            ]
        );
        assert!(b.needs_manual_retry());

        b.manual_retry();
        assert_eq!(b.retry_count(), 0);
        assert!(!b.needs_manual_retry());
        assert_eq!(b.on_error("again"), Some(Duration::from_secs(1)));
    }

    #[tokio::test(start_paused = true)]
    async fn recovers_on_a_later_attempt() {
        let mut b = RetryBoundary::default();
        let mut calls = 0;
        let start = tokio::time::Instant::now();

        let out = b
            .render_with_retry(|| {
                calls += 1;
                if calls < 3 {
                    anyhow::bail!("not yet");
                }
                Ok(())
            })
            .await;

        assert!(out.is_ok());
        assert_eq!(calls, 3);
        assert_eq!(start.elapsed(), Duration::from_secs(3));
        assert!(!b.has_error());
    }

    #[tokio::test(start_paused = true)]
    async fn gives_up_after_three_retries() {
        let mut b = RetryBoundary::default();
        let mut calls = 0;

        let out = b
            .render_with_retry(|| {
                calls += 1;
                panic!("render exploded");
            })
            .await;

        assert_eq!(calls, 4);
        assert!(matches!(
            out,
            Err(FrameError::RetriesExhausted { attempts: 4, .. })
        ));
        assert!(b.needs_manual_retry());
    }
}
