use std::time::Duration;

pub const BASE_DELAY: Duration = Duration::from_millis(1000);
pub const MAX_ATTEMPTS: u32 = 5;

/// Exponential reconnect backoff: `base * 2^(attempt - 1)` for attempts
/// `1..=max_attempts`, then nothing. A successful connection resets it.
#[derive(Debug, Clone)]
pub struct ReconnectPolicy {
    base: Duration,
    max_attempts: u32,
    attempts: u32,
}

impl Default for ReconnectPolicy {
    fn default() -> Self {
        Self::new(BASE_DELAY, MAX_ATTEMPTS)
    }
}

impl ReconnectPolicy {
    pub fn new(base: Duration, max_attempts: u32) -> Self {
        Self {
            base,
            max_attempts,
            attempts: 0,
        }
    }

    /// Delay before the next attempt, or `None` once the budget is spent.
    pub fn next_delay(&mut self) -> Option<Duration> {
        if self.attempts >= self.max_attempts {
            return None;
        }
        self.attempts += 1;
        Some(self.base * 2u32.pow(self.attempts - 1))
    }

    pub fn reset(&mut self) {
        self.attempts = 0;
    }

    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    pub fn is_exhausted(&self) -> bool {
        self.attempts >= self.max_attempts
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn doubles_then_stops() {
        let mut p = ReconnectPolicy::default();
        let delays: Vec<u64> = std::iter::from_fn(|| p.next_delay())
            .map(|d| d.as_secs())
            .collect();
        assert_eq!(delays, vec![1, 2, 4, 8, 16]);
        assert!(p.is_exhausted());
        assert_eq!(p.next_delay(), None);
    }

    #[test]
    fn reset_restores_budget() {
        let mut p = ReconnectPolicy::default();
        p.next_delay();
        p.next_delay();
        p.reset();
        assert_eq!(p.next_delay(), Some(Duration::from_secs(1)));
    }
}
