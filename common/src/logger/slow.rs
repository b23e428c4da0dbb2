use std::time::{Duration, Instant};

/// Awaits `fut` and emits a `performance` warning when it took longer than `max`.
pub async fn warn_if_slow<F, T>(label: &'static str, max: Duration, fut: F) -> T
where
    F: std::future::Future<Output = T>,
{
    let start = Instant::now();
    let out = fut.await;
    report(label, max, start.elapsed());
    out
}

/// Synchronous counterpart of [`warn_if_slow`] for work that never yields.
pub fn time_if_slow<F, T>(label: &'static str, max: Duration, f: F) -> T
where
    F: FnOnce() -> T,
{
    let start = Instant::now();
    let out = f();
    report(label, max, start.elapsed());
    out
}

fn report(label: &'static str, max: Duration, elapsed: Duration) {
    if elapsed > max {
        tracing::warn!(
            target: "performance",
            label = label,
            elapsed_ms = elapsed.as_millis() as u64,
            "slow operation detected"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tracing_test::traced_test;

    #[traced_test]
    #[test]
    fn slow_sync_work_is_reported() {
        let out = time_if_slow("sleepy", Duration::from_millis(1), || {
            std::thread::sleep(Duration::from_millis(5));
            7
        });
        assert_eq!(out, 7);
        assert!(logs_contain("slow operation detected"));
    }

    #[traced_test]
    #[tokio::test]
    async fn fast_async_work_is_silent() {
        let out = warn_if_slow("quick", Duration::from_secs(5), async { 3 }).await;
        assert_eq!(out, 3);
        assert!(!logs_contain("slow operation detected"));
    }
}
