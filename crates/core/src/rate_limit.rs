//! Pacing between categories so the search provider does not start
//! throttling or blocking us.

use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

#[async_trait::async_trait]
pub trait Clock: Send + Sync {
    async fn sleep(&self, duration: Duration);
}

/// Wall-clock sleeping on the tokio timer.
#[derive(Debug, Default, Clone)]
pub struct TokioClock;

#[async_trait::async_trait]
impl Clock for TokioClock {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

#[async_trait::async_trait]
pub trait RateLimiter: Send + Sync {
    /// Called once after each category's downloads complete.
    async fn after_batch(&self, category: &str);
}

/// Waits a fixed interval after every batch.
pub struct FixedPause {
    interval: Duration,
    clock: Arc<dyn Clock>,
}

impl FixedPause {
    pub fn new(interval: Duration, clock: Arc<dyn Clock>) -> Self {
        Self { interval, clock }
    }
}

#[async_trait::async_trait]
impl RateLimiter for FixedPause {
    async fn after_batch(&self, category: &str) {
        if self.interval.is_zero() {
            return;
        }
        debug!(category, secs = self.interval.as_secs_f64(), "pausing before next search");
        self.clock.sleep(self.interval).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingClock {
        slept: Mutex<Vec<Duration>>,
    }

    #[async_trait::async_trait]
    impl Clock for RecordingClock {
        async fn sleep(&self, duration: Duration) {
            self.slept.lock().unwrap().push(duration);
        }
    }

    #[tokio::test]
    async fn fixed_pause_sleeps_once_per_batch() {
        let clock = Arc::new(RecordingClock::default());
        let limiter = FixedPause::new(Duration::from_secs(10), clock.clone());
        limiter.after_batch("bird").await;
        limiter.after_batch("forest").await;
        assert_eq!(
            *clock.slept.lock().unwrap(),
            vec![Duration::from_secs(10), Duration::from_secs(10)]
        );
    }

    #[tokio::test]
    async fn zero_interval_never_touches_clock() {
        let clock = Arc::new(RecordingClock::default());
        let limiter = FixedPause::new(Duration::ZERO, clock.clone());
        limiter.after_batch("bird").await;
        assert!(clock.slept.lock().unwrap().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn tokio_clock_advances_paused_time() {
        let start = tokio::time::Instant::now();
        TokioClock.sleep(Duration::from_secs(10)).await;
        assert!(start.elapsed() >= Duration::from_secs(10));
    }
}
