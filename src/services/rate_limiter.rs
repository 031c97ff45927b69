use std::time::Duration;

use tokio::time::{sleep, Instant};

/// Enforces a minimum spacing between upstream requests.
///
/// `wait` blocks until at least `min_interval` has elapsed since the previous
/// call returned; the first call never blocks. Uses the tokio monotonic clock,
/// so wall-clock adjustments cannot shorten or stretch the interval. The
/// caller is single-threaded, so no locking is needed.
#[derive(Debug)]
pub struct RateLimiter {
    min_interval: Duration,
    last_request: Option<Instant>,
}

impl RateLimiter {
    pub fn new(min_interval: Duration) -> Self {
        Self {
            min_interval,
            last_request: None,
        }
    }

    pub async fn wait(&mut self) {
        if let Some(last) = self.last_request {
            let elapsed = last.elapsed();
            if elapsed < self.min_interval {
                sleep(self.min_interval - elapsed).await;
            }
        }
        self.last_request = Some(Instant::now());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_first_wait_does_not_block() {
        let mut limiter = RateLimiter::new(Duration::from_millis(250));
        let start = Instant::now();
        limiter.wait().await;
        assert_eq!(start.elapsed(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn test_consecutive_waits_are_spaced() {
        let mut limiter = RateLimiter::new(Duration::from_millis(250));
        let start = Instant::now();
        limiter.wait().await;
        limiter.wait().await;
        limiter.wait().await;
        assert!(start.elapsed() >= Duration::from_millis(500));
    }

    #[tokio::test(start_paused = true)]
    async fn test_no_wait_after_interval_already_elapsed() {
        let mut limiter = RateLimiter::new(Duration::from_millis(250));
        limiter.wait().await;
        sleep(Duration::from_millis(300)).await;
        let start = Instant::now();
        limiter.wait().await;
        assert_eq!(start.elapsed(), Duration::ZERO);
    }
}
