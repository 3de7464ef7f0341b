use std::time::Duration;
use tokio::time::{Instant, sleep_until};

/// Spaces out requests to the viewer so one session never bursts
pub struct RateLimiter {
    min_interval: Duration,
    last_request: Option<Instant>,
}

impl RateLimiter {
    pub fn new(interval_ms: u64) -> Self {
        Self {
            min_interval: Duration::from_millis(interval_ms),
            last_request: None,
        }
    }

    pub async fn wait(&mut self) {
        if let Some(ready_at) = self.next_slot() {
            sleep_until(ready_at).await;
        }
        self.last_request = Some(Instant::now());
    }

    fn next_slot(&self) -> Option<Instant> {
        let ready_at = self.last_request? + self.min_interval;
        (ready_at > Instant::now()).then_some(ready_at)
    }
}
