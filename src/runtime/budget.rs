//! # Request Budget
//!
//! Client-side rate budget shared by every request an audit pass makes: a token bucket
//! refilled at `requests_per_second` and holding at most `burst` tokens.

use crate::config::AuditConfig;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;

#[derive(Debug)]
struct Bucket {
    tokens: f64,
    refilled_at: Instant,
}

/// Token bucket limiting outgoing requests
#[derive(Debug)]
pub struct RequestBudget {
    requests_per_second: f64,
    burst: f64,
    bucket: Mutex<Bucket>,
}

impl RequestBudget {
    /// Starts full, so the first `burst` requests go out immediately
    pub fn new(requests_per_second: f64, burst: u32) -> Self {
        let burst = f64::from(burst.max(1));
        Self {
            requests_per_second,
            burst,
            bucket: Mutex::new(Bucket {
                tokens: burst,
                refilled_at: Instant::now(),
            }),
        }
    }

    pub fn from_config(config: &AuditConfig) -> Self {
        Self::new(config.requests_per_second, config.burst)
    }

    /// Wait until one request may be sent
    pub async fn acquire(&self) {
        // Waiters queue on the lock, which keeps hand-out order fair.
        let mut bucket = self.bucket.lock().await;
        self.refill(&mut bucket);

        if bucket.tokens < 1.0 {
            // Tiny rates overflow `Duration`; wait as long as the timer allows instead.
            let wait = Duration::try_from_secs_f64((1.0 - bucket.tokens) / self.requests_per_second)
                .unwrap_or(Duration::MAX);
            tokio::time::sleep(wait).await;
            self.refill(&mut bucket);
        }

        bucket.tokens = (bucket.tokens - 1.0).max(0.0);
    }

    fn refill(&self, bucket: &mut Bucket) {
        let now = Instant::now();
        let elapsed = now.duration_since(bucket.refilled_at).as_secs_f64();
        bucket.tokens = (bucket.tokens + elapsed * self.requests_per_second).min(self.burst);
        bucket.refilled_at = now;
    }
}
