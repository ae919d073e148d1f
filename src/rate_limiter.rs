//! Per-domain token bucket rate limiting: a `DashMap<String, Bucket>` keyed
//! by domain, each bucket's `(tokens, last_refill)` pair guarded by a plain
//! `Mutex` rather than lock-free CAS packing.

use std::sync::Mutex;
use std::time::{Duration, Instant};

use dashmap::DashMap;

struct Bucket {
    tokens: f64,
    last_refill: Instant,
}

/// A token bucket shared across all callers for one crawl.
///
/// `capacity` and refill rate both equal the configured requests-per-second:
/// the bucket starts full and refills continuously at `rate` tokens/second.
pub struct RateLimiter {
    rate: f64,
    capacity: f64,
    buckets: DashMap<String, Mutex<Bucket>>,
}

impl RateLimiter {
    #[must_use]
    pub fn new(requests_per_second: f64) -> Self {
        Self {
            rate: requests_per_second.max(0.001),
            capacity: requests_per_second.max(1.0),
            buckets: DashMap::new(),
        }
    }

    /// Acquire one token for `domain`, returning how long the caller must
    /// wait before proceeding (zero if a token was immediately available).
    /// Always decrements the bucket, even when the wait is nonzero, so a
    /// burst of concurrent callers drains the bucket deterministically
    /// rather than all computing the same wait and all proceeding at once.
    pub fn acquire(&self, domain: &str) -> Duration {
        let entry = self
            .buckets
            .entry(domain.to_string())
            .or_insert_with(|| {
                Mutex::new(Bucket {
                    tokens: self.capacity,
                    last_refill: Instant::now(),
                })
            });
        let mut bucket = entry.lock().unwrap_or_else(std::sync::PoisonError::into_inner);

        let now = Instant::now();
        let elapsed = now.saturating_duration_since(bucket.last_refill).as_secs_f64();
        bucket.tokens = (bucket.tokens + elapsed * self.rate).min(self.capacity);
        bucket.last_refill = now;

        if bucket.tokens >= 1.0 {
            bucket.tokens -= 1.0;
            return Duration::ZERO;
        }

        let deficit = 1.0 - bucket.tokens;
        let wait = Duration::from_secs_f64(deficit / self.rate);
        bucket.tokens = 0.0;
        wait
    }

    /// Wait out the acquire delay for `domain`. Convenience wrapper for
    /// callers inside an async task.
    pub async fn acquire_and_wait(&self, domain: &str) {
        let wait = self.acquire(domain);
        if !wait.is_zero() {
            tokio::time::sleep(wait).await;
        }
    }
}
