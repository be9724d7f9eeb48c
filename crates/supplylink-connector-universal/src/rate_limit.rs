//! Request budgets for vendor APIs.
//!
//! One token bucket per configured window (minute, hour, day). A request
//! waits until every bucket has a token.

use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::{debug, trace};

use supplylink_connector::config::RateLimits;

/// Token bucket refilled continuously over its window.
#[derive(Debug)]
struct TokenBucket {
    window: &'static str,
    tokens: f64,
    capacity: f64,
    /// Tokens per second.
    refill_rate: f64,
    last_refill: Instant,
}

impl TokenBucket {
    fn new(window: &'static str, limit: u32, period: Duration) -> Self {
        let capacity = f64::from(limit);
        Self {
            window,
            tokens: capacity,
            capacity,
            refill_rate: capacity / period.as_secs_f64(),
            last_refill: Instant::now(),
        }
    }

    fn refill(&mut self, now: Instant) {
        let elapsed = now.duration_since(self.last_refill);
        self.tokens = (self.tokens + elapsed.as_secs_f64() * self.refill_rate).min(self.capacity);
        self.last_refill = now;
    }

    /// Time until a token is available, zero if one is available now.
    fn wait_time(&self) -> Duration {
        if self.tokens >= 1.0 {
            Duration::ZERO
        } else {
            Duration::from_secs_f64((1.0 - self.tokens) / self.refill_rate)
        }
    }
}

/// Rate limiter honouring a vendor's [`RateLimits`].
#[derive(Debug)]
pub struct RateLimiter {
    buckets: Mutex<Vec<TokenBucket>>,
}

impl RateLimiter {
    pub fn new(limits: &RateLimits) -> Self {
        let mut buckets = Vec::new();
        for (window, limit, period) in [
            ("minute", limits.requests_per_minute, Duration::from_secs(60)),
            ("hour", limits.requests_per_hour, Duration::from_secs(3_600)),
            ("day", limits.requests_per_day, Duration::from_secs(86_400)),
        ] {
            if let Some(limit) = limit.filter(|l| *l > 0) {
                buckets.push(TokenBucket::new(window, limit, period));
            }
        }
        Self {
            buckets: Mutex::new(buckets),
        }
    }

    /// Limiter that never waits.
    pub fn unlimited() -> Self {
        Self::new(&RateLimits::default())
    }

    pub async fn is_unlimited(&self) -> bool {
        self.buckets.lock().await.is_empty()
    }

    /// Wait for a token in every window, then consume one from each.
    pub async fn acquire(&self) {
        loop {
            let wait = {
                let mut buckets = self.buckets.lock().await;
                let now = Instant::now();
                let mut longest = Duration::ZERO;
                let mut limiting = None;
                for bucket in buckets.iter_mut() {
                    bucket.refill(now);
                    let wait = bucket.wait_time();
                    if wait > longest {
                        longest = wait;
                        limiting = Some(bucket.window);
                    }
                }

                if longest.is_zero() {
                    for bucket in buckets.iter_mut() {
                        bucket.tokens -= 1.0;
                    }
                    trace!("Rate limit token acquired");
                    return;
                }

                debug!(
                    window = limiting.unwrap_or_default(),
                    wait_ms = longest.as_millis() as u64,
                    "Rate limited, waiting for token"
                );
                longest
            };
            tokio::time::sleep(wait).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_unlimited_never_waits() {
        let limiter = RateLimiter::unlimited();
        assert!(limiter.is_unlimited().await);
        for _ in 0..1_000 {
            limiter.acquire().await;
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_per_minute_budget_spaces_requests() {
        let limiter = RateLimiter::new(&RateLimits::per_minute(2));
        let start = Instant::now();

        limiter.acquire().await;
        limiter.acquire().await;
        assert_eq!(start.elapsed(), Duration::ZERO);

        // Third request waits for one token: 60s / 2.
        limiter.acquire().await;
        assert!(start.elapsed() >= Duration::from_secs(30));
        assert!(start.elapsed() < Duration::from_secs(31));
    }

    #[tokio::test(start_paused = true)]
    async fn test_tightest_window_wins() {
        let limits = RateLimits {
            requests_per_minute: Some(100),
            requests_per_hour: Some(1),
            requests_per_day: None,
        };
        let limiter = RateLimiter::new(&limits);
        let start = Instant::now();

        limiter.acquire().await;
        limiter.acquire().await;
        assert!(start.elapsed() >= Duration::from_secs(3_599));
    }
}
