// src/services/rate_limit.rs
// DOCUMENTATION: Per-caller rate limiting for booking mutations
// PURPOSE: Keyed token bucket so one client cannot flood the ledger

use crate::errors::BookingError;
use governor::clock::{Clock, DefaultClock};
use governor::{DefaultKeyedRateLimiter, Quota, RateLimiter};
use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Duration;

pub struct BookingRateLimiter {
    limiter: DefaultKeyedRateLimiter<String>,
    per_minute: u32,
}

impl BookingRateLimiter {
    /// `per_minute` of zero is treated as one
    pub fn new(per_minute: u32) -> Self {
        let burst = NonZeroU32::new(per_minute).unwrap_or(NonZeroU32::MIN);
        Self {
            limiter: RateLimiter::keyed(Quota::per_minute(burst)),
            per_minute: burst.get(),
        }
    }

    /// Consume one request for `key`
    /// DOCUMENTATION: On refusal the error carries whole seconds until the
    /// next request would be let through
    pub fn check(&self, key: &str) -> Result<(), BookingError> {
        self.limiter.check_key(&key.to_string()).map_err(|not_until| {
            let wait = not_until.wait_time_from(DefaultClock::default().now());
            let retry_after = retry_after_secs(wait);
            log::warn!(
                "Rate limit of {}/min exceeded for client {} (retry in {}s)",
                self.per_minute,
                key,
                retry_after
            );
            BookingError::RateLimitExceeded { retry_after }
        })
    }

    /// Forget keys whose buckets are full again
    pub fn prune(&self) {
        self.limiter.retain_recent();
        self.limiter.shrink_to_fit();
    }

    pub fn tracked_clients(&self) -> usize {
        self.limiter.len()
    }
}

/// Round a wait up to whole seconds, never below one
fn retry_after_secs(wait: Duration) -> u64 {
    let secs = wait.as_secs() + u64::from(wait.subsec_nanos() > 0);
    secs.max(1)
}

/// Periodically drop idle client buckets
pub fn start_prune_task(limiter: Arc<BookingRateLimiter>, interval_seconds: u64) {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_secs(interval_seconds));

        loop {
            interval.tick().await;
            limiter.prune();
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_limit_is_per_client() {
        let limiter = BookingRateLimiter::new(3);

        for _ in 0..3 {
            assert!(limiter.check("traveler-a").is_ok());
        }
        match limiter.check("traveler-a") {
            // the bucket refills within a minute
            Err(BookingError::RateLimitExceeded { retry_after }) => {
                assert!((1..=60).contains(&retry_after), "retry_after = {}", retry_after)
            }
            other => panic!("expected rate limit error, got {:?}", other),
        }

        // another client has its own bucket
        assert!(limiter.check("traveler-b").is_ok());
        assert_eq!(limiter.tracked_clients(), 2);
    }

    #[test]
    fn test_retry_after_rounds_up() {
        assert_eq!(retry_after_secs(Duration::ZERO), 1);
        assert_eq!(retry_after_secs(Duration::from_millis(1500)), 2);
        assert_eq!(retry_after_secs(Duration::from_secs(20)), 20);
    }

    #[test]
    fn test_zero_quota_still_allows_one() {
        let limiter = BookingRateLimiter::new(0);
        assert!(limiter.check("x").is_ok());
        assert!(limiter.check("x").is_err());
    }
}
