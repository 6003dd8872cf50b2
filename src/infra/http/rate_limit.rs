use dashmap::DashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Sliding-window limiter for contact form submissions, keyed by client address.
#[derive(Debug, Clone)]
pub struct ContactRateLimiter {
    window: Duration,
    max_requests: u32,
    buckets: Arc<DashMap<String, Vec<Instant>>>,
}

/// Outcome of a throttled attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateDecision {
    Allowed { remaining: u32 },
    Limited { retry_after: Duration },
}

impl ContactRateLimiter {
    pub fn new(window: Duration, max_requests: u32) -> Self {
        Self {
            window,
            max_requests,
            buckets: Arc::new(DashMap::new()),
        }
    }

    pub fn check(&self, key: &str) -> RateDecision {
        self.check_at(key, Instant::now())
    }

    fn check_at(&self, key: &str, now: Instant) -> RateDecision {
        let window = self.window;
        let mut entry = self.buckets.entry(key.to_string()).or_default();
        entry.retain(|instant| now.duration_since(*instant) < window);

        let used = u32::try_from(entry.len()).unwrap_or(u32::MAX);
        if used >= self.max_requests {
            let oldest = entry.first().copied().unwrap_or(now);
            let retry_after = window.saturating_sub(now.duration_since(oldest));
            return RateDecision::Limited {
                retry_after: retry_after.max(Duration::from_secs(1)),
            };
        }

        entry.push(now);
        RateDecision::Allowed {
            remaining: self.max_requests - used - 1,
        }
    }

    /// Drop buckets with no attempt inside the window.
    pub fn purge_idle(&self) {
        let now = Instant::now();
        let window = self.window;
        self.buckets.retain(|_, attempts| {
            attempts
                .last()
                .is_some_and(|last| now.duration_since(*last) < window)
        });
    }

    pub fn limit(&self) -> u32 {
        self.max_requests
    }
}
