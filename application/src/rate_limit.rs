//! Per-session token-bucket rate limiting.
//!
//! [`RateLimiterRegistry`] is created once at startup and shared by every
//! request handler. Buckets are created lazily on first use and dropped by
//! [`RateLimiterRegistry::evict_idle`] once a session goes quiet.

use crate::config::RateLimitParams;
use crate::ports::session_store::ProfileId;
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};
use tracing::debug;

/// A token bucket with continuous refill.
#[derive(Debug, Clone)]
pub struct TokenBucket {
    capacity: f64,
    refill_per_second: f64,
    tokens: f64,
    last_refill: Instant,
}

impl TokenBucket {
    /// A full bucket.
    pub fn new(capacity: u32, refill_per_second: f64, now: Instant) -> Self {
        Self {
            capacity: f64::from(capacity),
            refill_per_second,
            tokens: f64::from(capacity),
            last_refill: now,
        }
    }

    /// Take one token if available.
    pub fn try_acquire_at(&mut self, now: Instant) -> bool {
        self.refill(now);
        if self.tokens >= 1.0 {
            self.tokens -= 1.0;
            true
        } else {
            false
        }
    }

    pub fn available(&self) -> f64 {
        self.tokens
    }

    pub fn last_refill(&self) -> Instant {
        self.last_refill
    }

    fn refill(&mut self, now: Instant) {
        let elapsed = now.saturating_duration_since(self.last_refill).as_secs_f64();
        self.tokens = (self.tokens + elapsed * self.refill_per_second).min(self.capacity);
        self.last_refill = now;
    }
}

/// Registry of buckets keyed by session.
pub struct RateLimiterRegistry {
    params: RateLimitParams,
    buckets: Mutex<HashMap<ProfileId, TokenBucket>>,
}

impl RateLimiterRegistry {
    pub fn new(params: RateLimitParams) -> Self {
        Self {
            params,
            buckets: Mutex::new(HashMap::new()),
        }
    }

    pub fn params(&self) -> &RateLimitParams {
        &self.params
    }

    pub fn try_acquire(&self, id: ProfileId) -> bool {
        self.try_acquire_at(id, Instant::now())
    }

    pub fn try_acquire_at(&self, id: ProfileId, now: Instant) -> bool {
        let mut buckets = self.buckets.lock().unwrap_or_else(|e| e.into_inner());
        buckets
            .entry(id)
            .or_insert_with(|| {
                TokenBucket::new(self.params.capacity, self.params.refill_per_second, now)
            })
            .try_acquire_at(now)
    }

    /// Drop buckets last used more than `max_idle` ago. Returns how many
    /// were removed.
    pub fn evict_idle(&self, max_idle: Duration) -> usize {
        self.evict_idle_at(Instant::now(), max_idle)
    }

    pub fn evict_idle_at(&self, now: Instant, max_idle: Duration) -> usize {
        let mut buckets = self.buckets.lock().unwrap_or_else(|e| e.into_inner());
        let before = buckets.len();
        buckets.retain(|_, bucket| now.saturating_duration_since(bucket.last_refill()) <= max_idle);
        let evicted = before - buckets.len();
        if evicted > 0 {
            debug!("Evicted {} idle rate-limit buckets", evicted);
        }
        evicted
    }

    /// Drop the bucket of a deleted session.
    pub fn forget(&self, id: ProfileId) {
        self.buckets
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .remove(&id);
    }

    pub fn len(&self) -> usize {
        self.buckets.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for RateLimiterRegistry {
    fn default() -> Self {
        Self::new(RateLimitParams::default())
    }
}
