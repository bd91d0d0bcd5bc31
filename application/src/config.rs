//! Application-level configuration.
//!
//! Runtime parameters that control how use cases behave:
//!
//! - [`AgentParams`]: history window and exemplar retrieval
//! - [`RateLimitParams`]: per-session token bucket and idle eviction

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Agent orchestrator parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentParams {
    /// Number of most recent user/assistant exchanges sent to the oracle.
    pub history_window: usize,
    /// Exemplars requested per retrieval query.
    pub top_k: usize,
    /// Minimum similarity score for an exemplar.
    pub score_threshold: Option<f32>,
}

impl Default for AgentParams {
    fn default() -> Self {
        Self {
            history_window: 10,
            top_k: 5,
            score_threshold: Some(0.3),
        }
    }
}

impl AgentParams {
    // ==================== Builder Methods ====================

    pub fn with_history_window(mut self, exchanges: usize) -> Self {
        self.history_window = exchanges;
        self
    }

    pub fn with_top_k(mut self, top_k: usize) -> Self {
        self.top_k = top_k;
        self
    }

    pub fn with_score_threshold(mut self, threshold: Option<f32>) -> Self {
        self.score_threshold = threshold;
        self
    }
}

/// Token-bucket parameters, applied per session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateLimitParams {
    pub capacity: u32,
    pub refill_per_second: f64,
    /// Buckets untouched for this long are dropped.
    pub idle_eviction: Duration,
}

impl Default for RateLimitParams {
    fn default() -> Self {
        Self {
            capacity: 30,
            refill_per_second: 30.0 / 60.0,
            idle_eviction: Duration::from_secs(3600),
        }
    }
}

impl RateLimitParams {
    pub fn with_capacity(mut self, capacity: u32) -> Self {
        self.capacity = capacity;
        self
    }

    pub fn with_refill_per_second(mut self, rate: f64) -> Self {
        self.refill_per_second = rate;
        self
    }

    pub fn with_idle_eviction(mut self, idle: Duration) -> Self {
        self.idle_eviction = idle;
        self
    }
}
