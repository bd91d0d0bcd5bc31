//! `[agent]`, `[rate_limit]` and `[logging]` sections

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileAgentConfig {
    /// Exchanges of history sent to the oracle (two messages each)
    pub history_window: usize,
}

impl Default for FileAgentConfig {
    fn default() -> Self {
        Self { history_window: 10 }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileRateLimitConfig {
    pub capacity: u32,
    pub refill_per_second: f64,
    pub idle_eviction_seconds: u64,
}

impl Default for FileRateLimitConfig {
    fn default() -> Self {
        Self {
            capacity: 30,
            refill_per_second: 0.5,
            idle_eviction_seconds: 3600,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileLoggingConfig {
    /// JSONL transcript of oracle calls; disabled when unset
    pub conversation_log: Option<PathBuf>,
}
