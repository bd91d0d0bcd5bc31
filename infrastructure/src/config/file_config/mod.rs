//! Raw TOML configuration data types
//!
//! These structs represent the exact structure of the TOML config file.
//! Conversion into application parameters happens here so the application
//! layer never sees file-level concerns.

mod agent;
mod llm;
mod retrieval;
mod server;

pub use agent::{FileAgentConfig, FileLoggingConfig, FileRateLimitConfig};
pub use llm::FileLlmConfig;
pub use retrieval::FileRetrievalConfig;
pub use server::{FileDatabaseConfig, FileServerConfig, IN_MEMORY_DATABASE};

use lattia_application::{AgentParams, RateLimitParams};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

/// A configuration value that cannot be used.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigValidationError {
    #[error("llm.timeout_seconds must be greater than 0")]
    ZeroTimeout,

    #[error("llm.model cannot be empty")]
    EmptyModel,

    #[error("rate_limit.capacity must be greater than 0")]
    ZeroCapacity,

    #[error("rate_limit.refill_per_second must be positive, got {0}")]
    InvalidRefillRate(f64),

    #[error("agent.history_window must be greater than 0")]
    ZeroHistoryWindow,

    #[error("retrieval.top_k must be greater than 0")]
    ZeroTopK,

    #[error("server.bind is not a socket address: {0}")]
    InvalidBind(String),
}

/// Complete file configuration (raw TOML structure)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileConfig {
    pub server: FileServerConfig,
    pub database: FileDatabaseConfig,
    pub llm: FileLlmConfig,
    pub retrieval: FileRetrievalConfig,
    pub agent: FileAgentConfig,
    pub rate_limit: FileRateLimitConfig,
    pub logging: FileLoggingConfig,
}

impl FileConfig {
    /// Validate the entire configuration, returning every problem found.
    pub fn validate(&self) -> Vec<ConfigValidationError> {
        let mut issues = Vec::new();

        if self.llm.timeout_seconds == 0 {
            issues.push(ConfigValidationError::ZeroTimeout);
        }
        if self.llm.model.trim().is_empty() {
            issues.push(ConfigValidationError::EmptyModel);
        }
        if self.rate_limit.capacity == 0 {
            issues.push(ConfigValidationError::ZeroCapacity);
        }
        let rate = self.rate_limit.refill_per_second;
        if rate.is_nan() || rate <= 0.0 {
            issues.push(ConfigValidationError::InvalidRefillRate(
                self.rate_limit.refill_per_second,
            ));
        }
        if self.agent.history_window == 0 {
            issues.push(ConfigValidationError::ZeroHistoryWindow);
        }
        if self.retrieval.top_k == 0 {
            issues.push(ConfigValidationError::ZeroTopK);
        }
        if self.server.bind.parse::<std::net::SocketAddr>().is_err() {
            issues.push(ConfigValidationError::InvalidBind(self.server.bind.clone()));
        }

        issues
    }

    pub fn agent_params(&self) -> AgentParams {
        AgentParams::default()
            .with_history_window(self.agent.history_window)
            .with_top_k(self.retrieval.top_k)
            .with_score_threshold(self.retrieval.score_threshold)
    }

    pub fn rate_limit_params(&self) -> RateLimitParams {
        RateLimitParams::default()
            .with_capacity(self.rate_limit.capacity)
            .with_refill_per_second(self.rate_limit.refill_per_second)
            .with_idle_eviction(Duration::from_secs(self.rate_limit.idle_eviction_seconds))
    }
}
