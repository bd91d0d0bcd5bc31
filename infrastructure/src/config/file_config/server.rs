//! `[server]` and `[database]` sections

use serde::{Deserialize, Serialize};

/// Path value that selects the in-memory store.
pub const IN_MEMORY_DATABASE: &str = ":memory:";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileServerConfig {
    /// Socket address the HTTP API listens on
    pub bind: String,
}

impl Default for FileServerConfig {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1:8000".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileDatabaseConfig {
    /// SQLite file, or `:memory:` for a process-local store
    pub path: String,
}

impl Default for FileDatabaseConfig {
    fn default() -> Self {
        Self {
            path: "lattia.db".to_string(),
        }
    }
}

impl FileDatabaseConfig {
    pub fn is_in_memory(&self) -> bool {
        self.path.trim() == IN_MEMORY_DATABASE
    }
}
