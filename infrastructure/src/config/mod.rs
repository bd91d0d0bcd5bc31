//! Configuration file loading for lattia
//!
//! This module handles file I/O and merging of configuration from multiple sources.
//! The priority order (highest to lowest):
//!
//! 1. `--config <path>` specified file
//! 2. Project root: `./lattia.toml` or `./.lattia.toml`
//! 3. Global: `$XDG_CONFIG_HOME/lattia/config.toml`
//! 4. `LATTIA_` environment variables
//! 5. Default values

mod file_config;
mod loader;

pub use file_config::{
    ConfigValidationError, FileAgentConfig, FileConfig, FileDatabaseConfig, FileLlmConfig,
    FileLoggingConfig, FileRateLimitConfig, FileRetrievalConfig, FileServerConfig,
    IN_MEMORY_DATABASE,
};
pub use loader::ConfigLoader;
