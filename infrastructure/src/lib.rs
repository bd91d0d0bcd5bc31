//! Infrastructure layer for lattia
//!
//! This crate contains adapters that implement the ports defined
//! in the application layer, including configuration file loading.

pub mod config;
pub mod llm;
pub mod logging;
pub mod pii;
pub mod retrieval;
pub mod storage;

// Re-export commonly used types
pub use config::{
    ConfigLoader, ConfigValidationError, FileAgentConfig, FileConfig, FileDatabaseConfig,
    FileLlmConfig, FileLoggingConfig, FileRateLimitConfig, FileRetrievalConfig, FileServerConfig,
};
pub use llm::OpenAiGateway;
pub use logging::JsonlConversationLogger;
pub use pii::RegexPiiDetector;
pub use retrieval::QdrantRetriever;
pub use storage::{MemorySessionStore, SqliteSessionStore};
