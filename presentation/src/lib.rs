//! Presentation layer for lattia
//!
//! This crate contains the HTTP API, CLI definitions, output formatters,
//! and the interactive chat interface.

pub mod chat;
pub mod cli;
pub mod http;
pub mod output;

// Re-export commonly used types
pub use chat::ChatRepl;
pub use cli::commands::{Cli, Command};
pub use http::{ApiError, AppState, router, serve, spawn_bucket_eviction};
pub use output::console::ConsoleFormatter;
