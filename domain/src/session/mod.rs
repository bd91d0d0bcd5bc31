//! Conversation session domain.
//!
//! - [`entities::Message`]: a single message within a session
//! - [`entities::history_window`]: bounded view of recent exchanges

pub mod entities;
