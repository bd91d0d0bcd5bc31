//! Session store adapters.

mod memory;
mod sqlite;

#[cfg(test)]
mod contract_tests;

pub use memory::MemorySessionStore;
pub use sqlite::{DbPool, SqliteSessionStore};
