//! Terminal output formatting.

pub mod console;
