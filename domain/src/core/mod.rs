//! Errors raised by the field catalog and the stats tracker.

pub mod error;
