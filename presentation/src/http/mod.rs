//! HTTP API over the intake service.

pub mod dto;
mod error;
mod handlers;
mod router;
mod server;

pub use error::ApiError;
pub use handlers::AppState;
pub use router::router;
pub use server::{serve, spawn_bucket_eviction};
