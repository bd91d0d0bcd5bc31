//! Route table

use super::handlers::{self, AppState};
use axum::Router;
use axum::routing::{get, patch, post};

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/healthz", get(handlers::healthz))
        .route(
            "/api/profiles",
            get(handlers::list_profiles).post(handlers::create_profile),
        )
        .route(
            "/api/profiles/:id",
            get(handlers::get_profile).delete(handlers::delete_profile),
        )
        .route("/api/profiles/:id/history", get(handlers::history))
        .route("/api/profiles/:id/start", post(handlers::start))
        .route("/api/profiles/:id/messages", post(handlers::post_message))
        .route(
            "/api/profiles/:id/health",
            get(handlers::health_data).put(handlers::update_health_data),
        )
        .route("/api/profiles/:id/state", get(handlers::state))
        .route("/api/profiles/:id/status", patch(handlers::set_status))
        .with_state(state)
}
