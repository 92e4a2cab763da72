//! Route definitions for the panelguard web server

use crate::{handlers, AppState};
use axum::{
    routing::{get, post},
    Router,
};

/// Create API routes
pub fn api_routes() -> Router<AppState> {
    Router::new()
        // Health check
        .route("/health", get(handlers::health_check))
        // Session lifecycle
        .route("/login", post(handlers::login))
        .route("/logout", post(handlers::logout))
        .route("/user", get(handlers::current_user))
        // Resource locks
        .route(
            "/locks/{resource_id}",
            get(handlers::lock_status)
                .post(handlers::acquire_lock)
                .delete(handlers::release_lock),
        )
}
