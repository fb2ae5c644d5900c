//! Router

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::handlers::{asset_view, combined, health_check, refresh, what_if_view};
use crate::state::AppState;

pub fn app_router(state: AppState) -> Router {
    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        // Health & info
        .route("/health", get(health_check))

        // Valuations
        .route("/api/treasury/{asset}", get(asset_view))
        .route("/api/combined", get(combined))
        .route("/api/what-if", post(what_if_view))

        // Cache control
        .route("/api/refresh", post(refresh))

        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
