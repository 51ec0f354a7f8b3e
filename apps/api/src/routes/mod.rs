pub mod health;

use axum::{
    routing::{get, post},
    Router,
};

use crate::optimize::handlers;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Optimization API
        .route(
            "/api/v1/optimize/cycle",
            post(handlers::handle_run_cycle),
        )
        .route(
            "/api/v1/optimize/options",
            post(handlers::handle_generate_options),
        )
        .route(
            "/api/v1/optimize/apply-option",
            post(handlers::handle_apply_option),
        )
        .route(
            "/api/v1/optimize/history/:session_id",
            get(handlers::handle_get_history),
        )
        .with_state(state)
}
