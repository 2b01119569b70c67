use crate::handlers;
use crate::state::AppState;
use axum::{routing::get, Router};

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::index))
        .route("/api/analyze", get(handlers::analyze))
        .route("/api/health", get(handlers::health))
        .with_state(state)
}
