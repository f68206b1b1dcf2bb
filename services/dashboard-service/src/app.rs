use axum::{routing::get, Router};
use tower_http::trace::TraceLayer;

use crate::handlers::{appliances, healthz, index, readyz, stream};
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/healthz", get(healthz))
        .route("/readyz", get(readyz))
        .route("/api/appliances", get(appliances))
        .route("/stream", get(stream))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
