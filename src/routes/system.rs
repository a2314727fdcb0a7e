use crate::AppState;
use axum::{Router, routing::get};

pub fn system_routes() -> Router<AppState> {
    // GET /health
    // Used by monitoring and load balancers; always "ok" while the process serves.
    Router::new().route("/health", get(|| async { "ok" }))
}
