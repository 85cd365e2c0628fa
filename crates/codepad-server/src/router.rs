//! Axum router construction for the Codepad API.

use std::sync::Arc;

use axum::Router;
use axum::routing::get;
use codepad_db::DocumentStore;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::handlers;
use crate::state::AppState;

/// Build the complete Axum router.
///
/// The router includes:
/// - `GET /health` -- liveness probe
/// - `GET /api/meetings/{id}/state` -- latest editor snapshot
/// - `POST /api/meetings/{id}/state` -- append an editor snapshot
///
/// CORS allows any origin so the browser editor can be served from a
/// different host than the API.
pub fn build_router<S: DocumentStore>(state: Arc<AppState<S>>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(handlers::health))
        .route(
            "/api/meetings/{id}/state",
            get(handlers::get_latest_state::<S>).post(handlers::save_state::<S>),
        )
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
