//! # darkroom-api — HTTP Boundary for the Media Service
//!
//! ## API Surface
//!
//! | Route                | Module             | Behavior                         |
//! |----------------------|--------------------|----------------------------------|
//! | `GET /media/*path`   | [`routes::media`]  | On-demand derivation + caching   |
//! | `GET /media`         | [`routes::library`]| Gallery listing (JSON)           |
//! | `GET /health/*`      | here               | Liveness/readiness probes        |
//!
//! The health probes are mounted alongside the media routes; there is no
//! authentication — the service fronts public photos.

pub mod config;
pub mod error;
pub mod routes;
pub mod state;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::Router;
use tower_http::trace::TraceLayer;

use crate::state::AppState;

/// Assemble the full application router.
pub fn app(state: AppState) -> Router {
    Router::new()
        .route("/health/liveness", get(liveness))
        .route("/health/readiness", get(readiness))
        .merge(routes::router())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Liveness probe — always returns 200 if the process is running.
async fn liveness() -> &'static str {
    "ok"
}

/// Readiness probe — verifies the media root is present. The cache root is
/// not checked: it is created on demand and the service degrades gracefully
/// without it.
async fn readiness(State(state): State<AppState>) -> impl IntoResponse {
    match tokio::fs::metadata(&state.config().media_root).await {
        Ok(meta) if meta.is_dir() => (StatusCode::OK, "ready").into_response(),
        _ => {
            tracing::warn!(
                root = %state.config().media_root.display(),
                "media root unavailable"
            );
            (StatusCode::SERVICE_UNAVAILABLE, "media root unavailable").into_response()
        }
    }
}
