//! # API Route Modules
//!
//! - `media` — `GET /media/*path`: on-demand derivation of a source asset
//!   into normalized WebP, raw passthrough, cache headers.
//! - `library` — `GET /media`: JSON listing of the media root for the
//!   photo gallery.

use axum::Router;

use crate::state::AppState;

pub mod library;
pub mod media;

/// Assemble the media service router.
pub fn router() -> Router<AppState> {
    Router::new()
        .merge(library::router())
        .merge(media::router())
}
