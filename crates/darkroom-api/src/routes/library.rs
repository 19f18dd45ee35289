//! # Library Listing Endpoint
//!
//! `GET /media` — JSON listing of the supported files at the top of the
//! media root, with pre-built derivation URLs for the gallery grid
//! (thumbnail), the viewer, and the raw original. Layout dimensions are
//! fixed defaults to avoid per-file metadata reads; the client corrects
//! them once the image loads.

use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use serde::{Deserialize, Serialize};

use darkroom_media::listing::{alt_from_filename, list_media_files};

use crate::state::AppState;

/// Bump when the endpoint's output shape or parameters change, to
/// invalidate previously derived artifacts via the `v` token.
pub const API_VERSION: u32 = 5;

/// Grid thumbnails stay small so the page loads quickly.
const THUMB_WIDTH: u32 = 600;

/// Viewer images can be larger, but still bounded.
const VIEWER_WIDTH: u32 = 2400;

// Used purely for layout; avoids expensive per-file metadata reads.
const DEFAULT_WIDTH: u32 = 1600;
const DEFAULT_HEIGHT: u32 = 1200;

/// Percent-encoding set for a single path segment: everything except
/// the characters `encodeURIComponent` leaves intact.
const SEGMENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

pub fn router() -> Router<AppState> {
    Router::new().route("/media", get(list_library))
}

/// One gallery entry.
#[derive(Debug, Serialize, Deserialize)]
pub struct LibraryItem {
    pub id: String,
    pub src: String,
    pub viewer_src: String,
    pub raw_src: String,
    pub width: u32,
    pub height: u32,
    pub alt: String,
}

async fn list_library(State(state): State<AppState>) -> Json<Vec<LibraryItem>> {
    let files = list_media_files(&state.config().media_root).await;
    let items = files
        .into_iter()
        .map(|filename| {
            let base = format!("/media/{}", utf8_percent_encode(&filename, SEGMENT));
            LibraryItem {
                src: format!("{base}?w={THUMB_WIDTH}&v={API_VERSION}"),
                viewer_src: format!("{base}?w={VIEWER_WIDTH}&v={API_VERSION}"),
                raw_src: format!("{base}?raw=1&v={API_VERSION}"),
                width: DEFAULT_WIDTH,
                height: DEFAULT_HEIGHT,
                alt: alt_from_filename(&filename),
                id: filename,
            }
        })
        .collect();
    Json(items)
}
