//! # Media Derivation Endpoint
//!
//! `GET /media/*path?raw=<0|1>&v=<token>&w=<int>`
//!
//! Control flow: format gate and path confinement reject early (400), a
//! missing source is 404, raw and animated sources pass through unmodified,
//! and everything else goes read-through the artifact store — derive on
//! miss, best-effort write-through, degraded SVG placeholder if decoding is
//! impossible. Every 200 carries an immutable cache-control directive:
//! content addressing guarantees the same URL never resolves to different
//! bytes (a source change rotates the cache key via its mtime, not the
//! bytes behind an existing key).

use std::time::UNIX_EPOCH;

use axum::extract::{Path, Query, State};
use axum::http::header;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::Router;
use serde::Deserialize;

use darkroom_media::placeholder::PLACEHOLDER_CONTENT_TYPE;
use darkroom_media::{clamp_width, path, placeholder_svg, CacheKey, SourceFormat};

use crate::error::ApiError;
use crate::state::AppState;

/// Cache policy for every successful response, placeholder included.
pub const CACHE_CONTROL_IMMUTABLE: &str =
    "public, max-age=31536000, s-maxage=31536000, immutable";

/// Content type of normalized derived output.
const WEBP_CONTENT_TYPE: &str = "image/webp";

pub fn router() -> Router<AppState> {
    Router::new().route("/media/*path", get(serve_media))
}

/// Query parameters of a derivation request.
#[derive(Debug, Deserialize)]
pub struct MediaQuery {
    /// `"1"` forces byte-identical passthrough of the source file.
    #[serde(default)]
    raw: Option<String>,
    /// Opaque cache-busting token; any string, including empty.
    #[serde(default)]
    v: Option<String>,
    /// Desired width in pixels; clamped to the supported range. Absent or
    /// non-numeric means original size.
    #[serde(default)]
    w: Option<String>,
}

/// Parse and clamp the width parameter: any finite number is rounded then
/// clamped, anything else means no resize.
fn parse_width(raw: Option<&str>) -> Option<u32> {
    let parsed: f64 = raw?.trim().parse().ok()?;
    if !parsed.is_finite() {
        return None;
    }
    Some(clamp_width(parsed.round() as i64))
}

async fn serve_media(
    State(state): State<AppState>,
    Path(rel): Path<String>,
    Query(query): Query<MediaQuery>,
) -> Response {
    // Format gate runs before any filesystem access.
    let format = match SourceFormat::from_rel_path(&rel) {
        Ok(format) => format,
        Err(_) => return ApiError::UnsupportedFormat.into_response(),
    };

    let source = match path::resolve_under(&state.config().media_root, &rel) {
        Ok(source) => source,
        Err(_) => return ApiError::InvalidPath.into_response(),
    };

    // Missing source is a client error; mtime doubles as the cache
    // invalidation signal.
    let mtime_ms = match tokio::fs::metadata(&source).await {
        Ok(meta) => meta
            .modified()
            .ok()
            .and_then(|t| t.duration_since(UNIX_EPOCH).ok())
            .map(|d| d.as_millis())
            .unwrap_or(0),
        Err(_) => return ApiError::NotFound.into_response(),
    };

    // Raw requests and natively animated formats bypass the pipeline.
    if query.raw.as_deref() == Some("1") || format.is_animated() {
        return match tokio::fs::read(&source).await {
            Ok(bytes) => cached_response(format.content_type(), bytes),
            Err(_) => ApiError::NotFound.into_response(),
        };
    }

    let width = parse_width(query.w.as_deref());
    let version = query.v.as_deref().unwrap_or("");
    let key = CacheKey::derive(&rel, width, version, mtime_ms);

    if let Some(bytes) = state.store().lookup(&key).await {
        return cached_response(WEBP_CONTENT_TYPE, bytes);
    }

    // Single-flight: one task derives, concurrent siblings wait and then
    // re-check the store. The gate entry is released on every exit path,
    // including the post-lock cache hit, so the in-flight map never grows.
    let gate = state.inflight_gate(key.as_hex());
    let response = {
        let _guard = gate.lock().await;
        match state.store().lookup(&key).await {
            Some(bytes) => cached_response(WEBP_CONTENT_TYPE, bytes),
            None => {
                let pipeline = state.pipeline();
                let blocking_source = source.clone();
                let derived = tokio::task::spawn_blocking(move || {
                    pipeline.derive(&blocking_source, format, width)
                })
                .await;

                match derived {
                    Ok(Ok(bytes)) => {
                        // Best-effort write-through; the response never
                        // depends on it.
                        let _ = state.store().store(&key, &bytes).await;
                        cached_response(WEBP_CONTENT_TYPE, bytes)
                    }
                    Ok(Err(e)) => {
                        tracing::warn!(path = %rel, error = %e, "derivation failed, serving placeholder");
                        placeholder_response(&rel)
                    }
                    Err(e) => {
                        tracing::error!(path = %rel, error = %e, "derivation task panicked, serving placeholder");
                        placeholder_response(&rel)
                    }
                }
            }
        }
    };
    state.release_gate(key.as_hex());
    response
}

/// A 200 with immutable cache headers.
fn cached_response(content_type: &'static str, bytes: Vec<u8>) -> Response {
    (
        [
            (header::CONTENT_TYPE, content_type),
            (header::CACHE_CONTROL, CACHE_CONTROL_IMMUTABLE),
        ],
        bytes,
    )
        .into_response()
}

/// Degraded output: a labeled SVG, never cached to disk.
fn placeholder_response(rel: &str) -> Response {
    let filename = rel.rsplit('/').next().unwrap_or(rel);
    (
        [
            (header::CONTENT_TYPE, PLACEHOLDER_CONTENT_TYPE),
            (header::CACHE_CONTROL, CACHE_CONTROL_IMMUTABLE),
        ],
        placeholder_svg(filename),
    )
        .into_response()
}
