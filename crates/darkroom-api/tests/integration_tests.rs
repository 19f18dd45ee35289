//! # Integration Tests for darkroom-api
//!
//! Drives the assembled router with `tower::ServiceExt::oneshot`: early
//! rejection (format gate, path confinement), raw passthrough, derivation
//! and caching behavior including mtime invalidation, width clamping,
//! graceful degradation, and the library listing.

use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, SystemTime};

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use http_body_util::BodyExt;
use image::{DynamicImage, ImageFormat, RgbaImage};
use tower::ServiceExt;

use darkroom_api::config::AppConfig;
use darkroom_api::state::AppState;
use darkroom_media::{ImagePipeline, MediaError, MediaPipeline, SourceFormat, Transcoder};

/// Transcoder that fails without panicking; non-heif tests never reach it.
struct UnavailableTranscoder;
impl Transcoder for UnavailableTranscoder {
    fn to_jpeg(&self, _source: &Path) -> Result<Vec<u8>, MediaError> {
        Err(MediaError::DecodeFailed("converter unavailable".into()))
    }
}

/// Wraps the real pipeline and counts derivation calls, for the cache-hit
/// and invalidation assertions. An optional delay keeps a derivation
/// in flight long enough for concurrent requests to pile up behind it.
struct CountingPipeline {
    inner: ImagePipeline,
    calls: Arc<AtomicUsize>,
    delay: Duration,
}

impl MediaPipeline for CountingPipeline {
    fn derive(
        &self,
        source: &Path,
        format: SourceFormat,
        width: Option<u32>,
    ) -> Result<Vec<u8>, MediaError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if !self.delay.is_zero() {
            // Runs on the blocking pool, so this never stalls the runtime.
            std::thread::sleep(self.delay);
        }
        self.inner.derive(source, format, width)
    }
}

struct TestApp {
    app: axum::Router,
    state: AppState,
    media_dir: tempfile::TempDir,
    cache_dir: tempfile::TempDir,
    decode_calls: Arc<AtomicUsize>,
}

impl TestApp {
    fn new() -> Self {
        Self::with_derivation_delay(Duration::ZERO)
    }

    fn with_derivation_delay(delay: Duration) -> Self {
        let media_dir = tempfile::tempdir().unwrap();
        let cache_dir = tempfile::tempdir().unwrap();
        let config = AppConfig {
            port: 0,
            media_root: media_dir.path().to_path_buf(),
            cache_root: cache_dir.path().to_path_buf(),
            heif_converter: "heif-convert".to_string(),
        };
        let decode_calls = Arc::new(AtomicUsize::new(0));
        let pipeline = Arc::new(CountingPipeline {
            inner: ImagePipeline::new(Arc::new(UnavailableTranscoder)),
            calls: decode_calls.clone(),
            delay,
        });
        let state = AppState::with_pipeline(config, pipeline);
        Self {
            app: darkroom_api::app(state.clone()),
            state,
            media_dir,
            cache_dir,
            decode_calls,
        }
    }

    fn write_source(&self, name: &str, bytes: &[u8]) -> std::path::PathBuf {
        let path = self.media_dir.path().join(name);
        std::fs::write(&path, bytes).unwrap();
        path
    }

    async fn get(&self, uri: &str) -> axum::http::Response<Body> {
        self.app
            .clone()
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap()
    }

    fn cached_artifacts(&self) -> usize {
        std::fs::read_dir(self.cache_dir.path())
            .map(|entries| entries.count())
            .unwrap_or(0)
    }
}

fn png_bytes(width: u32, height: u32) -> Vec<u8> {
    let img = RgbaImage::from_pixel(width, height, image::Rgba([64, 96, 128, 255]));
    let mut buf = std::io::Cursor::new(Vec::new());
    DynamicImage::ImageRgba8(img)
        .write_to(&mut buf, ImageFormat::Png)
        .unwrap();
    buf.into_inner()
}

async fn body_bytes(response: axum::http::Response<Body>) -> Vec<u8> {
    response
        .into_body()
        .collect()
        .await
        .unwrap()
        .to_bytes()
        .to_vec()
}

fn content_type(response: &axum::http::Response<Body>) -> String {
    response
        .headers()
        .get(header::CONTENT_TYPE)
        .unwrap()
        .to_str()
        .unwrap()
        .to_string()
}

// -- Health Probes ------------------------------------------------------------

#[tokio::test]
async fn test_liveness_probe() {
    let t = TestApp::new();
    let response = t.get("/health/liveness").await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_bytes(response).await, b"ok");
}

#[tokio::test]
async fn test_readiness_probe() {
    let t = TestApp::new();
    let response = t.get("/health/readiness").await;
    assert_eq!(response.status(), StatusCode::OK);
}

// -- Early Rejection ----------------------------------------------------------

#[tokio::test]
async fn test_unsupported_extension_rejected_before_filesystem() {
    // Media root deliberately does not exist: a 400 (not 404) proves the
    // format gate runs before any filesystem access.
    let config = AppConfig {
        port: 0,
        media_root: "/nonexistent/darkroom/media".into(),
        cache_root: "/nonexistent/darkroom/cache".into(),
        heif_converter: "heif-convert".to_string(),
    };
    let app = darkroom_api::app(AppState::new(config));
    let response = app
        .oneshot(
            Request::builder()
                .uri("/media/foo.bmp")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = String::from_utf8(body_bytes(response).await).unwrap();
    assert!(body.contains("UNSUPPORTED_FORMAT"));
}

#[tokio::test]
async fn test_traversal_rejected_for_any_extension() {
    let t = TestApp::new();
    for uri in [
        "/media/..%2Fsecret.jpg",
        "/media/trip/..%2F..%2F..%2Fetc%2Fpasswd.png",
        "/media/..%2F..%2Fx.webp",
    ] {
        let response = t.get(uri).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "uri: {uri}");
        let body = String::from_utf8(body_bytes(response).await).unwrap();
        assert!(body.contains("INVALID_PATH"), "uri: {uri}");
    }
}

#[tokio::test]
async fn test_missing_source_is_404() {
    let t = TestApp::new();
    let response = t.get("/media/nope.jpg").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

// -- Raw Passthrough ----------------------------------------------------------

#[tokio::test]
async fn test_raw_passthrough_is_byte_identical_and_ignores_width() {
    let t = TestApp::new();
    let source = png_bytes(320, 240);
    t.write_source("photo.png", &source);

    let response = t.get("/media/photo.png?raw=1&w=600").await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(content_type(&response), "image/png");
    assert!(response
        .headers()
        .get(header::CACHE_CONTROL)
        .unwrap()
        .to_str()
        .unwrap()
        .contains("immutable"));
    assert_eq!(body_bytes(response).await, source);
    assert_eq!(t.decode_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_gif_bypasses_pipeline_without_raw_flag() {
    let t = TestApp::new();
    let source = b"GIF89a fake animation data".to_vec();
    t.write_source("anim.gif", &source);

    let response = t.get("/media/anim.gif?w=600").await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(content_type(&response), "image/gif");
    assert_eq!(body_bytes(response).await, source);
    assert_eq!(t.decode_calls.load(Ordering::SeqCst), 0);
}

// -- Derivation and Caching ---------------------------------------------------

#[tokio::test]
async fn test_derives_webp_and_serves_cache_on_repeat() {
    let t = TestApp::new();
    let path = t.write_source("trip-photo.jpg", &{
        let img = RgbaImage::from_pixel(800, 600, image::Rgba([10, 20, 30, 255]));
        let mut buf = std::io::Cursor::new(Vec::new());
        DynamicImage::ImageRgba8(img)
            .to_rgb8()
            .write_to(&mut buf, ImageFormat::Jpeg)
            .unwrap();
        buf.into_inner()
    });

    // First request computes and caches.
    let response = t.get("/media/trip-photo.jpg?w=600&v=3").await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(content_type(&response), "image/webp");
    let first = body_bytes(response).await;
    let decoded = image::load_from_memory(&first).unwrap();
    assert_eq!(decoded.width(), 600);
    assert_eq!(t.decode_calls.load(Ordering::SeqCst), 1);
    assert_eq!(t.cached_artifacts(), 1);

    // Identical request served from cache, pipeline untouched.
    let response = t.get("/media/trip-photo.jpg?w=600&v=3").await;
    let second = body_bytes(response).await;
    assert_eq!(first, second);
    assert_eq!(t.decode_calls.load(Ordering::SeqCst), 1);

    // Touching the source mtime invalidates and forces re-derivation.
    let file = std::fs::OpenOptions::new().write(true).open(&path).unwrap();
    file.set_modified(SystemTime::now() + Duration::from_secs(5))
        .unwrap();
    let response = t.get("/media/trip-photo.jpg?w=600&v=3").await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(t.decode_calls.load(Ordering::SeqCst), 2);
    assert_eq!(t.cached_artifacts(), 2);
}

#[tokio::test]
async fn test_concurrent_requests_share_one_derivation() {
    // Hold the first derivation in flight long enough that every other
    // request lines up behind the same gate instead of decoding again.
    let t = TestApp::with_derivation_delay(Duration::from_millis(150));
    t.write_source("a.png", &png_bytes(640, 480));

    let mut tasks = tokio::task::JoinSet::new();
    for _ in 0..8 {
        let app = t.app.clone();
        tasks.spawn(async move {
            let response = app
                .oneshot(
                    Request::builder()
                        .uri("/media/a.png?w=300")
                        .body(Body::empty())
                        .unwrap(),
                )
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::OK);
            body_bytes(response).await
        });
    }
    let mut bodies = Vec::new();
    while let Some(result) = tasks.join_next().await {
        bodies.push(result.unwrap());
    }

    assert_eq!(bodies.len(), 8);
    assert!(bodies.windows(2).all(|pair| pair[0] == pair[1]));
    assert_eq!(t.decode_calls.load(Ordering::SeqCst), 1);
    assert_eq!(t.cached_artifacts(), 1);
    // Every exit path releases its gate, including the waiters that found
    // the artifact already cached after acquiring the lock.
    assert_eq!(t.state.inflight_len(), 0);
}

#[tokio::test]
async fn test_inflight_gates_drain_after_each_request() {
    let t = TestApp::new();
    t.write_source("a.png", &png_bytes(640, 480));

    // Miss then derive.
    t.get("/media/a.png?w=300").await;
    assert_eq!(t.state.inflight_len(), 0);

    // Cache hit.
    t.get("/media/a.png?w=300").await;
    assert_eq!(t.state.inflight_len(), 0);

    // Degraded placeholder path.
    t.write_source("broken.jpg", b"truncated garbage");
    t.get("/media/broken.jpg?w=300").await;
    assert_eq!(t.state.inflight_len(), 0);
}

#[tokio::test]
async fn test_version_token_rotates_cache_key() {
    let t = TestApp::new();
    t.write_source("a.png", &png_bytes(640, 480));

    t.get("/media/a.png?w=300&v=1").await;
    t.get("/media/a.png?w=300&v=2").await;
    assert_eq!(t.decode_calls.load(Ordering::SeqCst), 2);
    assert_eq!(t.cached_artifacts(), 2);
}

#[tokio::test]
async fn test_width_clamping_collapses_cache_entries() {
    let t = TestApp::new();
    t.write_source("a.png", &png_bytes(800, 400));

    // w=50 clamps to 200: identical cache key, second request is a hit.
    let low = body_bytes(t.get("/media/a.png?w=50").await).await;
    let min = body_bytes(t.get("/media/a.png?w=200").await).await;
    assert_eq!(low, min);
    assert_eq!(t.decode_calls.load(Ordering::SeqCst), 1);
    assert_eq!(image::load_from_memory(&low).unwrap().width(), 200);

    // w=5000 clamps to 2400; the 800px source is never enlarged.
    let high = body_bytes(t.get("/media/a.png?w=5000").await).await;
    let max = body_bytes(t.get("/media/a.png?w=2400").await).await;
    assert_eq!(high, max);
    assert_eq!(image::load_from_memory(&high).unwrap().width(), 800);
}

#[tokio::test]
async fn test_non_numeric_width_means_original_size() {
    let t = TestApp::new();
    t.write_source("a.png", &png_bytes(640, 480));

    let with_junk = body_bytes(t.get("/media/a.png?w=abc").await).await;
    let without = body_bytes(t.get("/media/a.png").await).await;
    assert_eq!(with_junk, without);
    assert_eq!(t.decode_calls.load(Ordering::SeqCst), 1);
    assert_eq!(image::load_from_memory(&with_junk).unwrap().width(), 640);
}

// -- Graceful Degradation -----------------------------------------------------

#[tokio::test]
async fn test_corrupt_source_degrades_to_placeholder() {
    let t = TestApp::new();
    t.write_source("broken & <old>.jpg", b"truncated garbage");

    let response = t.get("/media/broken%20%26%20%3Cold%3E.jpg?w=600").await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(content_type(&response), "image/svg+xml; charset=utf-8");
    let body = String::from_utf8(body_bytes(response).await).unwrap();
    assert!(body.starts_with("<svg"));
    assert!(body.contains("broken &amp; &lt;old&gt;.jpg"));
    // The placeholder is never written to the artifact store.
    assert_eq!(t.cached_artifacts(), 0);
}

#[tokio::test]
async fn test_heic_with_unavailable_converter_degrades_to_placeholder() {
    let t = TestApp::new();
    t.write_source("shot.heic", b"opaque heic container");

    let response = t.get("/media/shot.heic?w=600").await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(content_type(&response), "image/svg+xml; charset=utf-8");
    let body = String::from_utf8(body_bytes(response).await).unwrap();
    assert!(body.contains("shot.heic"));
}

// -- Library Listing ----------------------------------------------------------

#[tokio::test]
async fn test_library_lists_supported_files_sorted() {
    let t = TestApp::new();
    t.write_source("b-dusk.png", &png_bytes(8, 8));
    t.write_source("a-dawn.jpg", &png_bytes(8, 8));
    t.write_source("notes.txt", b"not a photo");

    let response = t.get("/media").await;
    assert_eq!(response.status(), StatusCode::OK);
    let items: Vec<serde_json::Value> =
        serde_json::from_slice(&body_bytes(response).await).unwrap();
    assert_eq!(items.len(), 2);
    assert_eq!(items[0]["id"], "a-dawn.jpg");
    assert_eq!(items[1]["id"], "b-dusk.png");
    assert_eq!(items[0]["alt"], "a dawn");
    let src = items[0]["src"].as_str().unwrap();
    assert!(src.starts_with("/media/a-dawn.jpg?w=600&v="));
    let raw = items[0]["raw_src"].as_str().unwrap();
    assert!(raw.contains("raw=1"));
}

#[tokio::test]
async fn test_library_is_empty_for_empty_root() {
    let t = TestApp::new();
    let response = t.get("/media").await;
    assert_eq!(response.status(), StatusCode::OK);
    let items: Vec<serde_json::Value> =
        serde_json::from_slice(&body_bytes(response).await).unwrap();
    assert!(items.is_empty());
}
