//! # Decode/Transform Pipeline
//!
//! Decodes a source image, corrects orientation from embedded EXIF
//! metadata, optionally downscales to a width bound (never enlarging), and
//! re-encodes to WebP at a fixed quality.
//!
//! HEIC/HEIF sources get a layered fallback: the primary decoder may fail
//! anywhere in the decode-resize-encode sequence, so the whole sequence is
//! attempted first; on failure an external transcoder produces an
//! intermediate JPEG and the same sequence is re-run against it. All other
//! formats are single-pass. Exhausted fallbacks surface as
//! [`MediaError::DecodeFailed`] — the caller converts that into a degraded
//! placeholder response, never an error status.
//!
//! Everything here is synchronous CPU work; the HTTP layer runs it on the
//! blocking thread pool.

use std::path::Path;
use std::process::Command;
use std::sync::Arc;

use image::imageops::FilterType;
use image::DynamicImage;

use crate::error::MediaError;
use crate::format::SourceFormat;
use crate::key::ENCODE_QUALITY;

/// JPEG quality for the intermediate produced by the HEIF transcoder.
const TRANSCODE_JPEG_QUALITY: u8 = 92;

/// Produces normalized WebP bytes from a source asset.
///
/// Object-safe so the HTTP layer can hold the pipeline as an explicit,
/// injectable handle (tests wrap it to count or force failures).
pub trait MediaPipeline: Send + Sync {
    /// Derive normalized output bytes for `source`, bounded to `width`
    /// pixels wide when given.
    fn derive(
        &self,
        source: &Path,
        format: SourceFormat,
        width: Option<u32>,
    ) -> Result<Vec<u8>, MediaError>;
}

/// Converts a HEIF-family source into an intermediate widely-supported
/// encoding the primary decoder can handle.
pub trait Transcoder: Send + Sync {
    /// Transcode the source file to JPEG bytes.
    fn to_jpeg(&self, source: &Path) -> Result<Vec<u8>, MediaError>;
}

/// Transcoder that shells out to a `heif-convert`-style external program.
#[derive(Debug, Clone)]
pub struct HeifCliTranscoder {
    program: String,
}

impl HeifCliTranscoder {
    /// Use the named converter program (e.g. `heif-convert`).
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }
}

impl Transcoder for HeifCliTranscoder {
    fn to_jpeg(&self, source: &Path) -> Result<Vec<u8>, MediaError> {
        let out = tempfile::Builder::new()
            .suffix(".jpg")
            .tempfile()
            .map_err(|e| MediaError::DecodeFailed(format!("transcode temp file: {e}")))?;
        let output = Command::new(&self.program)
            .arg("-q")
            .arg(TRANSCODE_JPEG_QUALITY.to_string())
            .arg(source)
            .arg(out.path())
            .output()
            .map_err(|e| {
                MediaError::DecodeFailed(format!("failed to run {}: {e}", self.program))
            })?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(MediaError::DecodeFailed(format!(
                "{} exited with {}: {}",
                self.program,
                output.status,
                stderr.trim()
            )));
        }
        std::fs::read(out.path())
            .map_err(|e| MediaError::DecodeFailed(format!("transcode output unreadable: {e}")))
    }
}

/// The production pipeline: `image` crate decode, EXIF orientation
/// correction, bounded Lanczos downscale, lossy WebP encode.
pub struct ImagePipeline {
    transcoder: Arc<dyn Transcoder>,
}

impl ImagePipeline {
    pub fn new(transcoder: Arc<dyn Transcoder>) -> Self {
        Self { transcoder }
    }

    /// Run the full decode-resize-encode sequence over in-memory bytes.
    fn render(&self, bytes: &[u8], width: Option<u32>) -> Result<Vec<u8>, MediaError> {
        let decoded = image::load_from_memory(bytes)
            .map_err(|e| MediaError::DecodeFailed(e.to_string()))?;
        let upright = apply_orientation(decoded, exif_orientation(bytes));
        let resized = bounded_resize(upright, width);
        encode_webp(&resized)
    }
}

impl MediaPipeline for ImagePipeline {
    fn derive(
        &self,
        source: &Path,
        format: SourceFormat,
        width: Option<u32>,
    ) -> Result<Vec<u8>, MediaError> {
        let bytes = std::fs::read(source)
            .map_err(|e| MediaError::DecodeFailed(format!("source unreadable: {e}")))?;

        match self.render(&bytes, width) {
            Ok(out) => Ok(out),
            Err(primary) if format.is_heif_family() => {
                tracing::debug!(
                    source = %source.display(),
                    error = %primary,
                    "primary decode failed, trying transcode fallback"
                );
                let jpeg = self.transcoder.to_jpeg(source).map_err(|fallback| {
                    MediaError::DecodeFailed(format!("{primary}; fallback: {fallback}"))
                })?;
                self.render(&jpeg, width)
            }
            Err(e) => Err(e),
        }
    }
}

/// Read the EXIF orientation value (1–8) from the source container, if any.
fn exif_orientation(bytes: &[u8]) -> Option<u16> {
    let mut cursor = std::io::Cursor::new(bytes);
    let exif = exif::Reader::new().read_from_container(&mut cursor).ok()?;
    exif.get_field(exif::Tag::Orientation, exif::In::PRIMARY)
        .and_then(|f| f.value.get_uint(0))
        .map(|v| v as u16)
}

/// Rotate/flip so the image displays upright regardless of camera metadata.
fn apply_orientation(img: DynamicImage, orientation: Option<u16>) -> DynamicImage {
    match orientation.unwrap_or(1) {
        2 => img.fliph(),
        3 => img.rotate180(),
        4 => img.flipv(),
        5 => img.rotate90().fliph(),
        6 => img.rotate90(),
        7 => img.rotate270().fliph(),
        8 => img.rotate270(),
        _ => img,
    }
}

/// Proportionally downscale to `width` pixels wide. Never enlarges past the
/// source's native width.
fn bounded_resize(img: DynamicImage, width: Option<u32>) -> DynamicImage {
    match width {
        Some(w) if w < img.width() => img.resize(w, u32::MAX, FilterType::Lanczos3),
        _ => img,
    }
}

/// Encode to lossy WebP at the fixed quality.
fn encode_webp(img: &DynamicImage) -> Result<Vec<u8>, MediaError> {
    let rgba = img.to_rgba8();
    let encoder = webp::Encoder::from_rgba(rgba.as_raw(), rgba.width(), rgba.height());
    Ok(encoder.encode(f32::from(ENCODE_QUALITY)).to_vec())
}
