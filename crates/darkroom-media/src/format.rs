//! # Format Gate
//!
//! Fixed whitelist of supported source formats, keyed by file extension.
//! The gate runs before any filesystem access: anything outside the
//! whitelist is rejected up front with [`MediaError::UnsupportedFormat`].

use crate::error::MediaError;

/// A supported source image format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SourceFormat {
    Avif,
    Gif,
    Heic,
    Heif,
    Jpeg,
    Png,
    WebP,
}

impl SourceFormat {
    /// Parse the format from the lowercase extension of a relative path.
    ///
    /// Pure string inspection; the filesystem is never consulted. The
    /// extension is taken from the final path component, and a dotfile like
    /// `.heic` has no extension at all, so it is rejected rather than
    /// treated as a HEIC image.
    pub fn from_rel_path(rel: &str) -> Result<Self, MediaError> {
        let name = rel.rsplit('/').next().unwrap_or(rel);
        let ext = match name.rsplit_once('.') {
            Some((stem, ext)) if !stem.is_empty() => ext.to_ascii_lowercase(),
            _ => return Err(MediaError::UnsupportedFormat(rel.to_string())),
        };
        match ext.as_str() {
            "avif" => Ok(Self::Avif),
            "gif" => Ok(Self::Gif),
            "heic" => Ok(Self::Heic),
            "heif" => Ok(Self::Heif),
            "jpeg" | "jpg" => Ok(Self::Jpeg),
            "png" => Ok(Self::Png),
            "webp" => Ok(Self::WebP),
            _ => Err(MediaError::UnsupportedFormat(rel.to_string())),
        }
    }

    /// The format's native content type, used for raw passthrough responses.
    ///
    /// HEIC and HEIF both serve `image/heic`: non-raw requests for them are
    /// always converted, so the native type only ever labels original bytes.
    pub fn content_type(&self) -> &'static str {
        match self {
            Self::Avif => "image/avif",
            Self::Gif => "image/gif",
            Self::Heic | Self::Heif => "image/heic",
            Self::Jpeg => "image/jpeg",
            Self::Png => "image/png",
            Self::WebP => "image/webp",
        }
    }

    /// Whether the format carries native animation. Animated sources bypass
    /// the transform pipeline entirely and are served as-is.
    pub fn is_animated(&self) -> bool {
        matches!(self, Self::Gif)
    }

    /// Whether the format gets the transcode fallback in the pipeline.
    pub fn is_heif_family(&self) -> bool {
        matches!(self, Self::Heic | Self::Heif)
    }
}
