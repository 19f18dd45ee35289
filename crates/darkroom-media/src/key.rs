//! # Cache Key Derivation
//!
//! A cache key is the SHA-256 digest of the canonical concatenation of the
//! request's logical inputs: relative path, resolved width (or the `orig`
//! sentinel), cache-busting version token, the source file's modification
//! time, and the fixed encode quality. Identical inputs against an unchanged
//! source always yield the same key; touching the source's mtime or bumping
//! the version token deterministically invalidates every derived artifact
//! for that source.

use sha2::{Digest, Sha256};

/// Minimum resize width in pixels. Requests below collapse onto this bound.
pub const MIN_WIDTH: u32 = 200;

/// Maximum resize width in pixels. Requests above collapse onto this bound.
pub const MAX_WIDTH: u32 = 2400;

/// Fixed WebP encode quality. Part of the cache key so a quality change
/// invalidates previously derived artifacts.
pub const ENCODE_QUALITY: u8 = 85;

/// A derived cache key: 64 lowercase hex characters of SHA-256.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey(String);

impl CacheKey {
    /// Derive the key for a derivation request.
    ///
    /// `width` must already be clamped via [`clamp_width`]; `None` means
    /// original size. `mtime_ms` is the source's modification time in
    /// milliseconds since the epoch.
    pub fn derive(rel: &str, width: Option<u32>, version: &str, mtime_ms: u128) -> Self {
        let w = match width {
            Some(w) => w.to_string(),
            None => "orig".to_string(),
        };
        let canonical = format!(
            "{rel}|w={w}|v={version}|mtime={mtime_ms}|q={quality}",
            quality = ENCODE_QUALITY
        );
        let digest = Sha256::digest(canonical.as_bytes());
        Self(digest.iter().map(|b| format!("{b:02x}")).collect())
    }

    /// The key as lowercase hex.
    pub fn as_hex(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for CacheKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Clamp a requested width into `[MIN_WIDTH, MAX_WIDTH]`.
///
/// Clamping happens before key derivation, so out-of-range requests address
/// the nearest in-range cache entry instead of minting unbounded entries.
pub fn clamp_width(requested: i64) -> u32 {
    requested.clamp(i64::from(MIN_WIDTH), i64::from(MAX_WIDTH)) as u32
}
