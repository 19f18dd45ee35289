//! # Media Error Taxonomy
//!
//! The four failure modes of the derivation subsystem. Cache write failure
//! is deliberately absent: persistence is best-effort and reported as the
//! `false` arm of [`crate::store::ArtifactStore::store`], never as an error
//! value.

use thiserror::Error;

/// Failure modes of media derivation.
///
/// Only `InvalidPath`, `UnsupportedFormat`, and `NotFound` may surface to a
/// client as non-2xx responses. `DecodeFailed` is always converted into a
/// degraded placeholder response by the caller.
#[derive(Error, Debug)]
pub enum MediaError {
    /// The requested path escapes the trusted media root.
    #[error("invalid path: {0}")]
    InvalidPath(String),

    /// The source extension is not in the supported whitelist.
    #[error("unsupported source format: {0}")]
    UnsupportedFormat(String),

    /// The source asset does not exist at resolution time.
    #[error("source asset not found: {0}")]
    NotFound(String),

    /// The pipeline could not produce valid output bytes after exhausting
    /// every fallback path.
    #[error("decode failed: {0}")]
    DecodeFailed(String),
}
