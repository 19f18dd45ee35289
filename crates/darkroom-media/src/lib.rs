//! # darkroom-media — On-Demand Media Derivation
//!
//! The core of the darkroom photo service: turns an arbitrary source image
//! beneath a trusted root directory into a normalized WebP derivative,
//! cached on local disk under a content/parameter-derived key.
//!
//! ## Components
//!
//! - [`path`] — confines a caller-supplied relative path to the media root.
//! - [`format`] — whitelist of supported source formats and their content types.
//! - [`key`] — deterministic cache key derivation (SHA-256) and width clamping.
//! - [`store`] — the on-disk artifact store: read-through lookup, best-effort
//!   write-through.
//! - [`pipeline`] — decode, orientation correction, bounded downscale, WebP
//!   encode, with a transcode fallback for HEIC/HEIF sources.
//! - [`placeholder`] — deterministic SVG stand-in when decoding is impossible.
//! - [`listing`] — media root directory listing for the library endpoint.
//!
//! The HTTP boundary lives in `darkroom-api`; nothing in this crate knows
//! about requests or responses.

pub mod error;
pub mod format;
pub mod key;
pub mod listing;
pub mod path;
pub mod pipeline;
pub mod placeholder;
pub mod store;

pub use error::MediaError;
pub use format::SourceFormat;
pub use key::{clamp_width, CacheKey, ENCODE_QUALITY, MAX_WIDTH, MIN_WIDTH};
pub use pipeline::{HeifCliTranscoder, ImagePipeline, MediaPipeline, Transcoder};
pub use placeholder::placeholder_svg;
pub use store::ArtifactStore;
