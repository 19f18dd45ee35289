//! # Service Configuration
//!
//! Environment-driven configuration, loaded once at startup and passed
//! explicitly into [`crate::state::AppState`]. Every knob has a logged
//! default so the service runs out of the box.

use std::env;
use std::path::PathBuf;

use tracing::info;

/// Runtime configuration for the media service.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// TCP port the server binds to.
    pub port: u16,
    /// Trusted root directory of source assets.
    pub media_root: PathBuf,
    /// Cache directory for derived artifacts, created on demand.
    pub cache_root: PathBuf,
    /// External HEIF converter program for the transcode fallback.
    pub heif_converter: String,
}

impl AppConfig {
    /// Load configuration from the environment, falling back to defaults.
    pub fn load() -> Self {
        Self {
            port: var_or("DARKROOM_PORT", "8080")
                .parse()
                .unwrap_or_else(|e| panic!("invalid DARKROOM_PORT: {e}")),
            media_root: PathBuf::from(var_or("DARKROOM_MEDIA_ROOT", "images")),
            cache_root: PathBuf::from(var_or("DARKROOM_CACHE_ROOT", ".cache/media")),
            heif_converter: var_or("DARKROOM_HEIF_CONVERTER", "heif-convert"),
        }
    }
}

fn var_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| {
        info!("{key} not set, using default: {default}");
        default.to_string()
    })
}
