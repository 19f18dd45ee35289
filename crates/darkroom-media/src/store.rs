//! # Artifact Store
//!
//! Maps a [`CacheKey`] to a persisted derived-image blob on durable local
//! storage: flat files named `{key}.webp` beneath the cache root. The store
//! exclusively owns that mapping.
//!
//! Lookup is read-through: any read error, including not-found, is a miss.
//! Population is best-effort write-through: a failed write is logged and
//! reported as `false`, and callers are permitted to ignore it — the
//! response never depends on successful caching. Writes go to a uniquely
//! named temp file in the cache directory and are renamed into place, so a
//! cancelled or failed write never leaves partial bytes at the final key
//! path. Concurrent writers for the same key are benign: derivation is
//! deterministic, so whichever rename lands last leaves identical bytes.

use std::path::{Path, PathBuf};

use uuid::Uuid;

use crate::key::CacheKey;

/// Extension of every stored artifact; all derived output is WebP.
const ARTIFACT_EXT: &str = "webp";

/// A filesystem-backed store of derived artifacts addressed by cache key.
#[derive(Debug, Clone)]
pub struct ArtifactStore {
    root: PathBuf,
}

impl ArtifactStore {
    /// Create a store rooted at the given cache directory. The directory is
    /// created lazily on first write.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// The cache root directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Compute the on-disk path for a key.
    pub fn artifact_path(&self, key: &CacheKey) -> PathBuf {
        self.root.join(format!("{key}.{ARTIFACT_EXT}"))
    }

    /// Read-through lookup. Returns the artifact bytes, or `None` on any
    /// read error — a miss is never a hard failure.
    pub async fn lookup(&self, key: &CacheKey) -> Option<Vec<u8>> {
        tokio::fs::read(self.artifact_path(key)).await.ok()
    }

    /// Best-effort write-through population.
    ///
    /// Creates the cache directory on demand, writes the full bytes to a
    /// uniquely named temp file, and renames it over the final key path.
    /// Returns `false` (after a `warn!`) if any step fails; the caller still
    /// holds the freshly derived bytes and serves them regardless.
    pub async fn store(&self, key: &CacheKey, bytes: &[u8]) -> bool {
        match self.try_store(key, bytes).await {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!(key = %key, error = %e, "cache write failed, serving uncached");
                false
            }
        }
    }

    async fn try_store(&self, key: &CacheKey, bytes: &[u8]) -> std::io::Result<()> {
        tokio::fs::create_dir_all(&self.root).await?;
        let tmp = self
            .root
            .join(format!(".{key}.{}.tmp", Uuid::new_v4().simple()));
        tokio::fs::write(&tmp, bytes).await?;
        match tokio::fs::rename(&tmp, self.artifact_path(key)).await {
            Ok(()) => Ok(()),
            Err(e) => {
                // Leave no orphaned temp file behind on rename failure.
                let _ = tokio::fs::remove_file(&tmp).await;
                Err(e)
            }
        }
    }
}
