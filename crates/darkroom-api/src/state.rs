//! # Application State
//!
//! Process-scoped state constructed once in `main` and handed to every
//! route via axum's `State` extractor. There are no module-level singletons:
//! the artifact store and pipeline are explicit handles, which also makes
//! them injectable in tests.

use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::Mutex;

use darkroom_media::{ArtifactStore, HeifCliTranscoder, ImagePipeline, MediaPipeline};

use crate::config::AppConfig;

/// Shared application state. Cheap to clone.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<Inner>,
}

struct Inner {
    config: AppConfig,
    store: ArtifactStore,
    pipeline: Arc<dyn MediaPipeline>,
    /// Per-cache-key single-flight gates. The winner derives while
    /// concurrent siblings wait, then re-check the store. Entries are
    /// removed once the winner finishes; duplicate derivation remains
    /// benign if a gate is ever missed.
    inflight: DashMap<String, Arc<Mutex<()>>>,
}

impl AppState {
    /// Build state with the production pipeline (CLI transcode fallback).
    pub fn new(config: AppConfig) -> Self {
        let transcoder = Arc::new(HeifCliTranscoder::new(config.heif_converter.clone()));
        let pipeline: Arc<dyn MediaPipeline> = Arc::new(ImagePipeline::new(transcoder));
        Self::with_pipeline(config, pipeline)
    }

    /// Build state with an injected pipeline. Used by tests to count decode
    /// calls or force failures.
    pub fn with_pipeline(config: AppConfig, pipeline: Arc<dyn MediaPipeline>) -> Self {
        let store = ArtifactStore::new(config.cache_root.clone());
        Self {
            inner: Arc::new(Inner {
                config,
                store,
                pipeline,
                inflight: DashMap::new(),
            }),
        }
    }

    pub fn config(&self) -> &AppConfig {
        &self.inner.config
    }

    pub fn store(&self) -> &ArtifactStore {
        &self.inner.store
    }

    pub fn pipeline(&self) -> Arc<dyn MediaPipeline> {
        self.inner.pipeline.clone()
    }

    /// Acquire (creating if necessary) the single-flight gate for a key.
    pub fn inflight_gate(&self, key: &str) -> Arc<Mutex<()>> {
        self.inner
            .inflight
            .entry(key.to_string())
            .or_default()
            .clone()
    }

    /// Drop the single-flight gate for a completed key. Waiters already
    /// hold their own `Arc` to the mutex.
    pub fn release_gate(&self, key: &str) {
        self.inner.inflight.remove(key);
    }

    /// Number of keys currently gated. Every request path releases its gate
    /// before responding, so this drains to zero once traffic settles.
    pub fn inflight_len(&self) -> usize {
        self.inner.inflight.len()
    }
}
