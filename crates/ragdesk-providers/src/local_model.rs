//! Local sentence embeddings with all-MiniLM-L6-v2 through fastembed.
//!
//! The ONNX model is downloaded into the cache directory on first use and
//! kept in memory afterwards. Inference is synchronous, so every call runs on
//! the blocking pool.

use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use fastembed::{EmbeddingModel, InitOptions, TextEmbedding};
use ragdesk_core::config::EmbeddingConfig;
use ragdesk_core::error::{RagDeskError, Result};
use ragdesk_core::traits::Embedder;
use tokio::sync::OnceCell;

/// Output size of all-MiniLM-L6-v2.
pub const MINILM_DIMENSION: usize = 384;

pub struct FastEmbedder {
    cache_dir: PathBuf,
    model: OnceCell<Arc<Mutex<TextEmbedding>>>,
}

impl FastEmbedder {
    pub fn new(cache_dir: impl Into<PathBuf>) -> Self {
        Self {
            cache_dir: cache_dir.into(),
            model: OnceCell::new(),
        }
    }

    /// The configured dimension must match the model's.
    pub fn from_config(config: &EmbeddingConfig, cache_dir: impl Into<PathBuf>) -> Result<Self> {
        if config.dimension != MINILM_DIMENSION {
            return Err(RagDeskError::Config(format!(
                "embedding.dimension is {} but all-MiniLM-L6-v2 produces {MINILM_DIMENSION}",
                config.dimension
            )));
        }
        Ok(Self::new(cache_dir))
    }

    pub fn is_loaded(&self) -> bool {
        self.model.initialized()
    }

    async fn model(&self) -> Result<Arc<Mutex<TextEmbedding>>> {
        self.model
            .get_or_try_init(|| async {
                let cache_dir = self.cache_dir.clone();
                tracing::info!(
                    "🧠 Loading all-MiniLM-L6-v2 (cache: {})",
                    cache_dir.display()
                );
                let model = tokio::task::spawn_blocking(move || {
                    TextEmbedding::try_new(
                        InitOptions::new(EmbeddingModel::AllMiniLML6V2)
                            .with_cache_dir(cache_dir)
                            .with_show_download_progress(false),
                    )
                })
                .await
                .map_err(|e| RagDeskError::Embedding(format!("model loader stopped: {e}")))?
                .map_err(|e| {
                    RagDeskError::Embedding(format!("failed to load all-MiniLM-L6-v2: {e}"))
                })?;
                Ok::<_, RagDeskError>(Arc::new(Mutex::new(model)))
            })
            .await
            .cloned()
    }
}

#[async_trait]
impl Embedder for FastEmbedder {
    fn name(&self) -> &str {
        "fastembed"
    }

    fn dimension(&self) -> usize {
        MINILM_DIMENSION
    }

    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        self.embed_batch(&[text])
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| RagDeskError::Embedding("fastembed returned no vector".into()))
    }

    async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }
        let model = self.model().await?;
        let inputs: Vec<String> = texts.iter().map(|t| t.to_string()).collect();
        let vectors = tokio::task::spawn_blocking(move || {
            let mut model = model
                .lock()
                .map_err(|_| RagDeskError::Embedding("embedding model lock poisoned".into()))?;
            model
                .embed(inputs, None)
                .map_err(|e| RagDeskError::Embedding(e.to_string()))
        })
        .await
        .map_err(|e| RagDeskError::Embedding(format!("embedding task stopped: {e}")))??;

        if let Some(v) = vectors.iter().find(|v| v.len() != MINILM_DIMENSION) {
            return Err(RagDeskError::DimensionMismatch {
                expected: MINILM_DIMENSION,
                actual: v.len(),
            });
        }
        tracing::debug!("fastembed: {} vector(s)", vectors.len());
        Ok(vectors)
    }
}
