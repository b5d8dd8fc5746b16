//! Embedding backends.
//!
//! - `HashEmbedder` — local, offline feature hashing over word tokens.
//!   Deterministic and dependency-free at runtime; good enough for keyword-level
//!   similarity over small document sets.
//! - `OpenAiCompatibleEmbedder` — calls any `/embeddings` endpoint that speaks
//!   the OpenAI wire format.

use std::time::Duration;

use async_trait::async_trait;
use ragdesk_core::config::EmbeddingConfig;
use ragdesk_core::error::{RagDeskError, Result};
use ragdesk_core::traits::Embedder;
use serde_json::{Value, json};
use sha2::{Digest, Sha256};

use crate::provider_registry::{AuthStyle, ProviderConfig};

/// Signed feature hashing: each lowercase token lands in one bucket with a
/// sign taken from its digest, and the result is L2-normalized.
pub struct HashEmbedder {
    dimension: usize,
}

impl HashEmbedder {
    pub fn new(dimension: usize) -> Self {
        Self {
            dimension: dimension.max(1),
        }
    }

    fn tokens(text: &str) -> impl Iterator<Item = String> + '_ {
        text.split(|c: char| !c.is_alphanumeric())
            .filter(|t| !t.is_empty())
            .map(|t| t.to_lowercase())
    }

    fn vectorize(&self, text: &str) -> Vec<f32> {
        let mut vector = vec![0.0f32; self.dimension];
        for token in Self::tokens(text) {
            let digest = Sha256::digest(token.as_bytes());
            let mut bucket_bytes = [0u8; 8];
            bucket_bytes.copy_from_slice(&digest[..8]);
            let bucket = (u64::from_le_bytes(bucket_bytes) % self.dimension as u64) as usize;
            let sign = if digest[8] & 1 == 0 { 1.0 } else { -1.0 };
            vector[bucket] += sign;
        }

        let norm = vector.iter().map(|v| v * v).sum::<f32>().sqrt();
        if norm > 0.0 {
            for v in &mut vector {
                *v /= norm;
            }
        }
        vector
    }
}

#[async_trait]
impl Embedder for HashEmbedder {
    fn name(&self) -> &str {
        "hash"
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        Ok(self.vectorize(text))
    }
}

/// Remote embedder for OpenAI-compatible `/embeddings` endpoints.
pub struct OpenAiCompatibleEmbedder {
    name: String,
    api_key: String,
    url: String,
    model: String,
    dimension: usize,
    timeout_secs: u64,
    auth_style: AuthStyle,
    client: reqwest::Client,
}

impl OpenAiCompatibleEmbedder {
    /// Resolution order:
    /// - API key: `embedding.api_key` > fallback key > env vars
    /// - Base URL: `embedding.endpoint` > registry default
    pub fn from_registry(
        registry: &ProviderConfig,
        config: &EmbeddingConfig,
        fallback_key: &str,
    ) -> Result<Self> {
        let api_key = if !config.api_key.is_empty() {
            config.api_key.clone()
        } else if !fallback_key.is_empty() {
            fallback_key.to_string()
        } else {
            registry.env_api_key().unwrap_or_default()
        };
        if registry.auth_style != AuthStyle::None && api_key.is_empty() {
            return Err(RagDeskError::ApiKeyMissing(format!(
                "{} (embeddings)",
                registry.name
            )));
        }

        let base_url = if !config.endpoint.is_empty() {
            config.endpoint.trim_end_matches('/').to_string()
        } else {
            registry.resolve_base_url()
        };

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| RagDeskError::Http(e.to_string()))?;

        Ok(Self {
            name: registry.name.to_string(),
            api_key,
            url: format!("{}{}", base_url, registry.embeddings_path),
            model: config.model.clone(),
            dimension: config.dimension,
            timeout_secs: config.timeout_secs,
            auth_style: registry.auth_style,
            client,
        })
    }

    async fn request(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        let body = json!({
            "model": self.model,
            "input": texts,
        });

        let mut req = self.client.post(&self.url).json(&body);
        if self.auth_style == AuthStyle::Bearer {
            req = req.header("Authorization", format!("Bearer {}", self.api_key));
        }

        let resp = req.send().await.map_err(|e| {
            if e.is_timeout() {
                RagDeskError::Timeout {
                    operation: format!("{} embeddings", self.name),
                    secs: self.timeout_secs,
                }
            } else {
                RagDeskError::Embedding(format!("{} request failed: {}", self.name, e))
            }
        })?;

        if !resp.status().is_success() {
            let status = resp.status();
            let text = resp.text().await.unwrap_or_default();
            return Err(RagDeskError::Embedding(format!(
                "{} API error {}: {}",
                self.name, status, text
            )));
        }

        let json: Value = resp
            .json()
            .await
            .map_err(|e| RagDeskError::Embedding(e.to_string()))?;
        let vectors = parse_embeddings(&json)?;

        if vectors.len() != texts.len() {
            return Err(RagDeskError::Embedding(format!(
                "{} returned {} vectors for {} inputs",
                self.name,
                vectors.len(),
                texts.len()
            )));
        }
        for v in &vectors {
            if v.len() != self.dimension {
                return Err(RagDeskError::DimensionMismatch {
                    expected: self.dimension,
                    actual: v.len(),
                });
            }
        }
        Ok(vectors)
    }
}

/// Read `data[*].embedding`, ordered by each item's `index`.
pub(crate) fn parse_embeddings(json: &Value) -> Result<Vec<Vec<f32>>> {
    let data = json["data"]
        .as_array()
        .ok_or_else(|| RagDeskError::Embedding("no data in embeddings response".into()))?;

    let mut items: Vec<(u64, Vec<f32>)> = Vec::with_capacity(data.len());
    for (pos, item) in data.iter().enumerate() {
        let values = item["embedding"]
            .as_array()
            .ok_or_else(|| RagDeskError::Embedding("embedding item has no vector".into()))?;
        let vector = values
            .iter()
            .map(|v| v.as_f64().map(|f| f as f32))
            .collect::<Option<Vec<f32>>>()
            .ok_or_else(|| RagDeskError::Embedding("non-numeric embedding value".into()))?;
        let index = item["index"].as_u64().unwrap_or(pos as u64);
        items.push((index, vector));
    }
    items.sort_by_key(|(index, _)| *index);
    Ok(items.into_iter().map(|(_, v)| v).collect())
}

#[async_trait]
impl Embedder for OpenAiCompatibleEmbedder {
    fn name(&self) -> &str {
        &self.name
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        self.request(&[text])
            .await?
            .pop()
            .ok_or_else(|| RagDeskError::Embedding(format!("{} returned no vector", self.name)))
    }

    async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }
        tracing::debug!(embedder = %self.name, inputs = texts.len(), "embedding batch");
        self.request(texts).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider_registry::get_provider_config;

    fn dot(a: &[f32], b: &[f32]) -> f32 {
        a.iter().zip(b).map(|(x, y)| x * y).sum()
    }

    #[tokio::test]
    async fn test_hash_embedder_is_deterministic_and_normalized() {
        let embedder = HashEmbedder::new(64);
        let a = embedder.embed("Gradient descent minimizes loss").await.unwrap();
        let b = embedder.embed("Gradient descent minimizes loss").await.unwrap();
        assert_eq!(a, b);
        assert_eq!(a.len(), 64);
        assert!((dot(&a, &a) - 1.0).abs() < 1e-5);
    }

    #[tokio::test]
    async fn test_hash_embedder_ignores_case_and_punctuation() {
        let embedder = HashEmbedder::new(128);
        let a = embedder.embed("Retrieval, Augmented!").await.unwrap();
        let b = embedder.embed("retrieval augmented").await.unwrap();
        assert_eq!(a, b);
    }

    #[tokio::test]
    async fn test_hash_embedder_shared_words_are_closer() {
        let embedder = HashEmbedder::new(384);
        let query = embedder.embed("what is a neural network").await.unwrap();
        let near = embedder
            .embed("a neural network is a stack of layers")
            .await
            .unwrap();
        let far = embedder.embed("paris museums open late").await.unwrap();
        assert!(dot(&query, &near) > dot(&query, &far));
    }

    #[tokio::test]
    async fn test_hash_embedder_empty_text_is_zero_vector() {
        let embedder = HashEmbedder::new(16);
        let v = embedder.embed("  ...  ").await.unwrap();
        assert!(v.iter().all(|x| *x == 0.0));
    }

    #[test]
    fn test_parse_embeddings_orders_by_index() {
        let body = json!({
            "data": [
                { "index": 1, "embedding": [0.0, 1.0] },
                { "index": 0, "embedding": [1.0, 0.0] }
            ]
        });
        let vectors = parse_embeddings(&body).unwrap();
        assert_eq!(vectors, vec![vec![1.0, 0.0], vec![0.0, 1.0]]);
        assert!(parse_embeddings(&json!({})).is_err());
    }

    #[test]
    fn test_remote_embedder_endpoint() {
        let registry = get_provider_config("mistral").unwrap();
        let config = EmbeddingConfig {
            provider: "mistral".into(),
            ..Default::default()
        };
        // Key supplied explicitly so the result does not depend on the environment.
        let embedder = OpenAiCompatibleEmbedder::from_registry(registry, &config, "k").unwrap();
        assert_eq!(embedder.url, "https://api.mistral.ai/v1/embeddings");
        assert_eq!(embedder.dimension(), 384);
    }
}
