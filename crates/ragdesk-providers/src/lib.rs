//! # RagDesk Providers
//!
//! LLM and embedding backends for RagDesk.
//!
//! All chat backends (Gemini, OpenAI, OpenRouter, DeepSeek, Groq, Mistral,
//! Ollama, LlamaCpp) are handled by a single `OpenAiCompatibleProvider`, and
//! every provider returned from here is wrapped in a `TimedProvider`.

pub mod embedding;
pub mod local_model;
pub mod openai_compatible;
pub mod provider_registry;
pub mod timeout;

use std::sync::Arc;
use std::time::Duration;

use ragdesk_core::config::RagDeskConfig;
use ragdesk_core::error::{RagDeskError, Result};
use ragdesk_core::traits::{Embedder, Provider};

/// Create a chat provider from configuration.
///
/// Resolution order for provider name:
/// 1. `config.llm.provider` (from `[llm]` section)
/// 2. `config.default_provider` (top-level field)
pub fn create_provider(config: &RagDeskConfig) -> Result<Box<dyn Provider>> {
    let provider_name = config.provider_name();

    let inner: Box<dyn Provider> = match provider_name {
        // Custom endpoint: "custom:https://my-server.com/v1"
        other if other.starts_with("custom:") => Box::new(
            openai_compatible::OpenAiCompatibleProvider::custom(other, config)?,
        ),
        _ => {
            let registry = provider_registry::get_provider_config(provider_name)
                .ok_or_else(|| RagDeskError::ProviderNotFound(provider_name.into()))?;
            Box::new(openai_compatible::OpenAiCompatibleProvider::from_registry(
                registry, config,
            )?)
        }
    };

    tracing::debug!(
        "provider {} ready (timeout {}s)",
        inner.name(),
        config.llm.timeout_secs
    );
    Ok(Box::new(timeout::TimedProvider::new(
        inner,
        Duration::from_secs(config.llm.timeout_secs),
    )))
}

/// Create the embedder named by `[embedding].provider`.
///
/// `"hash"` is the local feature-hashing embedder and `"fastembed"` the local
/// all-MiniLM-L6-v2 model (cached under `~/.ragdesk/models`). Any registry
/// name selects that provider's `/embeddings` endpoint.
pub fn create_embedder(config: &RagDeskConfig) -> Result<Arc<dyn Embedder>> {
    let emb = &config.embedding;
    match emb.provider.as_str() {
        "hash" | "local" => Ok(Arc::new(embedding::HashEmbedder::new(emb.dimension))),
        "fastembed" | "minilm" => Ok(Arc::new(local_model::FastEmbedder::from_config(
            emb,
            RagDeskConfig::home_dir().join("models"),
        )?)),
        name => {
            let registry = provider_registry::get_provider_config(name)
                .ok_or_else(|| RagDeskError::ProviderNotFound(format!("{name} (embeddings)")))?;
            Ok(Arc::new(embedding::OpenAiCompatibleEmbedder::from_registry(
                registry,
                emb,
                &config.api_key,
            )?))
        }
    }
}

/// List all available provider names.
pub fn available_providers() -> Vec<&'static str> {
    let mut names = provider_registry::all_provider_names();
    names.push("custom");
    names
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_provider() {
        let mut config = RagDeskConfig::default();
        config.llm.provider = "nonexistent".into();
        let err = create_provider(&config).err().unwrap();
        assert!(matches!(err, RagDeskError::ProviderNotFound(_)));
    }

    #[test]
    fn test_provider_is_wrapped_with_timeout() {
        let mut config = RagDeskConfig::default();
        config.llm.provider = "ollama".into();
        let provider = create_provider(&config).unwrap();
        assert_eq!(provider.name(), "ollama");
    }

    #[test]
    fn test_default_embedder_is_local() {
        let config = RagDeskConfig::default();
        let embedder = create_embedder(&config).unwrap();
        assert_eq!(embedder.name(), "hash");
        assert_eq!(embedder.dimension(), config.embedding.dimension);
    }

    #[test]
    fn test_fastembed_selectable() {
        let mut config = RagDeskConfig::default();
        config.embedding.provider = "fastembed".into();
        let embedder = create_embedder(&config).unwrap();
        assert_eq!(embedder.name(), "fastembed");
        assert_eq!(embedder.dimension(), 384);

        config.embedding.dimension = 256;
        assert!(matches!(
            create_embedder(&config).err().unwrap(),
            RagDeskError::Config(_)
        ));
    }

    #[test]
    fn test_available_providers() {
        let names = available_providers();
        assert!(names.contains(&"gemini"));
        assert!(names.contains(&"custom"));
    }
}
