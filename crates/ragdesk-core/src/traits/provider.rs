//! LLM provider capability.

use async_trait::async_trait;

use crate::error::{RagDeskError, Result};
use crate::types::{Message, ProviderResponse};

/// Sampling parameters for one completion call.
#[derive(Debug, Clone)]
pub struct GenerateParams {
    pub model: String,
    pub temperature: f32,
    pub max_tokens: u32,
    pub top_p: f32,
}

impl GenerateParams {
    pub fn new(model: impl Into<String>, temperature: f32) -> Self {
        Self {
            model: model.into(),
            temperature,
            ..Self::default()
        }
    }

    /// Same parameters with a different temperature.
    pub fn with_temperature(&self, temperature: f32) -> Self {
        Self {
            temperature,
            ..self.clone()
        }
    }
}

impl Default for GenerateParams {
    fn default() -> Self {
        Self {
            model: String::new(),
            temperature: 0.7,
            max_tokens: 1024,
            top_p: 0.9,
        }
    }
}

/// A chat-completion backend. Calls may fail with any remote error kind.
#[async_trait]
pub trait Provider: Send + Sync {
    fn name(&self) -> &str;

    async fn chat(&self, messages: &[Message], params: &GenerateParams)
    -> Result<ProviderResponse>;

    /// Whether the provider is usable (credentials present, server reachable).
    async fn health_check(&self) -> Result<bool>;

    /// Single-prompt completion returning only the text.
    async fn generate(&self, prompt: &str, params: &GenerateParams) -> Result<String> {
        let response = self.chat(&[Message::user(prompt)], params).await?;
        response
            .content
            .ok_or_else(|| RagDeskError::Provider(format!("{} returned no content", self.name())))
    }
}
