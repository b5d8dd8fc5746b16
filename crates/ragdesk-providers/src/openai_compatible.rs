//! Unified OpenAI-compatible provider.
//!
//! A single struct that handles chat completions for every OpenAI-compatible
//! API. Providers are distinguished only by endpoint URL, auth style and key.

use async_trait::async_trait;
use ragdesk_core::config::RagDeskConfig;
use ragdesk_core::error::{RagDeskError, Result};
use ragdesk_core::traits::provider::{GenerateParams, Provider};
use ragdesk_core::types::{Message, ProviderResponse, Usage};
use serde_json::{Value, json};

use crate::provider_registry::{AuthStyle, ProviderConfig};

/// A unified provider that works with any OpenAI-compatible API.
pub struct OpenAiCompatibleProvider {
    /// Provider name (e.g., "gemini", "openai", "ollama").
    name: String,
    api_key: String,
    /// Base URL for the API (e.g., "https://api.openai.com/v1").
    base_url: String,
    chat_path: String,
    auth_style: AuthStyle,
    /// Used when a call's params carry no model.
    default_model: String,
    client: reqwest::Client,
}

impl OpenAiCompatibleProvider {
    /// Create from a known provider config + RagDeskConfig.
    ///
    /// Resolution order:
    /// - API key: `config.llm.api_key` > `config.api_key` > env vars > empty
    /// - Base URL: `config.llm.endpoint` > env override > registry default
    pub fn from_registry(registry: &ProviderConfig, config: &RagDeskConfig) -> Result<Self> {
        let api_key = if !config.llm.api_key.is_empty() {
            config.llm.api_key.clone()
        } else if !config.api_key.is_empty() {
            config.api_key.clone()
        } else {
            registry.env_api_key().unwrap_or_default()
        };

        let base_url = if !config.llm.endpoint.is_empty() {
            config.llm.endpoint.trim_end_matches('/').to_string()
        } else {
            registry.resolve_base_url()
        };

        Ok(Self {
            name: registry.name.to_string(),
            api_key,
            base_url,
            chat_path: registry.chat_path.to_string(),
            auth_style: registry.auth_style,
            default_model: registry.default_model.to_string(),
            client: reqwest::Client::new(),
        })
    }

    /// Create for a custom endpoint (e.g., "custom:https://my-server.com/v1").
    pub fn custom(endpoint: &str, config: &RagDeskConfig) -> Result<Self> {
        let base_url = endpoint
            .strip_prefix("custom:")
            .unwrap_or(endpoint)
            .trim_end_matches('/')
            .to_string();
        if base_url.is_empty() {
            return Err(RagDeskError::Config("custom provider needs a URL".into()));
        }

        let api_key = if !config.llm.api_key.is_empty() {
            config.llm.api_key.clone()
        } else if !config.api_key.is_empty() {
            config.api_key.clone()
        } else {
            std::env::var("CUSTOM_API_KEY").unwrap_or_default()
        };

        let auth_style = if api_key.is_empty() {
            AuthStyle::None
        } else {
            AuthStyle::Bearer
        };

        Ok(Self {
            name: "custom".to_string(),
            api_key,
            base_url,
            chat_path: "/chat/completions".to_string(),
            auth_style,
            default_model: config.model_name().to_string(),
            client: reqwest::Client::new(),
        })
    }

    fn apply_auth(&self, req: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match self.auth_style {
            AuthStyle::Bearer if !self.api_key.is_empty() => {
                req.header("Authorization", format!("Bearer {}", self.api_key))
            }
            _ => req,
        }
    }

    fn request_body(&self, messages: &[Message], params: &GenerateParams) -> Value {
        let model = if params.model.is_empty() {
            self.default_model.as_str()
        } else {
            params.model.as_str()
        };
        json!({
            "model": model,
            "messages": messages,
            "temperature": params.temperature,
            "max_tokens": params.max_tokens,
            "top_p": params.top_p,
        })
    }
}

/// Extract content, finish reason and usage from a chat-completions body.
pub(crate) fn parse_completion(name: &str, json: &Value) -> Result<ProviderResponse> {
    let choice = json["choices"]
        .get(0)
        .ok_or_else(|| RagDeskError::Provider(format!("{name}: no choices in response")))?;

    let content = choice["message"]["content"].as_str().map(String::from);

    let usage = json["usage"].as_object().map(|u| Usage {
        prompt_tokens: u.get("prompt_tokens").and_then(|v| v.as_u64()).unwrap_or(0) as u32,
        completion_tokens: u
            .get("completion_tokens")
            .and_then(|v| v.as_u64())
            .unwrap_or(0) as u32,
        total_tokens: u.get("total_tokens").and_then(|v| v.as_u64()).unwrap_or(0) as u32,
    });

    Ok(ProviderResponse {
        content,
        finish_reason: choice["finish_reason"].as_str().map(String::from),
        usage,
    })
}

#[async_trait]
impl Provider for OpenAiCompatibleProvider {
    fn name(&self) -> &str {
        &self.name
    }

    async fn chat(
        &self,
        messages: &[Message],
        params: &GenerateParams,
    ) -> Result<ProviderResponse> {
        if self.auth_style != AuthStyle::None && self.api_key.is_empty() {
            return Err(RagDeskError::ApiKeyMissing(self.name.clone()));
        }

        let body = self.request_body(messages, params);
        let url = format!("{}{}", self.base_url, self.chat_path);
        let req = self
            .client
            .post(&url)
            .header("Content-Type", "application/json")
            .json(&body);
        let req = self.apply_auth(req);

        tracing::debug!(
            provider = %self.name,
            messages = messages.len(),
            temperature = params.temperature,
            "chat request"
        );

        let resp = req.send().await.map_err(|e| {
            RagDeskError::Http(format!("{} connection failed ({}): {}", self.name, url, e))
        })?;

        if !resp.status().is_success() {
            let status = resp.status();
            let text = resp.text().await.unwrap_or_default();
            return Err(RagDeskError::Provider(format!(
                "{} API error {}: {}",
                self.name, status, text
            )));
        }

        let json: Value = resp
            .json()
            .await
            .map_err(|e| RagDeskError::Http(e.to_string()))?;

        let response = parse_completion(&self.name, &json)?;
        if let Some(usage) = &response.usage {
            tracing::debug!(
                provider = %self.name,
                prompt_tokens = usage.prompt_tokens,
                completion_tokens = usage.completion_tokens,
                "chat response"
            );
        }
        Ok(response)
    }

    async fn health_check(&self) -> Result<bool> {
        if self.auth_style != AuthStyle::None {
            // Cloud providers: usable as soon as a key is configured.
            return Ok(!self.api_key.is_empty());
        }

        let url = format!("{}/models", self.base_url);
        let resp = self.client.get(&url).send().await;
        Ok(resp.is_ok())
    }
}
