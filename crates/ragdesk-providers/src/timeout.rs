//! Timed provider — bounds every LLM round-trip.
//!
//! Wraps any `Provider` so that a call which does not complete within the
//! configured duration fails with `RagDeskError::Timeout` instead of hanging
//! the session.

use std::time::Duration;

use async_trait::async_trait;
use ragdesk_core::error::{RagDeskError, Result};
use ragdesk_core::traits::provider::{GenerateParams, Provider};
use ragdesk_core::types::{Message, ProviderResponse};

/// Provider decorator applying a fixed deadline to each call.
pub struct TimedProvider {
    inner: Box<dyn Provider>,
    timeout: Duration,
}

impl TimedProvider {
    pub fn new(inner: Box<dyn Provider>, timeout: Duration) -> Self {
        Self { inner, timeout }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    fn elapsed(&self, operation: &str) -> RagDeskError {
        tracing::warn!(
            "⏱️ {} {} exceeded {}s",
            self.inner.name(),
            operation,
            self.timeout.as_secs()
        );
        RagDeskError::Timeout {
            operation: format!("{} {}", self.inner.name(), operation),
            secs: self.timeout.as_secs(),
        }
    }
}

#[async_trait]
impl Provider for TimedProvider {
    fn name(&self) -> &str {
        self.inner.name()
    }

    async fn chat(
        &self,
        messages: &[Message],
        params: &GenerateParams,
    ) -> Result<ProviderResponse> {
        match tokio::time::timeout(self.timeout, self.inner.chat(messages, params)).await {
            Ok(result) => result,
            Err(_) => Err(self.elapsed("chat")),
        }
    }

    async fn health_check(&self) -> Result<bool> {
        match tokio::time::timeout(self.timeout, self.inner.health_check()).await {
            Ok(result) => result,
            Err(_) => Ok(false),
        }
    }
}
