//! Assistant — one question in, one grounded answer out.

use std::sync::Arc;

use ragdesk_core::error::{RagDeskError, Result};
use ragdesk_core::traits::provider::{GenerateParams, Provider};
use ragdesk_core::types::{Message, Query};

use crate::augmentor::{AugmentedPrompt, RetrievalAugmentor};
use crate::memory::ChatMemory;

/// Answer plus the augmentation that produced it.
#[derive(Debug, Clone)]
pub struct AssistantReply {
    pub answer: String,
    pub prompt: AugmentedPrompt,
}

pub struct Assistant {
    provider: Arc<dyn Provider>,
    augmentor: RetrievalAugmentor,
    params: GenerateParams,
}

impl Assistant {
    pub fn new(
        provider: Arc<dyn Provider>,
        augmentor: RetrievalAugmentor,
        params: GenerateParams,
    ) -> Self {
        Self {
            provider,
            augmentor,
            params,
        }
    }

    pub fn provider_name(&self) -> &str {
        self.provider.name()
    }

    /// Answer `user_text` in the context of `memory`.
    ///
    /// Memory gains `User(user_text)` and `Assistant(answer)` only when the
    /// whole turn succeeds.
    pub async fn chat(&self, memory: &mut ChatMemory, user_text: &str) -> Result<AssistantReply> {
        if user_text.trim().is_empty() {
            return Err(RagDeskError::Validation("The question must not be empty.".into()));
        }

        let window = memory.window();
        let query = Query::with_context(user_text, window.clone());
        let prompt = self.augmentor.augment(&query).await?;

        let mut messages = window;
        messages.push(Message::user(prompt.user_message.clone()));

        let response = self.provider.chat(&messages, &self.params).await?;
        let answer = response
            .content
            .filter(|c| !c.trim().is_empty())
            .ok_or_else(|| {
                RagDeskError::Provider(format!("{} returned an empty answer", self.provider.name()))
            })?;

        memory.append(Message::user(user_text));
        memory.append(Message::assistant(answer.clone()));
        Ok(AssistantReply { answer, prompt })
    }
}
