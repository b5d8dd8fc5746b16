//! Scripted providers shared by the unit tests of this crate.

use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use ragdesk_core::error::{RagDeskError, Result};
use ragdesk_core::traits::Embedder;
use ragdesk_core::traits::provider::{GenerateParams, Provider};
use ragdesk_core::types::{Message, ProviderResponse};
use ragdesk_knowledge::{Chunker, ContentRetriever, Ingestor};
use ragdesk_providers::embedding::HashEmbedder;
use tokio::sync::Notify;

#[derive(Clone)]
pub(crate) enum Reply {
    Text(String),
    Fail,
}

/// Answers each call from the first rule whose needle appears in the last
/// message, and records every conversation it was sent.
pub(crate) struct ScriptedProvider {
    rules: Vec<(String, Reply)>,
    fallback: Reply,
    calls: Mutex<Vec<Vec<Message>>>,
    gate: Option<(Arc<Notify>, Arc<Notify>)>,
    gated_once: AtomicBool,
}

impl ScriptedProvider {
    pub(crate) fn new(fallback: &str) -> Self {
        Self {
            rules: Vec::new(),
            fallback: Reply::Text(fallback.into()),
            calls: Mutex::new(Vec::new()),
            gate: None,
            gated_once: AtomicBool::new(false),
        }
    }

    pub(crate) fn on(mut self, needle: &str, reply: &str) -> Self {
        self.rules.push((needle.into(), Reply::Text(reply.into())));
        self
    }

    pub(crate) fn failing_on(mut self, needle: &str) -> Self {
        self.rules.push((needle.into(), Reply::Fail));
        self
    }

    /// The first call signals `entered` and then waits for `release`.
    pub(crate) fn gated(mut self, entered: Arc<Notify>, release: Arc<Notify>) -> Self {
        self.gate = Some((entered, release));
        self
    }

    pub(crate) fn calls(&self) -> Vec<Vec<Message>> {
        self.calls.lock().unwrap().clone()
    }

    /// Last message of every call, in call order.
    pub(crate) fn prompts(&self) -> Vec<String> {
        self.calls()
            .iter()
            .filter_map(|c| c.last().map(|m| m.content.clone()))
            .collect()
    }
}

#[async_trait]
impl Provider for ScriptedProvider {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn chat(
        &self,
        messages: &[Message],
        _params: &GenerateParams,
    ) -> Result<ProviderResponse> {
        self.calls.lock().unwrap().push(messages.to_vec());

        if let Some((entered, release)) = &self.gate {
            if !self.gated_once.swap(true, Ordering::SeqCst) {
                entered.notify_one();
                release.notified().await;
            }
        }

        let last = messages.last().map(|m| m.content.as_str()).unwrap_or("");
        let reply = self
            .rules
            .iter()
            .find(|(needle, _)| last.contains(needle.as_str()))
            .map(|(_, r)| r.clone())
            .unwrap_or_else(|| self.fallback.clone());

        match reply {
            Reply::Text(text) => Ok(ProviderResponse {
                content: Some(text),
                ..Default::default()
            }),
            Reply::Fail => Err(RagDeskError::Provider("scripted failure".into())),
        }
    }

    async fn health_check(&self) -> Result<bool> {
        Ok(true)
    }
}

pub(crate) const ML_DOC: &str = "Fine-tuning adapts a pretrained model to a narrow task. \
Gradient descent updates the weights of the neural network.";

pub(crate) const RAG_DOC: &str = "Retrieval augmented generation retrieves passages from a \
knowledge base. The retrieved passages are injected into the prompt.";

pub(crate) fn embedder() -> Arc<dyn Embedder> {
    Arc::new(HashEmbedder::new(256))
}

/// Retrievers over the two sample documents: `(rag, ml)`.
pub(crate) async fn retrievers() -> (Arc<ContentRetriever>, Arc<ContentRetriever>) {
    let embedder = embedder();
    let ingestor = Ingestor::new(Chunker::new(80, 10).unwrap(), embedder.clone());
    let rag = ingestor
        .build_collection("rag", &[("doc-rag", RAG_DOC)])
        .await
        .unwrap();
    let ml = ingestor
        .build_collection("ml", &[("doc-ml", ML_DOC)])
        .await
        .unwrap();
    (
        Arc::new(ContentRetriever::new(Arc::new(rag), embedder.clone(), 2, 0.5)),
        Arc::new(ContentRetriever::new(Arc::new(ml), embedder, 2, 0.5)),
    )
}
