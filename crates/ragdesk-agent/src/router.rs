//! Query routing — decides which retrievers (if any) see a query.
//!
//! Routing never fails a turn: a probe error, timeout or unparseable answer
//! means "no retrieval" and is only logged.

use std::sync::Arc;

use async_trait::async_trait;
use ragdesk_core::config::RouterConfig;
use ragdesk_core::error::Result;
use ragdesk_knowledge::ContentRetriever;

use crate::classifier::{ProbeClassifier, Verdict};

#[async_trait]
pub trait QueryRouter: Send + Sync {
    async fn route(&self, query: &str) -> Vec<Arc<ContentRetriever>>;
}

/// Two-stage probe router.
///
/// 1. Domain probe: a negative answer means no retrieval.
/// 2. Topic probe: a negative answer picks `secondary`, anything else `primary`.
pub struct TopicRouter {
    classifier: ProbeClassifier,
    domain_probe: String,
    topic_probe: String,
    primary: Arc<ContentRetriever>,
    secondary: Arc<ContentRetriever>,
}

impl TopicRouter {
    pub fn new(
        classifier: ProbeClassifier,
        domain_probe: impl Into<String>,
        topic_probe: impl Into<String>,
        primary: Arc<ContentRetriever>,
        secondary: Arc<ContentRetriever>,
    ) -> Self {
        Self {
            classifier,
            domain_probe: domain_probe.into(),
            topic_probe: topic_probe.into(),
            primary,
            secondary,
        }
    }

    pub fn from_config(
        classifier: ProbeClassifier,
        config: &RouterConfig,
        primary: Arc<ContentRetriever>,
        secondary: Arc<ContentRetriever>,
    ) -> Self {
        Self::new(
            classifier,
            &config.domain_probe,
            &config.topic_probe,
            primary,
            secondary,
        )
    }

    async fn decide(&self, query: &str) -> Result<Option<Arc<ContentRetriever>>> {
        if self.classifier.classify(&self.domain_probe, query).await? == Verdict::No {
            return Ok(None);
        }
        let chosen = match self.classifier.classify(&self.topic_probe, query).await? {
            Verdict::No => &self.secondary,
            Verdict::Yes | Verdict::Maybe => &self.primary,
        };
        Ok(Some(chosen.clone()))
    }
}

#[async_trait]
impl QueryRouter for TopicRouter {
    async fn route(&self, query: &str) -> Vec<Arc<ContentRetriever>> {
        match self.decide(query).await {
            Ok(Some(retriever)) => {
                tracing::debug!("🧭 routed to '{}'", retriever.topic());
                vec![retriever]
            }
            Ok(None) => {
                tracing::debug!("🧭 out of domain, no retrieval");
                Vec::new()
            }
            Err(e) => {
                tracing::warn!("⚠️ Routing failed, answering without retrieval: {e}");
                Vec::new()
            }
        }
    }
}

/// Sends every query to every retriever.
pub struct BroadcastRouter {
    retrievers: Vec<Arc<ContentRetriever>>,
}

impl BroadcastRouter {
    pub fn new(retrievers: Vec<Arc<ContentRetriever>>) -> Self {
        Self { retrievers }
    }
}

#[async_trait]
impl QueryRouter for BroadcastRouter {
    async fn route(&self, _query: &str) -> Vec<Arc<ContentRetriever>> {
        self.retrievers.clone()
    }
}
