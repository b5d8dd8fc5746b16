//! Content retriever — one collection, one fixed search policy.

use std::sync::Arc;

use ragdesk_core::config::RetrievalConfig;
use ragdesk_core::error::Result;
use ragdesk_core::traits::Embedder;
use ragdesk_core::types::RetrievalResult;

use crate::collection::KnowledgeCollection;

/// Embeds queries with the shared embedder and searches a single collection.
pub struct ContentRetriever {
    collection: Arc<KnowledgeCollection>,
    embedder: Arc<dyn Embedder>,
    max_results: usize,
    min_score: f32,
}

impl ContentRetriever {
    pub fn new(
        collection: Arc<KnowledgeCollection>,
        embedder: Arc<dyn Embedder>,
        max_results: usize,
        min_score: f32,
    ) -> Self {
        Self {
            collection,
            embedder,
            max_results,
            min_score,
        }
    }

    pub fn from_config(
        collection: Arc<KnowledgeCollection>,
        embedder: Arc<dyn Embedder>,
        config: &RetrievalConfig,
    ) -> Self {
        Self::new(collection, embedder, config.max_results, config.min_score)
    }

    /// Topic name, i.e. the name of the wrapped collection.
    pub fn topic(&self) -> &str {
        self.collection.name()
    }

    pub fn collection(&self) -> &KnowledgeCollection {
        &self.collection
    }

    pub async fn retrieve(&self, query: &str) -> Result<RetrievalResult> {
        let vector = self.embedder.embed(query).await?;
        self.collection
            .search(&vector, self.max_results, self.min_score)
    }
}

impl std::fmt::Debug for ContentRetriever {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ContentRetriever")
            .field("topic", &self.topic())
            .field("embedder", &self.embedder.name())
            .field("max_results", &self.max_results)
            .field("min_score", &self.min_score)
            .finish()
    }
}
