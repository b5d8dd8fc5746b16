//! Retrieval augmentation: transform → route → retrieve → inject.

use ragdesk_core::error::Result;
use ragdesk_core::types::{Query, ScoredSegment};

use crate::router::QueryRouter;
use crate::transformer::QueryTransformer;

/// Everything produced while augmenting one question.
#[derive(Debug, Clone)]
pub struct AugmentedPrompt {
    pub original_query: String,
    pub transformed_query: String,
    /// Topics of the retrievers that were consulted.
    pub routed_to: Vec<String>,
    /// Retrieved segments after deduplication, in retrieval order.
    pub segments: Vec<ScoredSegment>,
    /// Joined segment texts, absent when nothing was retrieved.
    pub context: Option<String>,
    /// The user message sent to the LLM.
    pub user_message: String,
}

pub struct RetrievalAugmentor {
    transformer: Box<dyn QueryTransformer>,
    router: Box<dyn QueryRouter>,
}

impl RetrievalAugmentor {
    pub fn new(transformer: Box<dyn QueryTransformer>, router: Box<dyn QueryRouter>) -> Self {
        Self {
            transformer,
            router,
        }
    }

    pub async fn augment(&self, query: &Query) -> Result<AugmentedPrompt> {
        let transformed = self.transformer.transform(query).await?;
        let retrievers = self.router.route(&transformed).await;

        let mut routed_to = Vec::with_capacity(retrievers.len());
        let mut segments: Vec<ScoredSegment> = Vec::new();
        for retriever in &retrievers {
            routed_to.push(retriever.topic().to_string());
            let result = retriever.retrieve(&transformed).await?;
            for hit in result.matches {
                if !segments.iter().any(|s| s.segment.text == hit.segment.text) {
                    segments.push(hit);
                }
            }
        }

        let context = if segments.is_empty() {
            None
        } else {
            Some(
                segments
                    .iter()
                    .map(|s| s.segment.text.as_str())
                    .collect::<Vec<_>>()
                    .join("\n\n"),
            )
        };
        let user_message = match &context {
            Some(ctx) => inject(&query.text, ctx),
            None => query.text.clone(),
        };

        tracing::debug!(
            "augmented: routed_to={:?}, {} segment(s)",
            routed_to,
            segments.len()
        );
        Ok(AugmentedPrompt {
            original_query: query.text.clone(),
            transformed_query: transformed,
            routed_to,
            segments,
            context,
            user_message,
        })
    }
}

fn inject(question: &str, context: &str) -> String {
    format!("{question}\n\nAnswer using the following information:\n{context}")
}
