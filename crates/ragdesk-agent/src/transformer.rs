//! Query transformers — turn a conversational question into a retrieval query.

use std::sync::Arc;

use async_trait::async_trait;
use ragdesk_core::error::Result;
use ragdesk_core::traits::provider::{GenerateParams, Provider};
use ragdesk_core::types::{Query, Role};

#[async_trait]
pub trait QueryTransformer: Send + Sync {
    async fn transform(&self, query: &Query) -> Result<String>;
}

/// Returns the question unchanged.
#[derive(Debug, Default, Clone, Copy)]
pub struct IdentityQueryTransformer;

#[async_trait]
impl QueryTransformer for IdentityQueryTransformer {
    async fn transform(&self, query: &Query) -> Result<String> {
        Ok(query.text.clone())
    }
}

/// Folds the prior turns and the new question into one standalone query.
///
/// Without prior turns no LLM call is made.
pub struct CompressingQueryTransformer {
    provider: Arc<dyn Provider>,
    params: GenerateParams,
}

impl CompressingQueryTransformer {
    pub fn new(provider: Arc<dyn Provider>, params: GenerateParams) -> Self {
        Self { provider, params }
    }

    fn prompt(query: &Query) -> String {
        let conversation = query
            .context
            .iter()
            .filter_map(|m| match m.role {
                Role::User => Some(format!("User: {}", m.content)),
                Role::Assistant => Some(format!("AI: {}", m.content)),
                Role::System => None,
            })
            .collect::<Vec<_>>()
            .join("\n");
        let query = &query.text;
        format!(
            "Read and understand the conversation between the User and the AI. \
Then, analyze the new query from the User. Identify all relevant details, terms, and context \
from both the conversation and the new query. Reformulate this query into a clear, concise, \
and self-contained format suitable for information retrieval.

Conversation:
{conversation}

User query: {query}

It is very important that you provide only reformulated query and nothing else! \
Do not prepend a query with anything!"
        )
    }
}

#[async_trait]
impl QueryTransformer for CompressingQueryTransformer {
    async fn transform(&self, query: &Query) -> Result<String> {
        if query.has_no_context() {
            return Ok(query.text.clone());
        }

        let rewritten = self
            .provider
            .generate(&Self::prompt(query), &self.params)
            .await?;
        let rewritten = rewritten.trim();
        if rewritten.is_empty() {
            tracing::debug!("query rewrite came back blank, keeping original");
            return Ok(query.text.clone());
        }
        tracing::debug!("query rewritten: {:?} → {:?}", query.text, rewritten);
        Ok(rewritten.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::ScriptedProvider;
    use ragdesk_core::types::Message;

    fn transformer(provider: Arc<ScriptedProvider>) -> CompressingQueryTransformer {
        CompressingQueryTransformer::new(provider, GenerateParams::default())
    }

    #[tokio::test]
    async fn test_empty_context_passes_through_without_llm() {
        let provider = Arc::new(ScriptedProvider::new("rewritten"));
        let t = transformer(provider.clone());
        let query = Query::with_context("Bonjour", vec![Message::system("translator")]);
        assert_eq!(t.transform(&query).await.unwrap(), "Bonjour");
        assert!(provider.calls().is_empty());
    }

    #[tokio::test]
    async fn test_rewrites_follow_up() {
        let provider = Arc::new(ScriptedProvider::new("  What does RAG retrieve?  "));
        let t = transformer(provider.clone());
        let query = Query::with_context(
            "and what does it retrieve?",
            vec![
                Message::system("helpful assistant"),
                Message::user("What is RAG?"),
                Message::assistant("Retrieval augmented generation."),
            ],
        );
        assert_eq!(t.transform(&query).await.unwrap(), "What does RAG retrieve?");

        let prompt = &provider.prompts()[0];
        assert!(prompt.contains("User: What is RAG?\nAI: Retrieval augmented generation."));
        assert!(prompt.contains("User query: and what does it retrieve?"));
        assert!(!prompt.contains("helpful assistant"));
    }

    #[tokio::test]
    async fn test_braces_in_history_left_alone() {
        let provider = Arc::new(ScriptedProvider::new("rewritten"));
        let t = transformer(provider.clone());
        let query = Query::with_context(
            "NEWQ",
            vec![Message::user("how do I write {query} in a template?")],
        );
        t.transform(&query).await.unwrap();

        let prompt = &provider.prompts()[0];
        assert!(prompt.contains("User: how do I write {query} in a template?"));
        assert!(prompt.contains("User query: NEWQ"));
    }

    #[tokio::test]
    async fn test_blank_rewrite_falls_back() {
        let provider = Arc::new(ScriptedProvider::new("   "));
        let t = transformer(provider);
        let query = Query::with_context("next?", vec![Message::user("Paris")]);
        assert_eq!(t.transform(&query).await.unwrap(), "next?");
    }

    #[tokio::test]
    async fn test_llm_failure_propagates() {
        let provider = Arc::new(ScriptedProvider::new("x").failing_on("User query"));
        let t = transformer(provider);
        let query = Query::with_context("next?", vec![Message::user("Paris")]);
        assert!(t.transform(&query).await.unwrap_err().is_remote());
    }

    #[tokio::test]
    async fn test_identity() {
        let query = Query::with_context("next?", vec![Message::user("Paris")]);
        assert_eq!(
            IdentityQueryTransformer.transform(&query).await.unwrap(),
            "next?"
        );
    }
}
