//! Shared data types.

use serde::{Deserialize, Serialize};

/// Author of a chat message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

/// A single chat message, serialized in the OpenAI wire shape.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

/// Token accounting reported by a provider.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Usage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
}

/// Raw completion returned by a provider.
#[derive(Debug, Clone, Default)]
pub struct ProviderResponse {
    pub content: Option<String>,
    pub finish_reason: Option<String>,
    pub usage: Option<Usage>,
}

/// A piece of a source document. Immutable once created at ingestion time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Segment {
    pub text: String,
    /// Logical name of the document this segment came from (e.g. "doc-ml").
    pub source_id: String,
    /// Byte offset of the first character within the source document.
    pub offset: usize,
    /// Position of the segment within its document.
    pub index: usize,
}

impl Segment {
    /// Byte offset one past the last character within the source document.
    pub fn end(&self) -> usize {
        self.offset + self.text.len()
    }
}

/// A segment paired with its embedding vector.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddedSegment {
    pub segment: Segment,
    pub vector: Vec<f32>,
}

/// A segment returned by a similarity search, scored in `[0, 1]`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoredSegment {
    pub segment: Segment,
    pub score: f32,
}

/// Ordered search hits, highest score first.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RetrievalResult {
    pub matches: Vec<ScoredSegment>,
}

impl RetrievalResult {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.matches.is_empty()
    }

    pub fn len(&self) -> usize {
        self.matches.len()
    }

    pub fn texts(&self) -> impl Iterator<Item = &str> {
        self.matches.iter().map(|m| m.segment.text.as_str())
    }
}

/// A user question together with the conversation that preceded it.
#[derive(Debug, Clone, Default)]
pub struct Query {
    pub text: String,
    /// Prior user/assistant turns, oldest first.
    pub context: Vec<Message>,
}

impl Query {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            context: Vec::new(),
        }
    }

    pub fn with_context(text: impl Into<String>, context: Vec<Message>) -> Self {
        Self {
            text: text.into(),
            context,
        }
    }

    /// True when there are no prior user or assistant turns.
    pub fn has_no_context(&self) -> bool {
        !self.context.iter().any(|m| m.role != Role::System)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_serializes_lowercase() {
        let json = serde_json::to_string(&Message::assistant("hi")).unwrap();
        assert_eq!(json, r#"{"role":"assistant","content":"hi"}"#);
    }

    #[test]
    fn test_segment_end() {
        let seg = Segment {
            text: "héllo".into(),
            source_id: "doc".into(),
            offset: 4,
            index: 0,
        };
        assert_eq!(seg.end(), 4 + "héllo".len());
    }

    #[test]
    fn test_query_context_ignores_system_messages() {
        let q = Query::with_context("next?", vec![Message::system("You are a guide.")]);
        assert!(q.has_no_context());

        let q = Query::with_context("next?", vec![Message::user("Paris")]);
        assert!(!q.has_no_context());
    }
}
