//! Error types for RagDesk.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum RagDeskError {
    /// Blank or malformed user input. Nothing was mutated.
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("HTTP error: {0}")]
    Http(String),

    #[error("Provider error: {0}")]
    Provider(String),

    #[error("API key missing for provider: {0}")]
    ApiKeyMissing(String),

    #[error("Provider not found: {0}")]
    ProviderNotFound(String),

    #[error("Embedding error: {0}")]
    Embedding(String),

    #[error("{operation} timed out after {secs}s")]
    Timeout { operation: String, secs: u64 },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Vector dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    /// A probe answer could not be mapped to yes/no/maybe.
    #[error("Ambiguous probe response: {0:?}")]
    ParseAmbiguity(String),

    #[error("Session {0} already has a question in flight")]
    SessionBusy(String),

    #[error("Session not found: {0}")]
    SessionNotFound(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("{0}")]
    Other(String),
}

impl RagDeskError {
    /// Failures of an external capability (LLM or embedding endpoint).
    /// These abort the current turn only.
    pub fn is_remote(&self) -> bool {
        matches!(
            self,
            Self::Http(_)
                | Self::Provider(_)
                | Self::ApiKeyMissing(_)
                | Self::Embedding(_)
                | Self::Timeout { .. }
        )
    }

    /// Text suitable for showing to the end user.
    pub fn user_message(&self) -> String {
        match self {
            Self::Validation(msg) => msg.clone(),
            Self::SessionBusy(_) => {
                "Please wait for the previous answer before asking again.".into()
            }
            e if e.is_remote() => {
                "The assistant could not answer right now. Please try again.".into()
            }
            _ => "Something went wrong while processing the question.".into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, RagDeskError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_remote_classification() {
        assert!(RagDeskError::Http("down".into()).is_remote());
        assert!(
            RagDeskError::Timeout {
                operation: "chat".into(),
                secs: 5
            }
            .is_remote()
        );
        assert!(!RagDeskError::Validation("empty".into()).is_remote());
        assert!(!RagDeskError::ParseAmbiguity(String::new()).is_remote());
    }

    #[test]
    fn test_user_message_hides_remote_details() {
        let err = RagDeskError::Provider("gemini API error 429: quota".into());
        let msg = err.user_message();
        assert!(!msg.contains("429"));
        assert!(msg.contains("try again"));

        let err = RagDeskError::Validation("Question text is empty".into());
        assert_eq!(err.user_message(), "Question text is empty");
    }
}
