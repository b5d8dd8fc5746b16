//! Chat sessions — per-user memory, role and conversation log.
//!
//! ## Lifecycle
//! - `SessionManager::create()` → fresh session with the default role
//! - `submit()` → one turn; at most one in flight per session
//! - `reset()` → "new chat": memory and log discarded, id kept
//! - `destroy()` → session removed
//!
//! Sessions share nothing mutable; the knowledge collections behind the
//! assistant are read-only.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use ragdesk_core::error::{RagDeskError, Result};
use serde::Serialize;
use tokio::sync::{Mutex, RwLock};

use crate::assistant::Assistant;
use crate::memory::ChatMemory;

/// One answered question.
#[derive(Debug, Clone, Serialize)]
pub struct ConversationEntry {
    pub question: String,
    pub answer: String,
    pub timestamp: DateTime<Utc>,
}

/// Append-only record of the session's turns. Unlike memory, it is never
/// evicted and survives role changes.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ConversationLog {
    entries: Vec<ConversationEntry>,
}

impl ConversationLog {
    pub fn push(&mut self, question: impl Into<String>, answer: impl Into<String>) {
        self.entries.push(ConversationEntry {
            question: question.into(),
            answer: answer.into(),
            timestamp: Utc::now(),
        });
    }

    pub fn entries(&self) -> &[ConversationEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Display form shown after every turn.
    pub fn render(&self) -> String {
        self.entries
            .iter()
            .map(|e| format!("* User:\n{}\n* Assistant:\n{}\n", e.question, e.answer))
            .collect()
    }
}

/// Result of a successful turn.
#[derive(Debug, Clone, Serialize)]
pub struct TurnOutcome {
    pub answer: String,
    /// The rendered conversation log, including this turn.
    pub conversation: String,
    /// Topics consulted for this answer (empty when no retrieval happened).
    pub routed_to: Vec<String>,
}

#[derive(Debug)]
pub struct ChatSession {
    id: String,
    memory: ChatMemory,
    system_role: String,
    log: ConversationLog,
    created_at: DateTime<Utc>,
}

impl ChatSession {
    pub fn new(id: impl Into<String>, max_messages: usize, default_role: &str) -> Self {
        let mut memory = ChatMemory::new(max_messages);
        memory.set_system_role(default_role);
        Self {
            id: id.into(),
            memory,
            system_role: default_role.to_string(),
            log: ConversationLog::default(),
            created_at: Utc::now(),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn system_role(&self) -> &str {
        &self.system_role
    }

    pub fn memory(&self) -> &ChatMemory {
        &self.memory
    }

    pub fn log(&self) -> &ConversationLog {
        &self.log
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn conversation(&self) -> String {
        self.log.render()
    }

    /// Whether a front-end should still offer role selection. Changing the
    /// role later is allowed and resets memory.
    pub fn role_changeable(&self) -> bool {
        self.log.is_empty()
    }

    /// Ask one question under `role`.
    ///
    /// A blank question is rejected before anything changes. If the turn
    /// fails, memory, role and log are left exactly as they were.
    pub async fn submit_question(
        &mut self,
        assistant: &Assistant,
        text: &str,
        role: &str,
    ) -> Result<TurnOutcome> {
        if text.trim().is_empty() {
            return Err(RagDeskError::Validation("The question must not be empty.".into()));
        }

        let saved_memory = self.memory.clone();
        let saved_role = self.system_role.clone();

        let role = if role.trim().is_empty() {
            self.system_role.clone()
        } else {
            role.to_string()
        };
        if self.memory.set_system_role(&role) {
            tracing::info!("🎭 Session {}: role changed, memory reset", self.id);
        }
        self.system_role = role;

        match assistant.chat(&mut self.memory, text).await {
            Ok(reply) => {
                self.log.push(text, reply.answer.clone());
                Ok(TurnOutcome {
                    answer: reply.answer,
                    conversation: self.log.render(),
                    routed_to: reply.prompt.routed_to,
                })
            }
            Err(e) => {
                tracing::warn!("❌ Session {}: turn failed: {e}", self.id);
                self.memory = saved_memory;
                self.system_role = saved_role;
                Err(e)
            }
        }
    }

    /// Start a new chat: empty log, memory reseeded with `default_role`.
    pub fn reset(&mut self, default_role: &str) {
        self.memory.clear();
        self.memory.set_system_role(default_role);
        self.system_role = default_role.to_string();
        self.log = ConversationLog::default();
    }
}

/// Owns every live session and the assistant they share.
pub struct SessionManager {
    assistant: Arc<Assistant>,
    sessions: RwLock<HashMap<String, Arc<Mutex<ChatSession>>>>,
    max_messages: usize,
    default_role: String,
}

impl SessionManager {
    pub fn new(
        assistant: Arc<Assistant>,
        max_messages: usize,
        default_role: impl Into<String>,
    ) -> Self {
        Self {
            assistant,
            sessions: RwLock::new(HashMap::new()),
            max_messages,
            default_role: default_role.into(),
        }
    }

    pub fn default_role(&self) -> &str {
        &self.default_role
    }

    /// Create a session and return its id.
    pub async fn create(&self) -> String {
        let id = uuid::Uuid::new_v4().to_string();
        let session = ChatSession::new(&id, self.max_messages, &self.default_role);
        self.sessions
            .write()
            .await
            .insert(id.clone(), Arc::new(Mutex::new(session)));
        tracing::debug!("session {id} created");
        id
    }

    async fn get(&self, id: &str) -> Result<Arc<Mutex<ChatSession>>> {
        self.sessions
            .read()
            .await
            .get(id)
            .cloned()
            .ok_or_else(|| RagDeskError::SessionNotFound(id.to_string()))
    }

    /// Run one turn. Fails with `SessionBusy` while another turn of the same
    /// session is in flight.
    pub async fn submit(&self, id: &str, text: &str, role: &str) -> Result<TurnOutcome> {
        let session = self.get(id).await?;
        let mut guard = session
            .try_lock()
            .map_err(|_| RagDeskError::SessionBusy(id.to_string()))?;
        guard.submit_question(&self.assistant, text, role).await
    }

    /// "New chat" for an existing session.
    pub async fn reset(&self, id: &str) -> Result<()> {
        let session = self.get(id).await?;
        let mut guard = session
            .try_lock()
            .map_err(|_| RagDeskError::SessionBusy(id.to_string()))?;
        guard.reset(&self.default_role);
        tracing::debug!("session {id} reset");
        Ok(())
    }

    /// Remove a session. Returns whether it existed.
    pub async fn destroy(&self, id: &str) -> bool {
        let removed = self.sessions.write().await.remove(id).is_some();
        if removed {
            tracing::debug!("session {id} destroyed");
        }
        removed
    }

    pub async fn conversation(&self, id: &str) -> Result<String> {
        let session = self.get(id).await?;
        let guard = session.lock().await;
        Ok(guard.conversation())
    }

    pub async fn role_changeable(&self, id: &str) -> Result<bool> {
        let session = self.get(id).await?;
        let guard = session.lock().await;
        Ok(guard.role_changeable())
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.sessions.read().await.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::augmentor::RetrievalAugmentor;
    use crate::classifier::{ProbeClassifier, SubstringParser};
    use crate::router::TopicRouter;
    use crate::testing::{ScriptedProvider, retrievers};
    use crate::transformer::CompressingQueryTransformer;
    use ragdesk_core::config::{RagDeskConfig, RouterConfig};
    use ragdesk_core::traits::provider::GenerateParams;
    use ragdesk_core::types::Message;
    use tokio::sync::Notify;

    const TRANSLATOR: &str = "You are an interpreter.";

    async fn assistant(provider: Arc<ScriptedProvider>) -> Arc<Assistant> {
        let (rag, ml) = retrievers().await;
        let classifier = ProbeClassifier::new(
            provider.clone(),
            Box::new(SubstringParser::default()),
            GenerateParams::default().with_temperature(0.0),
        );
        let router = TopicRouter::from_config(classifier, &RouterConfig::default(), rag, ml);
        let augmentor = RetrievalAugmentor::new(
            Box::new(CompressingQueryTransformer::new(
                provider.clone(),
                GenerateParams::default(),
            )),
            Box::new(router),
        );
        Arc::new(Assistant::new(provider, augmentor, GenerateParams::default()))
    }

    fn bonjour_provider() -> ScriptedProvider {
        ScriptedProvider::new("Hello")
            .on("porte sur l'IA", "non")
            .on("User query", "Bonjour")
    }

    #[tokio::test]
    async fn test_bonjour_with_translator() {
        let provider = Arc::new(bonjour_provider());
        let config = RagDeskConfig::default();
        let mut session = ChatSession::new("s1", 10, &config.identity.default_role);

        let outcome = session
            .submit_question(&*assistant(provider.clone()).await, "Bonjour", TRANSLATOR)
            .await
            .unwrap();

        assert_eq!(outcome.answer, "Hello");
        assert!(outcome.routed_to.is_empty());
        assert_eq!(outcome.conversation, "* User:\nBonjour\n* Assistant:\nHello\n");

        // No transform call (empty context), one domain probe, one answer.
        let prompts = provider.prompts();
        assert_eq!(prompts.len(), 2);
        assert!(prompts[0].contains("'Bonjour' porte sur l'IA"));
        assert_eq!(prompts[1], "Bonjour");

        assert_eq!(
            session.memory().window(),
            vec![
                Message::system(TRANSLATOR),
                Message::user("Bonjour"),
                Message::assistant("Hello"),
            ]
        );
        assert_eq!(session.log().len(), 1);
        assert!(!session.role_changeable());
    }

    #[tokio::test]
    async fn test_blank_question_changes_nothing() {
        let provider = Arc::new(bonjour_provider());
        let assistant = assistant(provider.clone()).await;
        let mut session = ChatSession::new("s1", 10, "helpful assistant");

        let err = session
            .submit_question(&assistant, "   ", TRANSLATOR)
            .await
            .unwrap_err();
        assert!(matches!(err, RagDeskError::Validation(_)));
        assert!(session.log().is_empty());
        assert_eq!(session.system_role(), "helpful assistant");
        assert_eq!(session.memory().len(), 1);
        assert!(provider.calls().is_empty());
    }

    #[tokio::test]
    async fn test_failed_turn_restores_state() {
        let provider = Arc::new(
            ScriptedProvider::new("Hello")
                .on("porte sur l'IA", "non")
                .failing_on("Paris"),
        );
        let assistant = assistant(provider).await;
        let mut session = ChatSession::new("s1", 10, "helpful assistant");
        session
            .submit_question(&assistant, "Bonjour", "")
            .await
            .unwrap();
        let before = session.memory().window();

        let err = session
            .submit_question(&assistant, "Paris", "You are a travel guide.")
            .await
            .unwrap_err();
        assert!(err.is_remote());
        assert_eq!(session.memory().window(), before);
        assert_eq!(session.system_role(), "helpful assistant");
        assert_eq!(session.log().len(), 1);
    }

    #[tokio::test]
    async fn test_follow_up_uses_rewritten_query() {
        let provider = Arc::new(
            ScriptedProvider::new("answer")
                .on("porte sur l'IA", "oui")
                .on("porte sur le fine-tuning", "oui")
                .on("User query", "What are retrieved passages in RAG?"),
        );
        let assistant = assistant(provider.clone()).await;
        let mut session = ChatSession::new("s1", 10, "helpful assistant");

        session
            .submit_question(&assistant, "What is RAG?", "")
            .await
            .unwrap();
        let outcome = session
            .submit_question(&assistant, "and the passages?", "")
            .await
            .unwrap();
        assert_eq!(outcome.routed_to, vec!["rag"]);

        let prompts = provider.prompts();
        assert!(prompts.iter().any(|p| p.contains("'What are retrieved passages in RAG?'")));
        // Memory stores what the user typed, not the rewrite.
        assert_eq!(session.memory().window()[3], Message::user("and the passages?"));
    }

    #[tokio::test]
    async fn test_manager_lifecycle() {
        let provider = Arc::new(bonjour_provider());
        let manager = SessionManager::new(assistant(provider).await, 10, "helpful assistant");

        let id = manager.create().await;
        assert!(manager.role_changeable(&id).await.unwrap());
        manager.submit(&id, "Bonjour", "").await.unwrap();
        assert!(manager.conversation(&id).await.unwrap().contains("Bonjour"));
        assert!(!manager.role_changeable(&id).await.unwrap());

        manager.reset(&id).await.unwrap();
        assert_eq!(manager.conversation(&id).await.unwrap(), "");
        assert!(manager.role_changeable(&id).await.unwrap());

        assert!(manager.destroy(&id).await);
        assert!(!manager.destroy(&id).await);
        assert!(matches!(
            manager.submit(&id, "Bonjour", "").await,
            Err(RagDeskError::SessionNotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_sessions_are_isolated() {
        let provider = Arc::new(bonjour_provider());
        let manager = SessionManager::new(assistant(provider).await, 10, "helpful assistant");
        let a = manager.create().await;
        let b = manager.create().await;

        manager.submit(&a, "Bonjour", "").await.unwrap();
        assert_eq!(manager.conversation(&b).await.unwrap(), "");
        assert_eq!(manager.len().await, 2);
    }

    #[tokio::test]
    async fn test_second_submit_while_busy() {
        let entered = Arc::new(Notify::new());
        let release = Arc::new(Notify::new());
        let provider = Arc::new(bonjour_provider().gated(entered.clone(), release.clone()));
        let manager = Arc::new(SessionManager::new(
            assistant(provider).await,
            10,
            "helpful assistant",
        ));
        let id = manager.create().await;

        let first = {
            let manager = manager.clone();
            let id = id.clone();
            tokio::spawn(async move { manager.submit(&id, "Bonjour", "").await })
        };
        entered.notified().await;

        let err = manager.submit(&id, "Encore", "").await.unwrap_err();
        assert!(matches!(err, RagDeskError::SessionBusy(_)));
        assert!(matches!(
            manager.reset(&id).await,
            Err(RagDeskError::SessionBusy(_))
        ));

        release.notify_one();
        let outcome = first.await.unwrap().unwrap();
        assert_eq!(outcome.answer, "Hello");
        assert_eq!(manager.conversation(&id).await.unwrap().matches("* User:").count(), 1);
    }

    #[test]
    fn test_log_render() {
        let mut log = ConversationLog::default();
        log.push("q1", "a1");
        log.push("q2", "a2");
        assert_eq!(log.render(), "* User:\nq1\n* Assistant:\na1\n* User:\nq2\n* Assistant:\na2\n");
    }
}
