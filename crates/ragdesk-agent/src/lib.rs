//! # RagDesk Agent
//! The conversational pipeline: query rewriting, routing, retrieval
//! augmentation, bounded memory and per-session state.
//!
//! ## Turn flow
//! ```text
//! submit_question("and the passages?", role)
//!   ↓ ChatMemory (role applied, window read)
//! CompressingQueryTransformer → "What are retrieved passages in RAG?"
//!   ↓
//! TopicRouter: domain probe → topic probe → ContentRetriever("rag")
//!   ↓
//! RetrievalAugmentor → question + "Answer using the following information"
//!   ↓
//! Provider.chat(window + augmented message) → answer → memory + log
//! ```

pub mod assistant;
pub mod augmentor;
pub mod classifier;
pub mod memory;
pub mod roles;
pub mod router;
pub mod session;
pub mod transformer;

#[cfg(test)]
pub(crate) mod testing;

use std::collections::HashMap;
use std::sync::Arc;

use ragdesk_core::config::{RagDeskConfig, RouterKind, TransformerKind};
use ragdesk_core::error::{RagDeskError, Result};
use ragdesk_core::traits::provider::GenerateParams;
use ragdesk_core::traits::{Embedder, Provider};
use ragdesk_knowledge::{Chunker, ContentRetriever, Ingestor, KnowledgeCollection};

pub use assistant::Assistant;
pub use roles::RoleCatalog;
pub use session::{ChatSession, SessionManager, TurnOutcome};

use augmentor::RetrievalAugmentor;
use classifier::{ProbeClassifier, SubstringParser};
use router::{BroadcastRouter, QueryRouter, TopicRouter};
use transformer::{CompressingQueryTransformer, IdentityQueryTransformer, QueryTransformer};

/// A fully wired RagDesk instance: collections ingested, assistant built,
/// sessions ready to be created.
pub struct RagDesk {
    config: RagDeskConfig,
    collections: Vec<Arc<KnowledgeCollection>>,
    sessions: SessionManager,
    roles: RoleCatalog,
}

impl RagDesk {
    /// Build everything from configuration, creating the provider and
    /// embedder it names.
    pub async fn from_config(config: RagDeskConfig) -> Result<Self> {
        config.validate()?;
        let provider: Arc<dyn Provider> = Arc::from(ragdesk_providers::create_provider(&config)?);
        let embedder = ragdesk_providers::create_embedder(&config)?;
        Self::start(config, provider, embedder).await
    }

    /// Check the provider, ingest every configured collection, then wire.
    pub async fn start(
        config: RagDeskConfig,
        provider: Arc<dyn Provider>,
        embedder: Arc<dyn Embedder>,
    ) -> Result<Self> {
        config.validate()?;
        if !provider.health_check().await? {
            return Err(RagDeskError::Config(format!(
                "provider '{}' is not usable (missing API key or server unreachable)",
                provider.name()
            )));
        }

        tracing::info!(
            "📥 Ingesting {} collection(s) with '{}' embeddings...",
            config.collections.len(),
            embedder.name()
        );
        let ingestor = Ingestor::new(Chunker::from_config(&config.ingestion)?, embedder.clone());
        let collections = ingestor.load_all(&config.collections).await?;
        Self::assemble(config, provider, embedder, collections)
    }

    /// Wire already-built collections into retrievers, router and assistant.
    pub fn assemble(
        config: RagDeskConfig,
        provider: Arc<dyn Provider>,
        embedder: Arc<dyn Embedder>,
        collections: Vec<KnowledgeCollection>,
    ) -> Result<Self> {
        let collections: Vec<Arc<KnowledgeCollection>> =
            collections.into_iter().map(Arc::new).collect();

        let mut retrievers: HashMap<String, Arc<ContentRetriever>> = HashMap::new();
        let mut ordered = Vec::with_capacity(collections.len());
        for collection in &collections {
            if collection.dimension() != embedder.dimension() {
                return Err(RagDeskError::DimensionMismatch {
                    expected: embedder.dimension(),
                    actual: collection.dimension(),
                });
            }
            let retriever = Arc::new(ContentRetriever::from_config(
                collection.clone(),
                embedder.clone(),
                &config.retrieval,
            ));
            retrievers.insert(collection.name().to_string(), retriever.clone());
            ordered.push(retriever);
        }

        let answer_params = GenerateParams {
            model: config.model_name().to_string(),
            temperature: config.default_temperature,
            max_tokens: config.llm.max_tokens,
            ..GenerateParams::default()
        };

        let router: Box<dyn QueryRouter> = match config.router.kind {
            RouterKind::Topic => {
                let topic = |name: &str| {
                    retrievers.get(name).cloned().ok_or_else(|| {
                        RagDeskError::Config(format!("router topic '{name}' has no collection"))
                    })
                };
                let classifier = ProbeClassifier::new(
                    provider.clone(),
                    Box::new(SubstringParser::from_config(&config.router)),
                    answer_params.with_temperature(config.router.probe_temperature),
                );
                Box::new(TopicRouter::from_config(
                    classifier,
                    &config.router,
                    topic(&config.router.primary)?,
                    topic(&config.router.secondary)?,
                ))
            }
            RouterKind::Broadcast => Box::new(BroadcastRouter::new(ordered)),
        };

        let transformer: Box<dyn QueryTransformer> = match config.transformer.kind {
            TransformerKind::Compressing => Box::new(CompressingQueryTransformer::new(
                provider.clone(),
                answer_params.with_temperature(config.transformer.temperature),
            )),
            TransformerKind::Identity => Box::new(IdentityQueryTransformer),
        };

        let assistant = Arc::new(Assistant::new(
            provider,
            RetrievalAugmentor::new(transformer, router),
            answer_params,
        ));
        let sessions = SessionManager::new(
            assistant,
            config.memory.max_messages,
            &config.identity.default_role,
        );
        let roles = RoleCatalog::from_config(&config);

        tracing::info!(
            "✅ RagDesk ready: {} collection(s), router={:?}, model={}",
            collections.len(),
            config.router.kind,
            config.model_name()
        );
        Ok(Self {
            config,
            collections,
            sessions,
            roles,
        })
    }

    pub fn config(&self) -> &RagDeskConfig {
        &self.config
    }

    pub fn collections(&self) -> &[Arc<KnowledgeCollection>] {
        &self.collections
    }

    pub fn sessions(&self) -> &SessionManager {
        &self.sessions
    }

    pub fn roles(&self) -> &RoleCatalog {
        &self.roles
    }

    /// One-shot question in a throwaway session.
    pub async fn ask(&self, question: &str, role: &str) -> Result<TurnOutcome> {
        let id = self.sessions.create().await;
        let outcome = self.sessions.submit(&id, question, role).await;
        self.sessions.destroy(&id).await;
        outcome
    }
}
