//! RagDesk configuration system.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};

use crate::error::{RagDeskError, Result};

/// Root configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RagDeskConfig {
    #[serde(default)]
    pub api_key: String,
    #[serde(default = "default_provider")]
    pub default_provider: String,
    #[serde(default = "default_model")]
    pub default_model: String,
    #[serde(default = "default_temperature")]
    pub default_temperature: f32,
    #[serde(default)]
    pub llm: LlmConfig,
    #[serde(default)]
    pub embedding: EmbeddingConfig,
    #[serde(default)]
    pub ingestion: IngestionConfig,
    #[serde(default)]
    pub retrieval: RetrievalConfig,
    #[serde(default)]
    pub router: RouterConfig,
    #[serde(default)]
    pub transformer: TransformerConfig,
    #[serde(default)]
    pub memory: MemoryConfig,
    #[serde(default)]
    pub identity: IdentityConfig,
    #[serde(default = "default_collections")]
    pub collections: Vec<CollectionConfig>,
    #[serde(default = "default_roles")]
    pub roles: Vec<RolePreset>,
}

fn default_provider() -> String { "gemini".into() }
fn default_model() -> String { "gemini-1.5-flash".into() }
fn default_temperature() -> f32 { 0.7 }

impl Default for RagDeskConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            default_provider: default_provider(),
            default_model: default_model(),
            default_temperature: default_temperature(),
            llm: LlmConfig::default(),
            embedding: EmbeddingConfig::default(),
            ingestion: IngestionConfig::default(),
            retrieval: RetrievalConfig::default(),
            router: RouterConfig::default(),
            transformer: TransformerConfig::default(),
            memory: MemoryConfig::default(),
            identity: IdentityConfig::default(),
            collections: default_collections(),
            roles: default_roles(),
        }
    }
}

impl RagDeskConfig {
    /// Load config from the default path (~/.ragdesk/config.toml).
    pub fn load() -> Result<Self> {
        let path = Self::default_path();
        if path.exists() {
            Self::load_from(&path)
        } else {
            Ok(Self::default())
        }
    }

    /// Load config from a specific path.
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| RagDeskError::Config(format!("Failed to read config: {e}")))?;
        let config: Self = toml::from_str(&content)
            .map_err(|e| RagDeskError::Config(format!("Failed to parse config: {e}")))?;
        Ok(config)
    }

    /// Save config to the given path, creating parent directories.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)
            .map_err(|e| RagDeskError::Config(format!("Failed to serialize config: {e}")))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Get the default config path.
    pub fn default_path() -> PathBuf {
        Self::home_dir().join("config.toml")
    }

    /// Get the RagDesk home directory.
    pub fn home_dir() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".ragdesk")
    }

    /// Provider name: `[llm].provider` wins over the top-level field.
    pub fn provider_name(&self) -> &str {
        if !self.llm.provider.is_empty() {
            &self.llm.provider
        } else {
            &self.default_provider
        }
    }

    /// Model name: `[llm].model` wins over the top-level field.
    pub fn model_name(&self) -> &str {
        if !self.llm.model.is_empty() {
            &self.llm.model
        } else {
            &self.default_model
        }
    }

    pub fn collection(&self, name: &str) -> Option<&CollectionConfig> {
        self.collections.iter().find(|c| c.name == name)
    }

    /// Check cross-field constraints. Any failure here prevents startup.
    pub fn validate(&self) -> Result<()> {
        let ing = &self.ingestion;
        if ing.chunk_size == 0 {
            return Err(RagDeskError::Config("ingestion.chunk_size must be > 0".into()));
        }
        if ing.overlap >= ing.chunk_size {
            return Err(RagDeskError::Config(format!(
                "ingestion.overlap ({}) must be smaller than chunk_size ({})",
                ing.overlap, ing.chunk_size
            )));
        }
        if self.retrieval.max_results == 0 {
            return Err(RagDeskError::Config("retrieval.max_results must be > 0".into()));
        }
        if !(0.0..=1.0).contains(&self.retrieval.min_score) {
            return Err(RagDeskError::Config(format!(
                "retrieval.min_score must be within [0, 1], got {}",
                self.retrieval.min_score
            )));
        }
        if self.memory.max_messages == 0 {
            return Err(RagDeskError::Config("memory.max_messages must be > 0".into()));
        }
        if self.embedding.dimension == 0 {
            return Err(RagDeskError::Config("embedding.dimension must be > 0".into()));
        }
        if self.llm.timeout_secs == 0 {
            return Err(RagDeskError::Config("llm.timeout_secs must be > 0".into()));
        }
        if self.collections.is_empty() {
            return Err(RagDeskError::Config("at least one [[collections]] entry is required".into()));
        }

        let mut seen = HashSet::new();
        for c in &self.collections {
            if !seen.insert(c.name.as_str()) {
                return Err(RagDeskError::Config(format!("duplicate collection '{}'", c.name)));
            }
            if c.documents.is_empty() {
                return Err(RagDeskError::Config(format!(
                    "collection '{}' has no documents",
                    c.name
                )));
            }
        }

        if self.router.kind == RouterKind::Topic {
            for topic in [&self.router.primary, &self.router.secondary] {
                if self.collection(topic).is_none() {
                    return Err(RagDeskError::Config(format!(
                        "router topic '{topic}' does not name a collection"
                    )));
                }
            }
            if self.router.primary == self.router.secondary {
                return Err(RagDeskError::Config(
                    "router.primary and router.secondary must differ".into(),
                ));
            }
        }
        Ok(())
    }
}

/// LLM endpoint configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    #[serde(default)]
    pub provider: String,
    #[serde(default)]
    pub model: String,
    #[serde(default)]
    pub api_key: String,
    #[serde(default)]
    pub endpoint: String,
    /// Upper bound for every LLM round-trip (probes, rewrite, answer).
    #[serde(default = "default_llm_timeout")]
    pub timeout_secs: u64,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
}

fn default_llm_timeout() -> u64 { 60 }
fn default_max_tokens() -> u32 { 1024 }

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: String::new(),
            model: String::new(),
            api_key: String::new(),
            endpoint: String::new(),
            timeout_secs: default_llm_timeout(),
            max_tokens: default_max_tokens(),
        }
    }
}

/// Embedding backend configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingConfig {
    /// "hash" (local, offline), "fastembed" (local all-MiniLM-L6-v2) or an
    /// OpenAI-compatible provider name.
    #[serde(default = "default_embedding_provider")]
    pub provider: String,
    #[serde(default = "default_embedding_model")]
    pub model: String,
    #[serde(default = "default_dimension")]
    pub dimension: usize,
    #[serde(default)]
    pub endpoint: String,
    #[serde(default)]
    pub api_key: String,
    #[serde(default = "default_embedding_timeout")]
    pub timeout_secs: u64,
}

fn default_embedding_provider() -> String { "hash".into() }
fn default_embedding_model() -> String { "text-embedding-3-small".into() }
fn default_dimension() -> usize { 384 }
fn default_embedding_timeout() -> u64 { 30 }

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            provider: default_embedding_provider(),
            model: default_embedding_model(),
            dimension: default_dimension(),
            endpoint: String::new(),
            api_key: String::new(),
            timeout_secs: default_embedding_timeout(),
        }
    }
}

/// Chunking policy applied at ingestion time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestionConfig {
    /// Maximum characters per segment.
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,
    /// Characters shared between consecutive segments.
    #[serde(default = "default_overlap")]
    pub overlap: usize,
}

fn default_chunk_size() -> usize { 300 }
fn default_overlap() -> usize { 30 }

impl Default for IngestionConfig {
    fn default() -> Self {
        Self {
            chunk_size: default_chunk_size(),
            overlap: default_overlap(),
        }
    }
}

/// Per-retriever search limits.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievalConfig {
    #[serde(default = "default_max_results")]
    pub max_results: usize,
    #[serde(default = "default_min_score")]
    pub min_score: f32,
}

fn default_max_results() -> usize { 2 }
fn default_min_score() -> f32 { 0.5 }

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            max_results: default_max_results(),
            min_score: default_min_score(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RouterKind {
    /// Two LLM probes pick zero or one collection.
    Topic,
    /// Every query goes to every collection.
    Broadcast,
}

/// Query router configuration. `{query}` in a probe is replaced by the query.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RouterConfig {
    #[serde(default = "default_router_kind")]
    pub kind: RouterKind,
    #[serde(default = "default_domain_probe")]
    pub domain_probe: String,
    #[serde(default = "default_topic_probe")]
    pub topic_probe: String,
    /// Collection chosen when the topic probe is not negative.
    #[serde(default = "default_primary")]
    pub primary: String,
    /// Collection chosen when the topic probe is negative.
    #[serde(default = "default_secondary")]
    pub secondary: String,
    #[serde(default)]
    pub probe_temperature: f32,
    #[serde(default = "default_negative_markers")]
    pub negative_markers: Vec<String>,
    #[serde(default = "default_positive_markers")]
    pub positive_markers: Vec<String>,
    #[serde(default = "default_hedge_markers")]
    pub hedge_markers: Vec<String>,
}

fn default_router_kind() -> RouterKind { RouterKind::Topic }
fn default_domain_probe() -> String {
    "Est-ce que la requête '{query}' porte sur l'IA ? \
     Réponds seulement par 'oui', 'non', ou 'peut-être'."
        .into()
}
fn default_topic_probe() -> String {
    "Est-ce que la requête '{query}' porte sur le fine-tuning ou le RAG ? \
     Réponds seulement par 'oui', 'non', ou 'peut-être'."
        .into()
}
fn default_primary() -> String { "rag".into() }
fn default_secondary() -> String { "ml".into() }
fn default_negative_markers() -> Vec<String> { vec!["non".into(), "no".into()] }
fn default_positive_markers() -> Vec<String> { vec!["oui".into(), "yes".into()] }
fn default_hedge_markers() -> Vec<String> {
    vec!["peut".into(), "maybe".into(), "sais pas".into()]
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self {
            kind: default_router_kind(),
            domain_probe: default_domain_probe(),
            topic_probe: default_topic_probe(),
            primary: default_primary(),
            secondary: default_secondary(),
            probe_temperature: 0.0,
            negative_markers: default_negative_markers(),
            positive_markers: default_positive_markers(),
            hedge_markers: default_hedge_markers(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransformerKind {
    /// LLM rewrite of follow-up questions into standalone queries.
    Compressing,
    /// Pass the question through untouched.
    Identity,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransformerConfig {
    #[serde(default = "default_transformer_kind")]
    pub kind: TransformerKind,
    #[serde(default)]
    pub temperature: f32,
}

fn default_transformer_kind() -> TransformerKind { TransformerKind::Compressing }

impl Default for TransformerConfig {
    fn default() -> Self {
        Self {
            kind: default_transformer_kind(),
            temperature: 0.0,
        }
    }
}

/// Conversation memory configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemoryConfig {
    #[serde(default = "default_max_messages")]
    pub max_messages: usize,
}

fn default_max_messages() -> usize { 10 }

impl Default for MemoryConfig {
    fn default() -> Self {
        Self { max_messages: default_max_messages() }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IdentityConfig {
    /// System role used until the user picks a preset.
    #[serde(default = "default_role")]
    pub default_role: String,
}

fn default_role() -> String { "helpful assistant".into() }

impl Default for IdentityConfig {
    fn default() -> Self {
        Self { default_role: default_role() }
    }
}

/// One topic-specific knowledge collection and its source documents.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CollectionConfig {
    pub name: String,
    #[serde(default)]
    pub description: String,
    /// Document paths; `~` is expanded.
    #[serde(default)]
    pub documents: Vec<String>,
}

impl CollectionConfig {
    pub fn document_paths(&self) -> Vec<PathBuf> {
        self.documents
            .iter()
            .map(|p| PathBuf::from(shellexpand::tilde(p).to_string()))
            .collect()
    }

    /// `name (description)`, or just the name when there is no description.
    pub fn label(&self) -> String {
        if self.description.trim().is_empty() {
            self.name.clone()
        } else {
            format!("{} ({})", self.name, self.description.trim())
        }
    }
}

fn default_collections() -> Vec<CollectionConfig> {
    vec![
        CollectionConfig {
            name: "ml".into(),
            description: "Machine learning and fine-tuning".into(),
            documents: vec!["~/.ragdesk/docs/ml.txt".into()],
        },
        CollectionConfig {
            name: "rag".into(),
            description: "Retrieval-augmented generation".into(),
            documents: vec!["~/.ragdesk/docs/rag.txt".into()],
        },
    ]
}

/// A selectable system role.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RolePreset {
    pub label: String,
    pub text: String,
}

fn default_roles() -> Vec<RolePreset> {
    vec![
        RolePreset {
            label: "Helpful assistant".into(),
            text: default_role(),
        },
        RolePreset {
            label: "English-French translator".into(),
            text: "You are an interpreter. You translate from English to French and from French to English.\n\
                   If the user types a French text, you translate it into English.\n\
                   If the user types an English text, you translate it into French.\n\
                   If the text contains only one to three words, give some examples of usage of these words in English.\n"
                .into(),
        },
        RolePreset {
            label: "Travel guide".into(),
            text: "You are a travel guide. If the user types the name of a country or of a town,\n\
                   you tell them what are the main places to visit in the country or the town\n\
                   and you tell them the average price of a meal.\n"
                .into(),
        },
    ]
}
