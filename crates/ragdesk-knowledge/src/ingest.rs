//! Ingestion pipeline: read → parse → chunk → embed → index.
//!
//! Runs once at startup. Collections are built concurrently and never
//! rebuilt afterwards.

use std::path::Path;
use std::sync::Arc;

use futures::future::try_join_all;
use ragdesk_core::config::CollectionConfig;
use ragdesk_core::error::{RagDeskError, Result};
use ragdesk_core::traits::Embedder;
use ragdesk_core::types::EmbeddedSegment;

use crate::chunker::Chunker;
use crate::collection::KnowledgeCollection;
use crate::parser::{DocumentParser, PlainTextParser, load_document};

/// Builds knowledge collections from documents.
pub struct Ingestor {
    chunker: Chunker,
    parser: Arc<dyn DocumentParser>,
    embedder: Arc<dyn Embedder>,
}

impl Ingestor {
    pub fn new(chunker: Chunker, embedder: Arc<dyn Embedder>) -> Self {
        Self {
            chunker,
            parser: Arc::new(PlainTextParser),
            embedder,
        }
    }

    pub fn with_parser(mut self, parser: Arc<dyn DocumentParser>) -> Self {
        self.parser = parser;
        self
    }

    /// Chunk and embed one document into `collection`. Returns the number of
    /// segments indexed; whitespace-only segments are skipped.
    pub async fn ingest_text(
        &self,
        collection: &mut KnowledgeCollection,
        source_id: &str,
        text: &str,
    ) -> Result<usize> {
        let segments: Vec<_> = self
            .chunker
            .split(source_id, text)
            .into_iter()
            .filter(|s| !s.text.trim().is_empty())
            .collect();
        if segments.is_empty() {
            tracing::warn!("📄 {source_id}: no content to index");
            return Ok(0);
        }

        let texts: Vec<&str> = segments.iter().map(|s| s.text.as_str()).collect();
        let vectors = self.embedder.embed_batch(&texts).await?;

        let count = segments.len();
        if vectors.len() != count {
            return Err(RagDeskError::Embedding(format!(
                "{} returned {} vector(s) for {} segment(s) of {source_id}",
                self.embedder.name(),
                vectors.len(),
                count
            )));
        }
        for (segment, vector) in segments.into_iter().zip(vectors) {
            collection.add(EmbeddedSegment { segment, vector })?;
        }
        Ok(count)
    }

    /// Build a collection from in-memory `(source_id, text)` documents.
    pub async fn build_collection(
        &self,
        name: &str,
        documents: &[(&str, &str)],
    ) -> Result<KnowledgeCollection> {
        let mut collection = KnowledgeCollection::new(name, self.embedder.dimension());
        for (source_id, text) in documents {
            self.ingest_text(&mut collection, source_id, text).await?;
        }
        Ok(collection)
    }

    /// Build a collection from the documents listed in its config entry.
    pub async fn load_collection(&self, config: &CollectionConfig) -> Result<KnowledgeCollection> {
        let mut collection = KnowledgeCollection::new(&config.name, self.embedder.dimension());
        for path in config.document_paths() {
            let text = load_document(&path, self.parser.as_ref()).await?;
            let source_id = source_id_for(&path);
            let count = self
                .ingest_text(&mut collection, &source_id, &text)
                .await?;
            tracing::debug!("📄 {} → {}: {} segment(s)", path.display(), config.name, count);
        }
        tracing::info!(
            "📚 Collection {} ready: {} segment(s)",
            config.label(),
            collection.len()
        );
        Ok(collection)
    }

    /// Build every configured collection concurrently, preserving order.
    pub async fn load_all(&self, configs: &[CollectionConfig]) -> Result<Vec<KnowledgeCollection>> {
        try_join_all(configs.iter().map(|c| self.load_collection(c))).await
    }
}

/// `docs/ml.txt` → `doc-ml`.
fn source_id_for(path: &Path) -> String {
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());
    format!("doc-{stem}")
}
