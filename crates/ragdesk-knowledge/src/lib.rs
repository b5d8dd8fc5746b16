//! # RagDesk Knowledge
//!
//! Small, fixed set of in-memory topic collections built once at startup.
//!
//! ## Design
//! - **Chunker** — overlapping, boundary-aware windows (default 300 chars, 30 overlap)
//! - **Embedder** — any `ragdesk_core::traits::Embedder`, shared by ingestion and queries
//! - **Collection** — brute-force cosine search, scores mapped to `[0, 1]`
//! - **Retriever** — one collection + fixed `max_results` / `min_score`
//!
//! ## How it works
//! ```text
//! docs/ml.txt, docs/rag.txt
//!   ↓ PlainTextParser
//! Chunker.split() → segments
//!   ↓ Embedder.embed_batch()
//! KnowledgeCollection ("ml", "rag")  — Arc, read-only
//!   ↓
//! ContentRetriever.retrieve("what is RAG?") → top-K segments
//! ```

pub mod chunker;
pub mod collection;
pub mod ingest;
pub mod parser;
pub mod retriever;

pub use chunker::Chunker;
pub use collection::KnowledgeCollection;
pub use ingest::Ingestor;
pub use parser::{DocumentParser, PlainTextParser};
pub use retriever::ContentRetriever;
