//! # RagDesk Core
//!
//! Shared building blocks for every RagDesk crate:
//! - [`config`] — TOML configuration with per-field defaults
//! - [`error`] — the workspace-wide error type
//! - [`types`] — chat messages, segments, queries, retrieval results
//! - [`traits`] — capability boundaries (`Provider`, `Embedder`)

pub mod config;
pub mod error;
pub mod traits;
pub mod types;

pub use config::RagDeskConfig;
pub use error::{RagDeskError, Result};
