//! Capability traits implemented by the provider crate.

pub mod embedding;
pub mod provider;

pub use embedding::Embedder;
pub use provider::{GenerateParams, Provider};
