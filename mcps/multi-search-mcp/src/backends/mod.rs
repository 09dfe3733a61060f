//! Search backend implementations
//!
//! Each backend implements [`SearchProvider`] and returns normalized
//! [`SearchResult`]s. Zero hits is `Ok(vec![])`, never an error.

use async_trait::async_trait;

use crate::error::BackendError;
use crate::types::{ProviderKind, SearchResult};

pub mod google;
pub mod ollama;

pub use google::GoogleBackend;
pub use ollama::OllamaBackend;

/// Trait for search providers
#[async_trait]
pub trait SearchProvider: Send + Sync {
    /// Which backend this is, used for provenance and logging
    fn kind(&self) -> ProviderKind;

    /// Search for `query`, returning at most `count` results
    async fn search(&self, query: &str, count: usize) -> Result<Vec<SearchResult>, BackendError>;
}
