//! External search provider interface.
//!
//! Provides the [`SearchProvider`] trait and the subprocess implementation
//! that shells out to a graph-search script. The provider is created via
//! [`create_provider`] from configuration. How candidates are found (lexical,
//! embeddings, anything else) is entirely the provider's business — the
//! engine only consumes relevance-scored [`SearchHit`] rows.

pub mod command;

use async_trait::async_trait;
use thiserror::Error;

use crate::memory::types::SearchHit;

/// Failure modes of a search call. The retrieval pipeline maps every variant
/// to an empty candidate set; the distinction exists for logs and tests.
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("failed to spawn search process: {0}")]
    Spawn(#[from] std::io::Error),

    #[error("search process exited with {status}: {stderr}")]
    Failed { status: String, stderr: String },

    #[error("malformed search response: {0}")]
    Malformed(#[from] serde_json::Error),
}

/// Trait for turning a query into relevance-scored fact candidates.
///
/// Implementations are invoked with the cleaned query text and a result-count
/// hint. They are not responsible for time-boxing — the retrieval pipeline
/// wraps every call in its configured timeout.
#[async_trait]
pub trait SearchProvider: Send + Sync {
    /// Search for candidates matching `query`, returning up to `limit` hits
    /// ranked by the provider's own relevance.
    async fn search(&self, query: &str, limit: usize) -> Result<Vec<SearchHit>, ProviderError>;
}

/// Create a search provider from config.
///
/// Currently only `"command"` (subprocess invocation) is supported.
pub fn create_provider(
    config: &crate::config::SearchConfig,
) -> anyhow::Result<Box<dyn SearchProvider>> {
    match config.provider.as_str() {
        "command" => {
            let provider = command::CommandProvider::new(config);
            Ok(Box::new(provider))
        }
        other => anyhow::bail!("unknown search provider: {other}. Supported: command"),
    }
}
