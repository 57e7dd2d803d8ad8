//! Subprocess search provider.
//!
//! Spawns the configured program (typically a Python graph-search script) with
//! the query text and a `--top-k` hint, and parses its stdout as a JSON array
//! of candidates. Anything other than a clean exit with a well-formed array is
//! an error — the pipeline degrades it to an empty candidate set.

use async_trait::async_trait;
use tokio::process::Command;

use crate::config::SearchConfig;
use crate::memory::types::SearchHit;
use crate::search::{ProviderError, SearchProvider};

/// Search provider that executes an external command per query.
pub struct CommandProvider {
    program: String,
    script: String,
}

impl CommandProvider {
    pub fn new(config: &SearchConfig) -> Self {
        Self {
            program: config.program.clone(),
            script: crate::config::expand_tilde(&config.script)
                .to_string_lossy()
                .into_owned(),
        }
    }
}

#[async_trait]
impl SearchProvider for CommandProvider {
    async fn search(&self, query: &str, limit: usize) -> Result<Vec<SearchHit>, ProviderError> {
        let output = Command::new(&self.program)
            .arg(&self.script)
            .arg(query)
            .arg("--json")
            .arg("--top-k")
            .arg(limit.to_string())
            .kill_on_drop(true)
            .output()
            .await?;

        if !output.status.success() {
            return Err(ProviderError::Failed {
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            });
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        let hits: Vec<SearchHit> = serde_json::from_str(stdout.trim())?;

        tracing::debug!(hits = hits.len(), "search provider returned candidates");
        Ok(hits)
    }
}
