use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct EngramConfig {
    pub logging: LoggingConfig,
    pub storage: StorageConfig,
    pub search: SearchConfig,
    pub retrieval: RetrievalConfig,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct StorageConfig {
    pub db_path: String,
}

/// External search provider invocation.
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct SearchConfig {
    /// Provider kind. Currently only `"command"` (subprocess) is supported.
    pub provider: String,
    /// Interpreter or executable to spawn.
    pub program: String,
    /// Script path handed to the program before the query text.
    pub script: String,
    /// Wall-clock bound on a single search call, in milliseconds.
    pub timeout_ms: u64,
}

/// Ranking and learning knobs for the retrieval pipeline.
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct RetrievalConfig {
    /// Top-K cap on primary results.
    pub max_results: usize,
    /// Relevance floor for full-text-only candidates (0–100).
    pub min_score: f64,
    /// Activation added to each fact on retrieval.
    pub activation_bump: f64,
    /// Share of the combined score taken from normalized activation.
    pub activation_weight: f64,
    /// Share of the combined score taken from search relevance.
    pub relevance_weight: f64,
    /// Max co-occurring facts pulled in by graph expansion.
    pub co_occurrence_limit: usize,
    /// Minimum summed edge weight for a fact to qualify as a neighbor.
    pub co_occurrence_min_weight: f64,
}

impl Default for EngramConfig {
    fn default() -> Self {
        Self {
            logging: LoggingConfig::default(),
            storage: StorageConfig::default(),
            search: SearchConfig::default(),
            retrieval: RetrievalConfig::default(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".into(),
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        let db_path = default_engram_dir()
            .join("facts.db")
            .to_string_lossy()
            .into_owned();
        Self { db_path }
    }
}

impl Default for SearchConfig {
    fn default() -> Self {
        let script = default_engram_dir()
            .join("graph-search.py")
            .to_string_lossy()
            .into_owned();
        Self {
            provider: "command".into(),
            program: "python3".into(),
            script,
            timeout_ms: 2000,
        }
    }
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            max_results: 8,
            min_score: 50.0,
            activation_bump: 0.5,
            activation_weight: 0.3,
            relevance_weight: 0.7,
            co_occurrence_limit: 4,
            co_occurrence_min_weight: 2.0,
        }
    }
}

/// Returns `~/.engram/`
pub fn default_engram_dir() -> PathBuf {
    dirs::home_dir()
        .expect("home directory must exist")
        .join(".engram")
}

/// Returns the default config file path: `~/.engram/config.toml`
pub fn default_config_path() -> PathBuf {
    default_engram_dir().join("config.toml")
}

impl EngramConfig {
    /// Load config from TOML file (if it exists) then apply env var overrides.
    pub fn load() -> Result<Self> {
        Self::load_from(default_config_path())
    }

    /// Load from a specific path, then apply env var overrides.
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let mut config = if path.exists() {
            let contents =
                std::fs::read_to_string(path).context("failed to read config file")?;
            toml::from_str(&contents).context("failed to parse config TOML")?
        } else {
            info!("no config file at {}, using defaults", path.display());
            EngramConfig::default()
        };

        config.apply_env_overrides();
        config.warn_on_suspect_values();
        Ok(config)
    }

    /// Apply environment variable overrides (ENGRAM_DB, ENGRAM_LOG_LEVEL).
    fn apply_env_overrides(&mut self) {
        if let Ok(val) = std::env::var("ENGRAM_DB") {
            self.storage.db_path = val;
        }
        if let Ok(val) = std::env::var("ENGRAM_LOG_LEVEL") {
            self.logging.level = val;
        }
    }

    /// Scoring weights are not forced to sum to 1.0; combined scores may then
    /// leave [0,1]. A stray sum is still worth flagging.
    fn warn_on_suspect_values(&self) {
        let sum = self.retrieval.relevance_weight + self.retrieval.activation_weight;
        if (sum - 1.0).abs() > 1e-6 {
            warn!(
                relevance_weight = self.retrieval.relevance_weight,
                activation_weight = self.retrieval.activation_weight,
                "scoring weights sum to {sum}, not 1.0 — combined scores will be skewed"
            );
        }
        if !(0.0..=100.0).contains(&self.retrieval.min_score) {
            warn!(
                min_score = self.retrieval.min_score,
                "min_score is outside the 0-100 relevance range"
            );
        }
    }

    /// Resolve the database path, expanding `~` if needed.
    pub fn resolved_db_path(&self) -> PathBuf {
        expand_tilde(&self.storage.db_path)
    }

    /// Resolve the search script path, expanding `~` if needed.
    pub fn resolved_script_path(&self) -> PathBuf {
        expand_tilde(&self.search.script)
    }
}

pub fn expand_tilde(path: &str) -> PathBuf {
    if let Some(rest) = path.strip_prefix("~/") {
        dirs::home_dir()
            .expect("home directory must exist")
            .join(rest)
    } else {
        PathBuf::from(path)
    }
}
