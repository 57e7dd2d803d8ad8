//! Core fact and candidate type definitions.
//!
//! Defines [`Fact`] (a row in the `facts` table), [`SearchHit`] (a raw
//! candidate from the search provider), [`ScoredCandidate`] (a hit after
//! ranking), and [`Neighbor`] (a fact reached through the co-occurrence graph).

use serde::{Deserialize, Serialize};

/// A fact record, matching the `facts` table schema.
///
/// Content fields are immutable once ingested; `activation`, `access_count`,
/// and `last_accessed` are learned state that only the activation tracker
/// mutates, and only upward.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Fact {
    /// Integer primary key, referenced by search hits and co-occurrence edges.
    pub id: i64,
    /// The entity this fact is about (e.g. a person, project, or place).
    pub entity: String,
    /// Attribute name within the entity (e.g. `"birthday"`, `"language"`).
    pub key: String,
    /// Attribute value.
    pub value: String,
    /// Optional grouping category.
    pub category: Option<String>,
    /// Rendered textual form of the fact, used verbatim in output.
    pub answer: String,
    /// Monotonically increasing retrieval-strength signal.
    pub activation: f64,
    /// Ingestion-time importance weight.
    pub importance: f64,
    /// Number of times this fact has been retrieved.
    pub access_count: u32,
    /// ISO 8601 timestamp of the last retrieval, or `None` if never retrieved.
    pub last_accessed: Option<String>,
    /// ISO 8601 ingestion timestamp.
    pub created_at: String,
}

/// A new fact to ingest, before it has an assigned row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewFact {
    /// Explicit id to insert under, or `None` to let SQLite assign one.
    #[serde(default)]
    pub id: Option<i64>,
    pub entity: String,
    pub key: String,
    pub value: String,
    #[serde(default)]
    pub category: Option<String>,
    /// Rendered form; defaults to `"entity.key = value"` when absent.
    #[serde(default)]
    pub answer: Option<String>,
    #[serde(default = "default_importance")]
    pub importance: f64,
}

fn default_importance() -> f64 {
    0.5
}

impl NewFact {
    /// The rendered answer text, falling back to the canonical form.
    pub fn rendered_answer(&self) -> String {
        match &self.answer {
            Some(a) => a.clone(),
            None => format!("{}.{} = {}", self.entity, self.key, self.value),
        }
    }
}

/// One candidate from the external search provider.
///
/// `score` is the provider's relevance in [0, 100]. `fact_id` is `None` when
/// the provider matched text that has no backing fact row; such hits can be
/// ranked and rendered but take no part in activation learning.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchHit {
    pub entity: String,
    pub key: String,
    #[serde(default)]
    pub value: String,
    #[serde(default)]
    pub category: Option<String>,
    pub answer: String,
    pub score: f64,
    #[serde(default)]
    pub fact_id: Option<i64>,
}

/// A search hit after the scoring pass.
#[derive(Debug, Clone, Serialize)]
pub struct ScoredCandidate {
    #[serde(flatten)]
    pub hit: SearchHit,
    /// Weighted blend of normalized relevance and normalized activation.
    /// Equal to normalized relevance alone when activation was unreachable.
    pub combined_score: f64,
    /// The activation value used for scoring, when available.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub activation: Option<f64>,
}

/// A fact pulled in by one hop of spreading activation.
#[derive(Debug, Clone, Serialize)]
pub struct Neighbor {
    pub id: i64,
    pub entity: String,
    pub key: String,
    pub value: String,
    pub category: Option<String>,
    pub activation: f64,
    pub importance: f64,
    /// Edge weight summed over every source fact that links here.
    pub total_weight: f64,
}
