//! Candidate filtering and combined scoring.
//!
//! Filtering is a two-tier relevance gate: entity-matched candidates
//! (relevance ≥ 65) always pass, while weaker full-text matches pass only when
//! at least one entity match anchors the query. A query with nothing but
//! keyword-level matches yields nothing at all — precision over recall.
//!
//! Scoring blends the provider's relevance with per-fact activation, each
//! normalized to [0,1], under configurable weights.

use std::collections::HashMap;

use crate::memory::types::{ScoredCandidate, SearchHit};

/// Relevance at or above this means the provider matched the entity itself,
/// not just free text.
pub const ENTITY_MATCH_FLOOR: f64 = 65.0;

/// Activation assumed for candidates with no stored activation row.
const DEFAULT_ACTIVATION: f64 = 1.0;

/// Apply the two-tier relevance gate.
///
/// Tier 1 (entity-matched, `score >= 65`) always passes. Tier 2
/// (`min_score <= score < 65`) passes only when tier 1 is non-empty; with no
/// entity match at all the whole candidate set is rejected. Within each tier
/// the provider's ordering is preserved, tier 1 first.
pub fn filter_candidates(hits: Vec<SearchHit>, min_score: f64) -> Vec<SearchHit> {
    let (entity_matched, rest): (Vec<SearchHit>, Vec<SearchHit>) = hits
        .into_iter()
        .partition(|hit| hit.score >= ENTITY_MATCH_FLOOR);

    if entity_matched.is_empty() {
        return Vec::new();
    }

    let mut filtered = entity_matched;
    filtered.extend(rest.into_iter().filter(|hit| hit.score >= min_score));
    filtered
}

/// Blend relevance and activation into a combined score and rank by it.
///
/// Activation is normalized by the batch maximum (floored at 1.0 so an
/// all-zero batch divides by 1, not 0) and capped at 1.0; relevance is
/// normalized from its 0–100 range. Candidates without an activation row
/// score as if their activation were 1.0. The sort is stable, so equal
/// combined scores keep their filter-gate order.
pub fn score_candidates(
    hits: Vec<SearchHit>,
    activations: &HashMap<i64, f64>,
    relevance_weight: f64,
    activation_weight: f64,
) -> Vec<ScoredCandidate> {
    let max_activation = activations.values().copied().fold(1.0_f64, f64::max);

    let mut scored: Vec<ScoredCandidate> = hits
        .into_iter()
        .map(|hit| {
            let activation = hit
                .fact_id
                .and_then(|id| activations.get(&id).copied())
                .unwrap_or(DEFAULT_ACTIVATION);
            let norm_activation = (activation / max_activation).min(1.0);
            let norm_relevance = hit.score / 100.0;
            let combined_score =
                norm_relevance * relevance_weight + norm_activation * activation_weight;
            ScoredCandidate {
                hit,
                combined_score,
                activation: Some(activation),
            }
        })
        .collect();

    scored.sort_by(|a, b| {
        b.combined_score
            .partial_cmp(&a.combined_score)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    scored
}

/// Fallback ranking when the store is unreachable: keep the filter-gate order
/// and carry normalized relevance as the whole score.
pub fn passthrough_candidates(hits: Vec<SearchHit>) -> Vec<ScoredCandidate> {
    hits.into_iter()
        .map(|hit| {
            let combined_score = hit.score / 100.0;
            ScoredCandidate {
                hit,
                combined_score,
                activation: None,
            }
        })
        .collect()
}
