//! The retrieval pipeline.
//!
//! One query flows through fixed stages: clean the text, call the search
//! provider under a timeout, apply the two-tier relevance gate, blend in
//! activation, bump and wire the surviving facts, expand one hop through the
//! co-occurrence graph, and render. Every gate exits early to an empty result;
//! no stage ever surfaces an error to the caller. Retrieval is an enrichment
//! layer, and a failed enrichment is just an empty one.

use rusqlite::Connection;
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use serde::Serialize;

use crate::config::EngramConfig;
use crate::memory::types::{Neighbor, ScoredCandidate, SearchHit};
use crate::memory::{activation, cooccurrence, scoring};
use crate::search::SearchProvider;

/// Header line of every rendered context block. Stripped back out of incoming
/// queries so our own output is never re-searched.
pub const CONTEXT_HEADER: &str = "[GRAPH MEMORY]";

/// Queries shorter than this (after cleaning) are not worth a search call.
const MIN_QUERY_CHARS: usize = 5;

/// Share of the normal activation bump applied to facts reached through the
/// graph rather than matched directly.
const EXPANSION_BUMP_FACTOR: f64 = 0.3;

/// The fully retrieved result set for one query.
#[derive(Debug, Default, Serialize)]
pub struct RetrievedContext {
    /// Directly retrieved facts, ranked by combined score.
    pub primary: Vec<ScoredCandidate>,
    /// Facts pulled in by one hop of spreading activation.
    pub linked: Vec<Neighbor>,
}

impl RetrievedContext {
    pub fn is_empty(&self) -> bool {
        self.primary.is_empty() && self.linked.is_empty()
    }

    /// Render the result as a single text block: header, primary facts
    /// grouped by entity (first-seen order) and deduplicated by answer text
    /// within each group, then linked facts tagged as derived.
    ///
    /// Pure function of the data — rendering twice is byte-identical. An
    /// empty result renders as an empty string, not a bare header.
    pub fn render(&self) -> String {
        if self.is_empty() {
            return String::new();
        }

        let mut lines = vec![CONTEXT_HEADER.to_string()];

        let mut entity_order: Vec<&str> = Vec::new();
        let mut groups: HashMap<&str, Vec<&ScoredCandidate>> = HashMap::new();
        for candidate in &self.primary {
            let entity = candidate.hit.entity.as_str();
            if !groups.contains_key(entity) {
                entity_order.push(entity);
            }
            groups.entry(entity).or_default().push(candidate);
        }

        for entity in entity_order {
            let mut seen: HashSet<&str> = HashSet::new();
            for candidate in &groups[entity] {
                if seen.insert(candidate.hit.answer.as_str()) {
                    lines.push(format!("• {}", candidate.hit.answer));
                }
            }
        }

        for neighbor in &self.linked {
            lines.push(format!(
                "• {}.{} = {} [linked]",
                neighbor.entity, neighbor.key, neighbor.value
            ));
        }

        lines.join("\n")
    }
}

/// The retrieval orchestrator.
///
/// Owns a handle to the shared store connection (opened once at startup) and
/// the search provider. Constructed without a store, it still retrieves —
/// ranking falls back to relevance only and no learning updates happen.
pub struct Retriever {
    store: Option<Arc<Mutex<Connection>>>,
    provider: Arc<dyn SearchProvider>,
    config: Arc<EngramConfig>,
}

impl Retriever {
    pub fn new(
        store: Option<Arc<Mutex<Connection>>>,
        provider: Arc<dyn SearchProvider>,
        config: Arc<EngramConfig>,
    ) -> Self {
        if store.is_none() {
            tracing::warn!("no fact store attached — activation features disabled");
        }
        Self {
            store,
            provider,
            config,
        }
    }

    /// Run one query through the full pipeline.
    pub async fn retrieve(&self, raw_text: &str) -> RetrievedContext {
        let started = Instant::now();
        let retrieval = &self.config.retrieval;

        let Some(query) = clean_query(raw_text) else {
            tracing::debug!(raw_len = raw_text.len(), "query empty after cleaning, skipping");
            return RetrievedContext::default();
        };

        let hits = self.search_bounded(&query).await;
        if hits.is_empty() {
            self.trace_outcome(&query, started, 0, 0);
            return RetrievedContext::default();
        }

        let filtered = scoring::filter_candidates(hits, retrieval.min_score);
        if filtered.is_empty() {
            tracing::debug!("no entity-matched candidates, rejecting result set");
            self.trace_outcome(&query, started, 0, 0);
            return RetrievedContext::default();
        }

        let mut primary = match self.read_activations(&filtered) {
            Some(activations) => scoring::score_candidates(
                filtered,
                &activations,
                retrieval.relevance_weight,
                retrieval.activation_weight,
            ),
            None => scoring::passthrough_candidates(filtered),
        };
        primary.truncate(retrieval.max_results);

        let fact_ids = valid_fact_ids(&primary);
        self.apply_learning(&fact_ids);

        let linked = self.expand(&fact_ids);
        let linked_ids: Vec<i64> = linked.iter().map(|n| n.id).collect();
        self.bump_best_effort(
            &linked_ids,
            retrieval.activation_bump * EXPANSION_BUMP_FACTOR,
        );

        self.trace_outcome(&query, started, primary.len(), linked.len());
        RetrievedContext { primary, linked }
    }

    /// Convenience wrapper: run the pipeline and render the text block.
    pub async fn retrieve_block(&self, raw_text: &str) -> String {
        self.retrieve(raw_text).await.render()
    }

    /// Call the provider under the configured timeout. Timeouts, process
    /// failures, and malformed responses all collapse to an empty candidate
    /// set — search trouble must never break the surrounding system.
    async fn search_bounded(&self, query: &str) -> Vec<SearchHit> {
        let timeout = Duration::from_millis(self.config.search.timeout_ms);
        let limit = self.config.retrieval.max_results;

        match tokio::time::timeout(timeout, self.provider.search(query, limit)).await {
            Ok(Ok(hits)) => hits,
            Ok(Err(err)) => {
                tracing::warn!(error = %err, "search provider failed");
                Vec::new()
            }
            Err(_) => {
                tracing::warn!(timeout_ms = self.config.search.timeout_ms, "search timed out");
                Vec::new()
            }
        }
    }

    /// Read activations for every candidate that has a fact id. `None` means
    /// the store is unreachable (or there is nothing to read) and scoring
    /// should fall through to relevance-only.
    fn read_activations(&self, hits: &[SearchHit]) -> Option<HashMap<i64, f64>> {
        let store = self.store.as_ref()?;
        let ids: Vec<i64> = hits.iter().filter_map(|h| h.fact_id).filter(|&id| id > 0).collect();
        if ids.is_empty() {
            return None;
        }

        let conn = match store.lock() {
            Ok(conn) => conn,
            Err(err) => {
                tracing::warn!(error = %err, "store lock poisoned, skipping activation read");
                return None;
            }
        };
        match activation::read_activations(&conn, &ids) {
            Ok(map) => Some(map),
            Err(err) => {
                tracing::warn!(error = %err, "activation read failed, ranking by relevance only");
                None
            }
        }
    }

    /// Bump and wire the retrieved facts. Cannot fail the caller: storage
    /// errors are logged and swallowed, because learning is a side channel of
    /// the query, not its deliverable.
    fn apply_learning(&self, fact_ids: &[i64]) {
        let Some(store) = self.store.as_ref() else {
            return;
        };
        if fact_ids.is_empty() {
            return;
        }

        let mut conn = match store.lock() {
            Ok(conn) => conn,
            Err(err) => {
                tracing::warn!(error = %err, "store lock poisoned, skipping learning update");
                return;
            }
        };

        if let Err(err) =
            activation::bump_activations(&mut conn, fact_ids, self.config.retrieval.activation_bump)
        {
            tracing::warn!(error = %err, "activation bump failed");
        }
        if let Err(err) = cooccurrence::reinforce(&mut conn, fact_ids) {
            tracing::warn!(error = %err, "co-occurrence reinforcement failed");
        }
    }

    /// One hop of spreading activation from the retrieved set. Infallible for
    /// the same reason as [`apply_learning`].
    fn expand(&self, fact_ids: &[i64]) -> Vec<Neighbor> {
        let Some(store) = self.store.as_ref() else {
            return Vec::new();
        };
        if fact_ids.is_empty() {
            return Vec::new();
        }

        let conn = match store.lock() {
            Ok(conn) => conn,
            Err(err) => {
                tracing::warn!(error = %err, "store lock poisoned, skipping expansion");
                return Vec::new();
            }
        };
        match cooccurrence::neighbors(
            &conn,
            fact_ids,
            self.config.retrieval.co_occurrence_limit,
            self.config.retrieval.co_occurrence_min_weight,
        ) {
            Ok(neighbors) => neighbors,
            Err(err) => {
                tracing::warn!(error = %err, "co-occurrence expansion failed");
                Vec::new()
            }
        }
    }

    fn bump_best_effort(&self, fact_ids: &[i64], amount: f64) {
        let Some(store) = self.store.as_ref() else {
            return;
        };
        if fact_ids.is_empty() {
            return;
        }

        let mut conn = match store.lock() {
            Ok(conn) => conn,
            Err(err) => {
                tracing::warn!(error = %err, "store lock poisoned, skipping bump");
                return;
            }
        };
        if let Err(err) = activation::bump_activations(&mut conn, fact_ids, amount) {
            tracing::warn!(error = %err, "expansion activation bump failed");
        }
    }

    fn trace_outcome(&self, query: &str, started: Instant, results: usize, linked: usize) {
        tracing::info!(
            query_len = query.len(),
            latency_ms = started.elapsed().as_millis() as u64,
            results,
            linked,
            injected = results > 0,
            "fact retrieval complete"
        );
    }
}

/// Ids eligible for activation learning: present and positive.
fn valid_fact_ids(candidates: &[ScoredCandidate]) -> Vec<i64> {
    candidates
        .iter()
        .filter_map(|c| c.hit.fact_id)
        .filter(|&id| id > 0)
        .collect()
}

/// Strip previously injected context from a raw query and validate length.
///
/// Injected blocks (our own header, sibling `[... CONTEXT]` markers, and
/// `System:` lines) start at their marker line and run to the next blank
/// line. If what remains is shorter than [`MIN_QUERY_CHARS`], there is
/// nothing to search — echoed context must not feed back into the engine.
pub fn clean_query(raw: &str) -> Option<String> {
    if raw.trim().chars().count() < MIN_QUERY_CHARS {
        return None;
    }

    let mut kept: Vec<&str> = Vec::new();
    let mut skipping = false;
    for line in raw.lines() {
        let trimmed = line.trim_start();
        if skipping {
            if trimmed.is_empty() {
                skipping = false;
            }
            continue;
        }
        if is_context_marker(trimmed) {
            skipping = true;
            continue;
        }
        if trimmed.starts_with("System:") {
            continue;
        }
        kept.push(line);
    }

    let cleaned = kept.join("\n").trim().to_string();
    if cleaned.chars().count() < MIN_QUERY_CHARS {
        return None;
    }
    Some(cleaned)
}

/// A line that opens an injected context block.
fn is_context_marker(line: &str) -> bool {
    if line.starts_with(CONTEXT_HEADER) {
        return true;
    }
    // Sibling injectors use the same bracketed convention, e.g.
    // "[CONTINUITY CONTEXT]" or "[STABILITY CONTEXT]".
    line.starts_with('[') && line.contains("CONTEXT]")
}
