#![allow(dead_code)]

use async_trait::async_trait;
use engram::config::EngramConfig;
use engram::memory::retrieval::Retriever;
use engram::memory::store::insert_fact;
use engram::memory::types::{NewFact, SearchHit};
use engram::search::{ProviderError, SearchProvider};
use rusqlite::Connection;
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Open a fresh in-memory database with the schema applied.
pub fn test_db() -> Connection {
    engram::db::open_memory_database().unwrap()
}

/// Insert a fact under an explicit id. The answer takes the canonical
/// `entity.key = value` form.
pub fn seed_fact(conn: &Connection, id: i64, entity: &str, key: &str, value: &str) {
    insert_fact(
        conn,
        &NewFact {
            id: Some(id),
            entity: entity.into(),
            key: key.into(),
            value: value.into(),
            category: None,
            answer: None,
            importance: 0.5,
        },
    )
    .unwrap();
}

/// Build a provider-style hit with the canonical answer form.
pub fn hit(entity: &str, key: &str, value: &str, score: f64, fact_id: Option<i64>) -> SearchHit {
    SearchHit {
        entity: entity.into(),
        key: key.into(),
        value: value.into(),
        category: None,
        answer: format!("{entity}.{key} = {value}"),
        score,
        fact_id,
    }
}

/// Provider that returns the same candidate list for every query.
pub struct StaticProvider {
    pub hits: Vec<SearchHit>,
}

#[async_trait]
impl SearchProvider for StaticProvider {
    async fn search(&self, _query: &str, _limit: usize) -> Result<Vec<SearchHit>, ProviderError> {
        Ok(self.hits.clone())
    }
}

/// Provider that always fails, as if the search backend were down.
pub struct FailingProvider;

#[async_trait]
impl SearchProvider for FailingProvider {
    async fn search(&self, _query: &str, _limit: usize) -> Result<Vec<SearchHit>, ProviderError> {
        Err(ProviderError::Failed {
            status: "exit status: 1".into(),
            stderr: "search backend down".into(),
        })
    }
}

/// Provider that sleeps before answering — for timeout tests.
pub struct SlowProvider {
    pub delay_ms: u64,
    pub hits: Vec<SearchHit>,
}

#[async_trait]
impl SearchProvider for SlowProvider {
    async fn search(&self, _query: &str, _limit: usize) -> Result<Vec<SearchHit>, ProviderError> {
        tokio::time::sleep(Duration::from_millis(self.delay_ms)).await;
        Ok(self.hits.clone())
    }
}

/// Wire a retriever over the given connection and provider. Returns the
/// store handle too, so tests can inspect learned state afterwards.
pub fn retriever_with(
    conn: Connection,
    provider: impl SearchProvider + 'static,
    config: EngramConfig,
) -> (Retriever, Arc<Mutex<Connection>>) {
    let store = Arc::new(Mutex::new(conn));
    let provider: Arc<dyn SearchProvider> = Arc::new(provider);
    let retriever = Retriever::new(Some(store.clone()), provider, Arc::new(config));
    (retriever, store)
}

/// A retriever with no backing store at all.
pub fn storeless_retriever(
    provider: impl SearchProvider + 'static,
    config: EngramConfig,
) -> Retriever {
    let provider: Arc<dyn SearchProvider> = Arc::new(provider);
    Retriever::new(None, provider, Arc::new(config))
}

/// Read a fact's activation directly.
pub fn activation_of(store: &Arc<Mutex<Connection>>, id: i64) -> f64 {
    let conn = store.lock().unwrap();
    conn.query_row(
        "SELECT activation FROM facts WHERE id = ?1",
        [id],
        |row| row.get(0),
    )
    .unwrap()
}

/// Read a directed edge weight directly, or `None` if the edge is absent.
pub fn edge_weight(store: &Arc<Mutex<Connection>>, a: i64, b: i64) -> Option<f64> {
    let conn = store.lock().unwrap();
    conn.query_row(
        "SELECT weight FROM co_occurrences WHERE fact_a = ?1 AND fact_b = ?2",
        [a, b],
        |row| row.get(0),
    )
    .ok()
}
