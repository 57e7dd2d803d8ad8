//! Aggregate statistics over the fact store.

use anyhow::Result;
use rusqlite::Connection;
use serde::Serialize;

/// A fact summary line in the stats report.
#[derive(Debug, Serialize)]
pub struct TopFact {
    pub id: i64,
    pub entity: String,
    pub key: String,
    pub activation: f64,
    pub access_count: u32,
}

/// A strong co-occurrence edge in the stats report. Only one direction of
/// each symmetric pair is listed.
#[derive(Debug, Serialize)]
pub struct StrongEdge {
    pub fact_a: i64,
    pub fact_b: i64,
    pub weight: f64,
}

/// Response from [`store_stats`].
#[derive(Debug, Serialize)]
pub struct StatsResponse {
    pub fact_count: u64,
    pub edge_count: u64,
    pub total_accesses: u64,
    pub max_activation: f64,
    pub mean_activation: f64,
    pub top_facts: Vec<TopFact>,
    pub strongest_edges: Vec<StrongEdge>,
}

/// Collect store-wide counters plus the most activated facts and the
/// strongest co-occurrence edges.
pub fn store_stats(conn: &Connection, top_n: usize) -> Result<StatsResponse> {
    let fact_count: u64 =
        conn.query_row("SELECT COUNT(*) FROM facts", [], |r| r.get::<_, i64>(0))? as u64;
    let edge_count: u64 =
        conn.query_row("SELECT COUNT(*) FROM co_occurrences", [], |r| r.get::<_, i64>(0))? as u64;

    let (total_accesses, max_activation, mean_activation): (u64, f64, f64) = conn.query_row(
        "SELECT COALESCE(SUM(access_count), 0), \
                COALESCE(MAX(activation), 0), \
                COALESCE(AVG(activation), 0) \
         FROM facts",
        [],
        |r| Ok((r.get::<_, i64>(0)? as u64, r.get(1)?, r.get(2)?)),
    )?;

    let mut stmt = conn.prepare(
        "SELECT id, entity, key, activation, access_count \
         FROM facts ORDER BY activation DESC, id LIMIT ?1",
    )?;
    let top_facts = stmt
        .query_map([top_n as i64], |row| {
            Ok(TopFact {
                id: row.get(0)?,
                entity: row.get(1)?,
                key: row.get(2)?,
                activation: row.get(3)?,
                access_count: row.get(4)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;

    // fact_a < fact_b picks one row per symmetric pair
    let mut stmt = conn.prepare(
        "SELECT fact_a, fact_b, weight FROM co_occurrences \
         WHERE fact_a < fact_b ORDER BY weight DESC, fact_a LIMIT ?1",
    )?;
    let strongest_edges = stmt
        .query_map([top_n as i64], |row| {
            Ok(StrongEdge {
                fact_a: row.get(0)?,
                fact_b: row.get(1)?,
                weight: row.get(2)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(StatsResponse {
        fact_count,
        edge_count,
        total_accesses,
        max_activation,
        mean_activation,
        top_facts,
        strongest_edges,
    })
}
