//! Fact ingestion and point reads.
//!
//! The retrieval pipeline never creates facts — ingestion happens out of band
//! (the `import` command, or whatever external process feeds the store). This
//! module is that surface: insert a fact row, check existence, hydrate by id.

use anyhow::Result;
use rusqlite::{params, Connection, OptionalExtension};

use crate::memory::types::{Fact, NewFact};

/// Insert a fact row. Returns the row id (assigned or explicit).
///
/// Fails if an explicit id already exists — callers that tolerate duplicates
/// should check [`fact_exists`] first.
pub fn insert_fact(conn: &Connection, fact: &NewFact) -> Result<i64> {
    let now = chrono::Utc::now().to_rfc3339();
    let answer = fact.rendered_answer();

    conn.execute(
        "INSERT INTO facts (id, entity, key, value, category, answer, importance, created_at) \
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        params![
            fact.id,
            fact.entity,
            fact.key,
            fact.value,
            fact.category,
            answer,
            fact.importance,
            now
        ],
    )?;

    Ok(conn.last_insert_rowid())
}

/// Whether a fact row with this id exists.
pub fn fact_exists(conn: &Connection, id: i64) -> Result<bool> {
    let exists: bool = conn.query_row(
        "SELECT COUNT(*) > 0 FROM facts WHERE id = ?1",
        params![id],
        |row| row.get(0),
    )?;
    Ok(exists)
}

/// Fetch a single fact by id, or `None` if absent.
pub fn get_fact(conn: &Connection, id: i64) -> Result<Option<Fact>> {
    let fact = conn
        .query_row(
            "SELECT id, entity, key, value, category, answer, activation, importance, \
             access_count, last_accessed, created_at \
             FROM facts WHERE id = ?1",
            params![id],
            |row| {
                Ok(Fact {
                    id: row.get(0)?,
                    entity: row.get(1)?,
                    key: row.get(2)?,
                    value: row.get(3)?,
                    category: row.get(4)?,
                    answer: row.get(5)?,
                    activation: row.get(6)?,
                    importance: row.get(7)?,
                    access_count: row.get(8)?,
                    last_accessed: row.get(9)?,
                    created_at: row.get(10)?,
                })
            },
        )
        .optional()?;
    Ok(fact)
}
