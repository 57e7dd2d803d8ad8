//! Per-fact activation tracking.
//!
//! Activation is a monotonically increasing scalar recording how often and how
//! recently a fact has been retrieved. Every retrieval bumps it additively;
//! nothing ever lowers it. The scoring pass normalizes it per batch, so the
//! absolute magnitude never needs rescaling.

use anyhow::Result;
use rusqlite::{params, Connection};
use std::collections::HashMap;

/// Read current activation for the given fact ids.
///
/// Ids with no backing row are simply absent from the result — not an error.
pub fn read_activations(conn: &Connection, ids: &[i64]) -> Result<HashMap<i64, f64>> {
    if ids.is_empty() {
        return Ok(HashMap::new());
    }

    let placeholders: Vec<String> = (1..=ids.len()).map(|i| format!("?{i}")).collect();
    let sql = format!(
        "SELECT id, activation FROM facts WHERE id IN ({})",
        placeholders.join(", ")
    );

    let mut stmt = conn.prepare(&sql)?;
    let sql_params: Vec<&dyn rusqlite::types::ToSql> =
        ids.iter().map(|id| id as &dyn rusqlite::types::ToSql).collect();

    let rows = stmt
        .query_map(sql_params.as_slice(), |row| {
            Ok((row.get::<_, i64>(0)?, row.get::<_, f64>(1)?))
        })?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(rows.into_iter().collect())
}

/// Add `amount` to each fact's activation, increment its access count, and
/// stamp `last_accessed`. The whole batch commits atomically so concurrent
/// queries never observe a partially bumped set. No-op on an empty id list.
pub fn bump_activations(conn: &mut Connection, ids: &[i64], amount: f64) -> Result<()> {
    if ids.is_empty() {
        return Ok(());
    }

    let now = chrono::Utc::now().to_rfc3339();
    let tx = conn.transaction()?;
    {
        let mut stmt = tx.prepare(
            "UPDATE facts SET activation = activation + ?1, \
             access_count = access_count + 1, last_accessed = ?2 \
             WHERE id = ?3",
        )?;
        for id in ids {
            stmt.execute(params![amount, now, id])?;
        }
    }
    tx.commit()?;

    Ok(())
}
