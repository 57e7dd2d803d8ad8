//! Weighted co-occurrence graph between facts.
//!
//! Edges record how often two facts were retrieved together. The graph is
//! logically undirected: every reinforcement writes both directed rows in the
//! same transaction, so `(a,b)` and `(b,a)` carry identical weight at all
//! times. Weight only increases.

use anyhow::Result;
use rusqlite::{params, Connection};

use crate::memory::types::Neighbor;

/// Strengthen every pairwise edge among facts retrieved together.
///
/// For `n` ids this performs `n·(n-1)` directed upserts — `n` is bounded by
/// the retrieval top-K, so the quadratic write count stays single-digit.
/// Fewer than two ids is a no-op.
pub fn reinforce(conn: &mut Connection, ids: &[i64]) -> Result<()> {
    if ids.len() < 2 {
        return Ok(());
    }

    let now = chrono::Utc::now().to_rfc3339();
    let tx = conn.transaction()?;
    {
        let mut stmt = tx.prepare(
            "INSERT INTO co_occurrences (fact_a, fact_b, weight, last_wired) \
             VALUES (?1, ?2, 1.0, ?3) \
             ON CONFLICT(fact_a, fact_b) DO UPDATE SET \
                 weight = weight + 1.0, \
                 last_wired = ?3",
        )?;
        for i in 0..ids.len() {
            for j in (i + 1)..ids.len() {
                stmt.execute(params![ids[i], ids[j], now])?;
                stmt.execute(params![ids[j], ids[i], now])?;
            }
        }
    }
    tx.commit()?;

    Ok(())
}

/// One hop of spreading activation: facts linked to any of `ids` through the
/// co-occurrence graph, excluding the input set itself.
///
/// A fact qualifies when its edge weight, summed across every source fact in
/// `ids`, reaches `min_weight`; results come back ordered by that summed
/// weight, strongest first, capped at `limit`.
pub fn neighbors(
    conn: &Connection,
    ids: &[i64],
    limit: usize,
    min_weight: f64,
) -> Result<Vec<Neighbor>> {
    if ids.is_empty() {
        return Ok(Vec::new());
    }

    let in_list: Vec<String> = (1..=ids.len()).map(|i| format!("?{i}")).collect();
    let not_in_list: Vec<String> = (ids.len() + 1..=ids.len() * 2)
        .map(|i| format!("?{i}"))
        .collect();
    let min_weight_pos = ids.len() * 2 + 1;
    let limit_pos = ids.len() * 2 + 2;

    let sql = format!(
        "SELECT co.fact_b, SUM(co.weight) AS total_weight, \
                f.entity, f.key, f.value, f.category, f.activation, f.importance \
         FROM co_occurrences co \
         JOIN facts f ON f.id = co.fact_b \
         WHERE co.fact_a IN ({in_list}) \
           AND co.fact_b NOT IN ({not_in_list}) \
         GROUP BY co.fact_b \
         HAVING total_weight >= ?{min_weight_pos} \
         ORDER BY total_weight DESC \
         LIMIT ?{limit_pos}",
        in_list = in_list.join(", "),
        not_in_list = not_in_list.join(", "),
    );

    let limit = limit as i64;
    let mut sql_params: Vec<&dyn rusqlite::types::ToSql> = Vec::with_capacity(ids.len() * 2 + 2);
    for id in ids {
        sql_params.push(id);
    }
    for id in ids {
        sql_params.push(id);
    }
    sql_params.push(&min_weight);
    sql_params.push(&limit);

    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt
        .query_map(sql_params.as_slice(), |row| {
            Ok(Neighbor {
                id: row.get(0)?,
                total_weight: row.get(1)?,
                entity: row.get(2)?,
                key: row.get(3)?,
                value: row.get(4)?,
                category: row.get(5)?,
                activation: row.get(6)?,
                importance: row.get(7)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(rows)
}
