//! SQL DDL for all Engram tables.
//!
//! Defines the `facts`, `co_occurrences`, and `schema_meta` tables. All DDL
//! uses `IF NOT EXISTS` for idempotent initialization.

use rusqlite::Connection;

/// All schema DDL statements for Engram's core tables.
const SCHEMA_SQL: &str = r#"
-- Fact storage with learned activation state
CREATE TABLE IF NOT EXISTS facts (
    id INTEGER PRIMARY KEY,
    entity TEXT NOT NULL,
    key TEXT NOT NULL,
    value TEXT NOT NULL,
    category TEXT,
    answer TEXT NOT NULL,
    activation REAL NOT NULL DEFAULT 0 CHECK(activation >= 0),
    importance REAL NOT NULL DEFAULT 0.5,
    access_count INTEGER NOT NULL DEFAULT 0,
    last_accessed TEXT,
    created_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_facts_entity ON facts(entity);
CREATE INDEX IF NOT EXISTS idx_facts_activation ON facts(activation);

-- Co-occurrence graph: two directed rows per logical undirected edge
CREATE TABLE IF NOT EXISTS co_occurrences (
    fact_a INTEGER NOT NULL REFERENCES facts(id) ON DELETE CASCADE,
    fact_b INTEGER NOT NULL REFERENCES facts(id) ON DELETE CASCADE,
    weight REAL NOT NULL DEFAULT 0,
    last_wired TEXT NOT NULL,
    PRIMARY KEY (fact_a, fact_b)
);

CREATE INDEX IF NOT EXISTS idx_co_occurrences_b ON co_occurrences(fact_b);

-- Schema metadata
CREATE TABLE IF NOT EXISTS schema_meta (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL
);
"#;

/// Initialize all schema tables. Idempotent (uses IF NOT EXISTS).
pub fn init_schema(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(SCHEMA_SQL)?;

    // Set initial schema version if not already present
    conn.execute(
        "INSERT OR IGNORE INTO schema_meta (key, value) VALUES ('schema_version', '1')",
        [],
    )?;

    Ok(())
}
