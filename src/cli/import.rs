use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;

use crate::config::EngramConfig;
use crate::memory::store;
use crate::memory::types::NewFact;

/// Import file format.
#[derive(Debug, Deserialize)]
struct ImportData {
    facts: Vec<NewFact>,
}

/// Import facts from a JSON file.
///
/// Facts with an explicit id that already exists in the database are skipped,
/// so re-running an import is safe. Learned state (activation, access counts,
/// co-occurrence edges) is never imported — it accrues only through retrieval.
pub fn import(config: &EngramConfig, file: &Path) -> Result<()> {
    let json = std::fs::read_to_string(file)
        .with_context(|| format!("failed to read import file: {}", file.display()))?;

    let data: ImportData =
        serde_json::from_str(&json).context("failed to parse import JSON")?;

    let db_path = config.resolved_db_path();
    let conn = crate::db::open_database(&db_path)?;

    let mut imported = 0u64;
    let mut skipped = 0u64;

    println!("Importing {} facts...", data.facts.len());

    for fact in &data.facts {
        if let Some(id) = fact.id {
            if store::fact_exists(&conn, id)? {
                skipped += 1;
                continue;
            }
        }
        store::insert_fact(&conn, fact)?;
        imported += 1;
    }

    println!("Imported {imported} facts ({skipped} already present).");
    Ok(())
}
