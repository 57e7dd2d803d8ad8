//! CLI `reset` command — delete all facts and learned state after confirmation.

use anyhow::{bail, Result};

use crate::config::EngramConfig;

/// Delete all facts, co-occurrence edges, and learned state.
///
/// Requires `--yes`; there is no interactive confirmation so the command
/// stays usable from scripts.
pub fn reset(config: &EngramConfig, yes: bool) -> Result<()> {
    let db_path = config.resolved_db_path();

    if !yes {
        bail!(
            "refusing to reset {} without --yes — this permanently deletes all facts and learned state",
            db_path.display()
        );
    }

    let conn = crate::db::open_database(&db_path)?;

    // Edge rows first — FK constraints reference facts
    conn.execute_batch(
        "DELETE FROM co_occurrences;
         DELETE FROM facts;",
    )?;

    println!("All facts deleted. Database reset complete.");
    Ok(())
}
