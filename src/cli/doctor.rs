//! CLI `doctor` command — run database diagnostics and print a health report.

use anyhow::{Context, Result};

use crate::config::EngramConfig;
use crate::db;

/// Run database diagnostics and print a health report.
pub fn doctor(config: &EngramConfig) -> Result<()> {
    let db_path = config.resolved_db_path();

    if !db_path.exists() {
        println!("Database: not found at {}", db_path.display());
        println!("Run `engram import <file>` to create and seed it.");
        return Ok(());
    }

    let file_size = std::fs::metadata(&db_path).map(|m| m.len()).unwrap_or(0);

    let conn = db::open_database(&db_path)
        .context("failed to open database (may be corrupt)")?;

    let report = db::check_database_health(&conn)
        .context("failed to run health check")?;

    println!("Engram Health Report");
    println!("====================");
    println!();
    println!("Database:          {}", db_path.display());
    println!("File size:         {}", format_bytes(file_size));
    println!("Schema version:    {}", report.schema_version);
    println!();
    println!("Row counts:");
    println!("  Facts:           {}", report.fact_count);
    println!("  Edges:           {}", report.edge_count);
    println!();

    let script_path = config.resolved_script_path();
    println!("Search provider:");
    println!("  Kind:            {}", config.search.provider);
    println!("  Program:         {}", config.search.program);
    println!("  Script:          {}", script_path.display());
    if script_path.exists() {
        println!("  Status:          OK (script found)");
    } else {
        println!("  WARNING: script not found — queries will return nothing.");
    }
    println!();

    if report.integrity_ok {
        println!("Integrity check:   PASSED");
    } else {
        println!("Integrity check:   FAILED ({})", report.integrity_details);
        println!();
        println!("Recovery steps:");
        println!("  1. Restore from a backup: cp backup.db {}", db_path.display());
        println!("  2. Or reset and re-import:");
        println!("     engram reset --yes && engram import facts.json");
    }

    Ok(())
}

fn format_bytes(bytes: u64) -> String {
    if bytes < 1024 {
        format!("{bytes} B")
    } else if bytes < 1024 * 1024 {
        format!("{:.1} KB", bytes as f64 / 1024.0)
    } else {
        format!("{:.1} MB", bytes as f64 / (1024.0 * 1024.0))
    }
}
