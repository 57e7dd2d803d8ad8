use anyhow::Result;

use crate::config::EngramConfig;

/// Display fact store statistics in the terminal.
pub fn stats(config: &EngramConfig) -> Result<()> {
    let db_path = config.resolved_db_path();
    let conn = crate::db::open_database(&db_path)?;

    let response = crate::memory::stats::store_stats(&conn, 5)?;

    println!("Fact Store Statistics");
    println!("{}", "=".repeat(40));
    println!("  Facts:               {}", response.fact_count);
    println!("  Co-occurrence edges: {}", response.edge_count);
    println!("  Total retrievals:    {}", response.total_accesses);
    println!("  Max activation:      {:.2}", response.max_activation);
    println!("  Mean activation:     {:.3}", response.mean_activation);
    println!();

    if !response.top_facts.is_empty() {
        println!("Most activated facts:");
        for fact in &response.top_facts {
            println!(
                "  {:<24} activation {:>7.2}  ({} retrievals)",
                format!("{}.{}", fact.entity, fact.key),
                fact.activation,
                fact.access_count
            );
        }
        println!();
    }

    if !response.strongest_edges.is_empty() {
        println!("Strongest co-occurrences:");
        for edge in &response.strongest_edges {
            println!(
                "  {} <-> {}   weight {:.1}",
                edge.fact_a, edge.fact_b, edge.weight
            );
        }
    }

    Ok(())
}
