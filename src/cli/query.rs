//! CLI `query` command — run one retrieval and print the context block.

use anyhow::Result;
use std::sync::{Arc, Mutex};

use crate::config::EngramConfig;
use crate::memory::retrieval::Retriever;
use crate::search;

/// Run the full retrieval pipeline for `text` against the configured store
/// and provider. With `json`, print the scored result set instead of the
/// rendered block.
///
/// A store that fails to open is not fatal — retrieval degrades to
/// relevance-only ranking, exactly as it does at runtime.
pub async fn query(config: &EngramConfig, text: &str, json: bool) -> Result<()> {
    let db_path = config.resolved_db_path();
    let store = match crate::db::open_database(&db_path) {
        Ok(conn) => Some(Arc::new(Mutex::new(conn))),
        Err(err) => {
            tracing::warn!(error = %err, "store unavailable, ranking by relevance only");
            None
        }
    };

    let provider = search::create_provider(&config.search)?;
    let retriever = Retriever::new(store, Arc::from(provider), Arc::new(config.clone()));

    let context = retriever.retrieve(text).await;

    if json {
        println!("{}", serde_json::to_string_pretty(&context)?);
    } else if context.is_empty() {
        println!("(no facts matched)");
    } else {
        println!("{}", context.render());
    }

    Ok(())
}
