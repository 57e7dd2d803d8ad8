use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use engram::{cli, config::EngramConfig};

#[derive(Parser)]
#[command(
    name = "engram",
    version,
    about = "Activation-weighted fact retrieval for AI agents"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Retrieve facts for a query and print the context block
    Query {
        /// The query text
        text: String,
        /// Print the scored result set as JSON instead of the rendered block
        #[arg(long)]
        json: bool,
    },
    /// Import facts from a JSON file
    Import {
        /// Path to the import file
        file: PathBuf,
    },
    /// Show fact store statistics
    Stats,
    /// Run database diagnostics
    Doctor,
    /// Delete all facts and learned state
    Reset {
        /// Confirm the deletion
        #[arg(long)]
        yes: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = EngramConfig::load()?;

    // Log to stderr so stdout stays clean for the rendered block / JSON.
    let filter = EnvFilter::try_new(&config.logging.level)
        .unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Command::Query { text, json } => {
            cli::query::query(&config, &text, json).await?;
        }
        Command::Import { file } => {
            cli::import::import(&config, &file)?;
        }
        Command::Stats => {
            cli::stats::stats(&config)?;
        }
        Command::Doctor => {
            cli::doctor::doctor(&config)?;
        }
        Command::Reset { yes } => {
            cli::reset::reset(&config, yes)?;
        }
    }

    Ok(())
}
