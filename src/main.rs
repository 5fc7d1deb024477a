use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;

use docrag::cli::{Cli, Commands};
use docrag::config::Config;
use docrag::logging::init_logging;
use docrag::metrics;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Project root is the current directory
    let project_root = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));

    // Load configuration (if available, otherwise use defaults)
    let config = Config::load(&project_root).unwrap_or_default();

    // The guard MUST be held until program exit to ensure logs are flushed
    let _logging_guard = init_logging(&config.logging, &project_root)?;

    tracing::info!("docrag starting up");
    tracing::debug!("Loaded configuration from: {}", project_root.display());

    metrics::register_metrics();

    match cli.command {
        Commands::Init { force } => {
            docrag::commands::init::run(&project_root, force).await?;
        }
        Commands::Index { corpus } => {
            docrag::commands::index::run(&project_root, &corpus).await?;
        }
        Commands::Search {
            query,
            mode,
            limit,
            scope,
        } => {
            docrag::commands::search::run(&project_root, &query, mode, limit, scope).await?;
        }
        Commands::Similar {
            id,
            limit,
            min_similarity,
            scope,
        } => {
            docrag::commands::similar::run(&project_root, &id, limit, min_similarity, scope)
                .await?;
        }
        Commands::Status { scope } => {
            docrag::commands::status::run(&project_root, scope).await?;
        }
        Commands::Stats { prometheus } => {
            docrag::commands::stats::run(&project_root, prometheus).await?;
        }
    }

    Ok(())
}
