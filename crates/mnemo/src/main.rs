//! mnemo - embedding memory with a durable record store
//!
//! Main entry point for the mnemo CLI.

use std::path::{Path, PathBuf};

use anyhow::Result;
use clap::{Parser, Subcommand};
use mnemo_config::LoggingConfig;
use tracing_appender::non_blocking::WorkerGuard;

mod commands;

use commands::{add, search, stats};

// ─────────────────────────────────────────────────────────────────────────────
// CLI Structure
// ─────────────────────────────────────────────────────────────────────────────

/// mnemo - embedding memory with a durable record store
#[derive(Parser)]
#[command(name = "mnemo")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Output as JSON (for scripting)
    #[arg(long, global = true)]
    pub json: bool,

    /// Config directory (default: platform config dir, or MNEMO_CONFIG_DIR)
    #[arg(long, global = true)]
    pub config_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Remember a text
    Add(add::AddArgs),

    /// Find the memories nearest to a query
    Search(search::SearchArgs),

    /// Show index and store statistics
    Stats(stats::StatsArgs),
}

// ─────────────────────────────────────────────────────────────────────────────
// Main
// ─────────────────────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let loaded = mnemo_config::load_config_with_options(None, cli.config_dir.as_deref())?;
    let _guard = init_tracing(cli.verbose, &loaded.config.logging(), loaded.config_dir.as_deref());

    for warning in &loaded.warnings {
        tracing::warn!("{}", warning);
    }
    tracing::debug!("Config loaded from {:?}", loaded.loaded_from());

    // Create context for commands
    let ctx = commands::Context {
        loaded,
        json_output: cli.json,
        verbose: cli.verbose,
    };

    // Dispatch to command handlers
    match cli.command {
        Commands::Add(args) => add::run(args, &ctx).await,
        Commands::Search(args) => search::run(args, &ctx).await,
        Commands::Stats(args) => stats::run(args, &ctx).await,
    }
}

/// Initialize tracing: console (human-readable, stderr) + rotating JSON file.
///
/// The returned guard flushes the file writer on drop.
fn init_tracing(verbose: bool, logging: &LoggingConfig, config_dir: Option<&Path>) -> Option<WorkerGuard> {
    use tracing_subscriber::prelude::*;
    use tracing_subscriber::{EnvFilter, fmt};

    let console_filter = if verbose {
        "mnemo=debug,mnemo_memory=debug,mnemo_embed=debug,mnemo_config=debug,info".to_string()
    } else {
        logging
            .filter
            .clone()
            .unwrap_or_else(|| "mnemo=info,mnemo_memory=warn,mnemo_embed=warn,warn".to_string())
    };

    let (file_layer, guard) = match config_dir {
        Some(dir) if logging.file => {
            let file_appender = tracing_appender::rolling::daily(dir.join("logs"), "mnemo.log");
            let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);
            let layer = fmt::layer()
                .json()
                .with_writer(non_blocking)
                .with_filter(EnvFilter::new(
                    "mnemo=trace,mnemo_memory=trace,mnemo_embed=trace,mnemo_config=trace,info",
                ));
            (Some(layer), Some(guard))
        }
        _ => (None, None),
    };

    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_target(true)
                .with_writer(std::io::stderr)
                .with_filter(EnvFilter::new(console_filter)),
        )
        .with(file_layer)
        .init();

    guard
}
