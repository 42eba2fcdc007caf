//! postcrawl - refresh the catalog and validate data when a batch job finishes
//!
//! Main entry point for the postcrawl CLI.

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context as _, Result};
use clap::{Parser, Subcommand};

mod commands;
mod logging;

use commands::{classify, config, handle};

// ─────────────────────────────────────────────────────────────────────────────
// CLI Structure
// ─────────────────────────────────────────────────────────────────────────────

/// postcrawl - refresh the catalog and validate data when a batch job finishes
#[derive(Parser)]
#[command(name = "postcrawl")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Output as JSON (for scripting)
    #[arg(long, global = true)]
    pub json: bool,

    /// Config file layered on top of the discovered ones
    #[arg(short, long, global = true, env = "POSTCRAWL_CONFIG")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Handle a job-completion event: crawl, resolve the table, validate it
    Handle(handle::HandleArgs),

    /// Show which crawler and table prefix a job name maps to
    Classify(classify::ClassifyArgs),

    /// Show the merged configuration and where it came from
    Config(config::ConfigArgs),
}

// ─────────────────────────────────────────────────────────────────────────────
// Main
// ─────────────────────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    let loaded = postcrawl_config::load_config(cli.config.as_deref())
        .context("failed to load configuration")?;

    let _guard = logging::init(cli.verbose, &loaded.config.logging());

    for warning in &loaded.warnings {
        tracing::warn!("{warning}");
    }

    let ctx = commands::Context {
        config: loaded,
        json_output: cli.json,
        verbose: cli.verbose,
    };

    match cli.command {
        Commands::Handle(args) => handle::run(args, &ctx).await,
        Commands::Classify(args) => classify::run(args, &ctx),
        Commands::Config(args) => config::run(args, &ctx),
    }
}
