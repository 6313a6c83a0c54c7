//! # spiral-cli
//!
//! Command-line interface for Spiral projects.
//!
//! Reads what the daemon leaves behind and never writes to it:
//! - `spiral glints tail` — recent glints, optionally followed live
//! - `spiral modules list/check` — inspect and validate the module registry

mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use spiral_orchestrator::SpiralConfig;
use tracing_subscriber::EnvFilter;

/// Spiral CLI — inspect glints and module registries.
#[derive(Parser)]
#[command(name = "spiral", version, about)]
struct Cli {
    /// Project root directory (defaults to current directory).
    #[arg(long, default_value = ".")]
    project_root: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Read the glint log.
    Glints {
        #[command(subcommand)]
        command: commands::glints::GlintCommands,
    },
    /// Inspect the module registry.
    Modules {
        #[command(subcommand)]
        command: commands::modules::ModuleCommands,
    },
}

fn main() -> anyhow::Result<()> {
    // Skipped log lines and similar warnings go to stderr.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .init();

    let cli = Cli::parse();
    let project_root = cli.project_root.canonicalize().unwrap_or(cli.project_root);
    let config = SpiralConfig::load(&project_root)?;

    match &cli.command {
        Commands::Glints { command } => commands::glints::execute(command, &config),
        Commands::Modules { command } => commands::modules::execute(command, &config),
    }
}
