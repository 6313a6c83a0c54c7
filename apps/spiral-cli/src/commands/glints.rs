// glints.rs — Glint subcommands: tail.

use std::path::PathBuf;

use clap::Subcommand;
use spiral_glint::{Glint, GlintFilter, GlintReader};
use spiral_orchestrator::SpiralConfig;

#[derive(Subcommand)]
pub enum GlintCommands {
    /// Show recent glints, optionally waiting for new ones.
    Tail {
        /// Path to glint log (defaults to .spiral/glints.jsonl).
        #[arg(long)]
        log: Option<PathBuf>,
        /// Number of glints to show.
        #[arg(short, default_value = "10")]
        n: usize,
        /// Keep printing glints as they are appended.
        #[arg(short, long)]
        follow: bool,
        /// Only glints whose type starts with this prefix (e.g. `orchestrator.module`).
        #[arg(long = "type")]
        glint_type: Option<String>,
        /// Only glints from this source.
        #[arg(long)]
        source: Option<String>,
    },
}

pub fn execute(cmd: &GlintCommands, config: &SpiralConfig) -> anyhow::Result<()> {
    match cmd {
        GlintCommands::Tail {
            log,
            n,
            follow,
            glint_type,
            source,
        } => {
            let path = log.clone().unwrap_or_else(|| config.glint_log.clone());

            if !path.exists() && !follow {
                println!("No glint log found at {}", path.display());
                return Ok(());
            }

            let mut filter = GlintFilter::new();
            if let Some(prefix) = glint_type {
                filter = filter.glint_type(prefix.as_str());
            }
            if let Some(source) = source {
                filter = filter.source(source.as_str());
            }

            let mut reader = GlintReader::from_start(&path).with_filter(filter);
            let recent = last_n(reader.poll()?, *n);

            if recent.is_empty() && !follow {
                println!("No glints.");
                return Ok(());
            }

            println!("{}", header());
            println!("{}", "-".repeat(100));
            for glint in &recent {
                println!("{}", format_row(glint));
            }

            if *follow {
                for glint in reader.follow(config.tail_poll_interval()) {
                    println!("{}", format_row(&glint));
                }
            }
        }
    }

    Ok(())
}

fn last_n(mut glints: Vec<Glint>, n: usize) -> Vec<Glint> {
    let start = glints.len().saturating_sub(n);
    glints.split_off(start)
}

fn header() -> String {
    format!("{:<20} {:<34} {:<16} PAYLOAD", "TIMESTAMP", "TYPE", "SOURCE")
}

fn format_row(glint: &Glint) -> String {
    let payload = if glint.payload.is_null() {
        "-".to_string()
    } else {
        glint.payload.to_string()
    };
    format!(
        "{:<20} {:<34} {:<16} {}",
        glint.timestamp.format("%Y-%m-%d %H:%M:%S"),
        glint.glint_type,
        glint.source,
        payload,
    )
}
