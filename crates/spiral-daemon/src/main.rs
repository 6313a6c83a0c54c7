//! # spiral-daemon
//!
//! Spiral module orchestrator.
//!
//! Without a subcommand the daemon reads the module registry, runs the
//! startup pass, and stays resident while any module is active, until
//! Ctrl-C or SIGTERM. `invoke <id>` activates one `on_demand` module and
//! exits.
//!
//! ## Usage
//!
//! ```text
//! spiral-daemon --project-root ~/work/notes
//! spiral-daemon invoke nightly-digest
//! ```
//!
//! Exit status: 0 on success, 2 for a broken registry or config, 3 for an
//! id that isn't an on-demand module, 1 for anything else.

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use spiral_builtins::builtin_catalog;
use spiral_glint::GlintLog;
use spiral_orchestrator::{
    ConfigError, ModuleLoader, ModuleRegistry, NotFoundError, Orchestrator, SpiralConfig,
};

/// Spiral module orchestrator.
#[derive(Parser)]
#[command(name = "spiral-daemon", about = "Spiral module orchestrator")]
struct Cli {
    /// Project root directory (defaults to current directory).
    #[arg(long, default_value = ".")]
    project_root: PathBuf,

    /// Module registry to use instead of `.spiral/modules.json`.
    #[arg(long)]
    registry: Option<PathBuf>,

    /// Glint log to append to instead of `.spiral/glints.jsonl`.
    #[arg(long)]
    glint_log: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Activate a single on-demand module, then exit.
    Invoke {
        /// Registry id of the module.
        module_id: String,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    // Logs go to stderr so stdout carries only command output.
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new("spiral_daemon=info,spiral_orchestrator=info,spiral_builtins=info")
    });
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .init();

    match run(Cli::parse()).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{:#}", e);
            eprintln!("Error: {:#}", e);
            ExitCode::from(exit_code_for(&e))
        }
    }
}

async fn run(cli: Cli) -> Result<()> {
    let project_root = cli
        .project_root
        .canonicalize()
        .with_context(|| format!("project root {} not found", cli.project_root.display()))?;

    let config = resolve_config(&project_root, cli.registry, cli.glint_log)?;

    tracing::info!("Project root: {}", config.project_root.display());
    tracing::info!("Registry: {}", config.registry.display());
    tracing::info!("Glint log: {}", config.glint_log.display());

    let registry = ModuleRegistry::load(&config.registry)?;
    let loader = ModuleLoader::new(
        builtin_catalog(),
        GlintLog::new(&config.glint_log),
        &config.project_root,
    );
    let mut orchestrator = Orchestrator::new(registry, loader);

    match cli.command {
        None => {
            orchestrator.run_resident().await;
            Ok(())
        }
        Some(Command::Invoke { module_id }) => {
            let outcome = orchestrator.invoke(&module_id).await;
            orchestrator.shutdown().await;
            match outcome? {
                Some(receipt) => {
                    println!("{}", serde_json::to_string_pretty(&receipt)?);
                    Ok(())
                }
                None => anyhow::bail!("module `{}` failed to activate", module_id),
            }
        }
    }
}

/// Project config with command-line overrides applied. Override paths are
/// made absolute against the working directory, so modules comparing them
/// with paths reported by the OS see the same form.
fn resolve_config(
    project_root: &Path,
    registry: Option<PathBuf>,
    glint_log: Option<PathBuf>,
) -> Result<SpiralConfig> {
    let mut config = SpiralConfig::load(project_root)?;
    if let Some(registry) = registry {
        config.registry = std::path::absolute(&registry)
            .with_context(|| format!("invalid registry path {}", registry.display()))?;
    }
    if let Some(glint_log) = glint_log {
        config.glint_log = std::path::absolute(&glint_log)
            .with_context(|| format!("invalid glint log path {}", glint_log.display()))?;
    }
    Ok(config)
}

/// Process exit status for a failed run.
fn exit_code_for(err: &anyhow::Error) -> u8 {
    if err.downcast_ref::<ConfigError>().is_some() {
        2
    } else if err.downcast_ref::<NotFoundError>().is_some() {
        3
    } else {
        1
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    const REGISTRY: &str = r#"[
        {"id": "hello", "path": "builtin:awaken", "trigger": "on_demand",
         "options": {"message": "hi"}},
        {"id": "later", "path": "builtin:awaken", "trigger": "deferred"},
        {"id": "ghost", "path": "builtin:nothing", "trigger": "on_demand"}
    ]"#;

    fn project() -> tempfile::TempDir {
        let dir = tempdir().unwrap();
        std::fs::create_dir(dir.path().join(".spiral")).unwrap();
        std::fs::write(dir.path().join(".spiral/modules.json"), REGISTRY).unwrap();
        dir
    }

    fn cli(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("spiral-daemon").chain(args.iter().copied())).unwrap()
    }

    #[tokio::test]
    async fn invoke_activates_on_demand_module() {
        let dir = project();
        let root = dir.path().to_str().unwrap();
        run(cli(&["--project-root", root, "invoke", "hello"])).await.unwrap();

        let glints = GlintLog::read_all(dir.path().join(".spiral/glints.jsonl")).unwrap();
        let awakened = glints
            .iter()
            .find(|g| g.glint_type == "spiral.awakened")
            .unwrap();
        assert_eq!(awakened.source, "hello");
        assert_eq!(awakened.payload["message"], "hi");
    }

    #[tokio::test]
    async fn invoke_errors_map_to_exit_codes() {
        let dir = project();
        let root = dir.path().to_str().unwrap();

        let err = run(cli(&["--project-root", root, "invoke", "later"])).await.unwrap_err();
        assert_eq!(exit_code_for(&err), 3);

        let err = run(cli(&["--project-root", root, "invoke", "nobody"])).await.unwrap_err();
        assert_eq!(exit_code_for(&err), 3);

        let err = run(cli(&["--project-root", root, "invoke", "ghost"])).await.unwrap_err();
        assert_eq!(exit_code_for(&err), 1);
    }

    #[tokio::test]
    async fn broken_registry_is_a_config_error() {
        let dir = project();
        let root = dir.path().to_str().unwrap();
        std::fs::write(dir.path().join("other.json"), "{ not json").unwrap();
        let other = dir.path().join("other.json");

        let err = run(cli(&[
            "--project-root",
            root,
            "--registry",
            other.to_str().unwrap(),
        ]))
        .await
        .unwrap_err();
        assert_eq!(exit_code_for(&err), 2);
    }

    #[test]
    fn path_overrides_are_made_absolute() {
        let dir = project();
        let config = resolve_config(
            dir.path(),
            Some(PathBuf::from("alt/modules.yaml")),
            Some(PathBuf::from("logs/glints.jsonl")),
        )
        .unwrap();

        let cwd = std::env::current_dir().unwrap();
        assert_eq!(config.registry, cwd.join("alt/modules.yaml"));
        assert_eq!(config.glint_log, cwd.join("logs/glints.jsonl"));

        let defaults = resolve_config(dir.path(), None, None).unwrap();
        assert_eq!(defaults.glint_log, dir.path().join(".spiral/glints.jsonl"));
    }

    #[tokio::test]
    async fn startup_without_activations_returns_immediately() {
        let dir = project();
        let root = dir.path().to_str().unwrap();
        let log = dir.path().join("custom/glints.jsonl");

        run(cli(&["--project-root", root, "--glint-log", log.to_str().unwrap()]))
            .await
            .unwrap();

        let types: Vec<String> = GlintLog::read_all(&log)
            .unwrap()
            .into_iter()
            .map(|g| g.glint_type)
            .collect();
        assert_eq!(types.first().map(String::as_str), Some("orchestrator.started"));
        assert_eq!(types.last().map(String::as_str), Some("orchestrator.dispatched"));
    }
}
