// modules.rs — Module subcommands: list, check.

use std::path::PathBuf;

use clap::Subcommand;
use spiral_builtins::builtin_catalog;
use spiral_orchestrator::{ModuleCatalog, ModuleDescriptor, ModuleRegistry, SpiralConfig, Trigger};

#[derive(Subcommand)]
pub enum ModuleCommands {
    /// List registered modules and when each one is activated.
    List {
        /// Path to registry (defaults to .spiral/modules.json).
        #[arg(long)]
        registry: Option<PathBuf>,
        /// Print the descriptors as JSON.
        #[arg(long)]
        json: bool,
    },
    /// Validate the registry without activating anything.
    Check {
        /// Path to registry (defaults to .spiral/modules.json).
        #[arg(long)]
        registry: Option<PathBuf>,
    },
}

pub fn execute(cmd: &ModuleCommands, config: &SpiralConfig) -> anyhow::Result<()> {
    match cmd {
        ModuleCommands::List { registry, json } => {
            let path = registry.clone().unwrap_or_else(|| config.registry.clone());
            let registry = ModuleRegistry::load(&path)?;

            if *json {
                println!("{}", serde_json::to_string_pretty(registry.descriptors())?);
                return Ok(());
            }
            if registry.is_empty() {
                println!("No modules registered in {}", path.display());
                return Ok(());
            }

            println!("{:<20} {:<12} {:<12} PATH", "ID", "TRIGGER", "ACTIVATION");
            println!("{}", "-".repeat(80));
            for descriptor in registry.descriptors() {
                println!(
                    "{:<20} {:<12} {:<12} {}",
                    descriptor.id,
                    descriptor.trigger.to_string(),
                    activation(&descriptor.trigger),
                    descriptor.load_target,
                );
            }
        }

        ModuleCommands::Check { registry } => {
            let path = registry.clone().unwrap_or_else(|| config.registry.clone());
            let registry = ModuleRegistry::load(&path)?;
            let catalog = builtin_catalog();

            let warnings = unknown_triggers(&registry);
            for warning in &warnings {
                println!("warning: {}", warning);
            }

            let problems = unresolved_targets(&registry, &catalog);
            if !problems.is_empty() {
                for problem in &problems {
                    println!("error: {}", problem);
                }
                anyhow::bail!(
                    "{} module(s) in {} cannot be loaded",
                    problems.len(),
                    path.display()
                );
            }

            println!(
                "Registry OK: {} module(s), {} warning(s).",
                registry.len(),
                warnings.len()
            );
        }
    }

    Ok(())
}

fn activation(trigger: &Trigger) -> &'static str {
    match trigger {
        Trigger::OnStart | Trigger::OnIdle => "startup",
        Trigger::OnDemand => "on demand",
        Trigger::Deferred(_) => "never",
    }
}

/// Descriptors whose load target the daemon has no loader for.
fn unresolved_targets(registry: &ModuleRegistry, catalog: &ModuleCatalog) -> Vec<String> {
    registry
        .descriptors()
        .iter()
        .filter(|d| !catalog.resolves(&d.load_target))
        .map(|d| format!("`{}`: no loader for `{}`", d.id, d.load_target))
        .collect()
}

/// Triggers that aren't one of the known policies and so leave the module inert.
fn unknown_triggers(registry: &ModuleRegistry) -> Vec<String> {
    registry
        .descriptors()
        .iter()
        .filter_map(|d: &ModuleDescriptor| match &d.trigger {
            Trigger::Deferred(Some(raw)) => {
                Some(format!("`{}`: unknown trigger `{}`; it will never be activated", d.id, raw))
            }
            _ => None,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn registry() -> ModuleRegistry {
        ModuleRegistry::from_descriptors(vec![
            ModuleDescriptor::new("pulse", "builtin:heartbeat", "on_idle"),
            ModuleDescriptor::new("sync", "exec:./bin/sync", "on_demand"),
            ModuleDescriptor::new("later", "builtin:awaken", "deferred"),
            ModuleDescriptor::new("typo", "builtin:awaken", "on_boot"),
            ModuleDescriptor::new("gone", "builtin:missing", "on_start"),
        ])
        .unwrap()
    }

    #[test]
    fn activation_column() {
        assert_eq!(activation(&Trigger::OnStart), "startup");
        assert_eq!(activation(&Trigger::OnIdle), "startup");
        assert_eq!(activation(&Trigger::OnDemand), "on demand");
        assert_eq!(activation(&Trigger::from("on_boot")), "never");
    }

    #[test]
    fn check_reports_unresolved_targets_and_unknown_triggers() {
        let registry = registry();
        let problems = unresolved_targets(&registry, &builtin_catalog());
        assert_eq!(problems, vec!["`gone`: no loader for `builtin:missing`"]);

        let warnings = unknown_triggers(&registry);
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].contains("on_boot"));
    }

    #[test]
    fn check_fails_on_unloadable_registry() {
        let dir = tempdir().unwrap();
        let config = SpiralConfig::for_project(dir.path());
        std::fs::create_dir_all(dir.path().join(".spiral")).unwrap();

        std::fs::write(
            &config.registry,
            r#"[{"id": "pulse", "path": "builtin:heartbeat", "trigger": "on_idle"}]"#,
        )
        .unwrap();
        execute(&ModuleCommands::Check { registry: None }, &config).unwrap();
        execute(
            &ModuleCommands::List {
                registry: None,
                json: false,
            },
            &config,
        )
        .unwrap();

        std::fs::write(
            &config.registry,
            r#"[{"id": "gone", "path": "builtin:missing", "trigger": "on_start"}]"#,
        )
        .unwrap();
        assert!(execute(&ModuleCommands::Check { registry: None }, &config).is_err());

        std::fs::write(&config.registry, "[{\"id\": \"x\"}]").unwrap();
        assert!(execute(&ModuleCommands::Check { registry: None }, &config).is_err());
    }
}
