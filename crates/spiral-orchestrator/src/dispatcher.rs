// dispatcher.rs — The startup pass: applying trigger policy to descriptors.
//
// Each descriptor is judged on its own trigger:
//   on_start / on_idle  → activated now, in registry order, one at a time
//   on_demand           → registered; only the on-demand invoker activates it
//   anything else       → deferred; logged and left alone
//
// Activations are awaited one after another, never concurrently, so a
// failure at boot can always be pinned on one module and startup never
// opens an unbounded number of files or timers at once.

use serde::Serialize;
use serde_json::json;
use spiral_glint::GlintEmitter;

use crate::descriptor::{ModuleDescriptor, Trigger};
use crate::lifecycle;
use crate::loader::ModuleLoader;

/// Outcome of one startup pass, ids in registry order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DispatchReport {
    /// Immediately-triggered modules that came up.
    pub activated: Vec<String>,
    /// `on_demand` modules, available to the invoker.
    pub registered: Vec<String>,
    /// Modules with an unrecognized or `deferred` trigger.
    pub deferred: Vec<String>,
    /// Immediately-triggered modules that failed to load.
    pub failed: Vec<String>,
}

impl DispatchReport {
    /// Whether the process should stay resident after the pass: true when
    /// at least one module came up and may be running timers or watchers.
    pub fn keep_alive(&self) -> bool {
        !self.activated.is_empty()
    }
}

/// Run the startup pass over `descriptors` using `loader`.
pub async fn dispatch(loader: &mut ModuleLoader, descriptors: &[ModuleDescriptor]) -> DispatchReport {
    let lifecycle = GlintEmitter::new(loader.glint_log().clone(), lifecycle::ORCHESTRATOR_SOURCE);
    let mut report = DispatchReport::default();

    for descriptor in descriptors {
        match &descriptor.trigger {
            trigger if trigger.is_immediate() => {
                tracing::debug!(module = %descriptor.id, trigger = %trigger, "activating");
                match loader.load(descriptor).await {
                    Some(_) => report.activated.push(descriptor.id.clone()),
                    None => report.failed.push(descriptor.id.clone()),
                }
            }
            Trigger::OnDemand => {
                tracing::info!(module = %descriptor.id, "registered for on-demand activation");
                lifecycle.emit_or_warn(
                    lifecycle::MODULE_REGISTERED,
                    json!({ "id": descriptor.id, "load_target": descriptor.load_target }),
                );
                report.registered.push(descriptor.id.clone());
            }
            other => {
                tracing::info!(module = %descriptor.id, trigger = %other, "deferred; trigger has no activation path");
                lifecycle.emit_or_warn(
                    lifecycle::MODULE_DEFERRED,
                    json!({ "id": descriptor.id, "trigger": other.to_string() }),
                );
                report.deferred.push(descriptor.id.clone());
            }
        }
    }

    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{scripted_catalog, Journal};
    use spiral_glint::GlintLog;
    use tempfile::tempdir;

    fn descriptors(entries: &[(&str, &str, &str)]) -> Vec<ModuleDescriptor> {
        entries
            .iter()
            .map(|(id, target, trigger)| ModuleDescriptor::new(*id, *target, *trigger))
            .collect()
    }

    #[tokio::test]
    async fn immediate_triggers_activate_in_registry_order() {
        let dir = tempdir().unwrap();
        let journal = Journal::default();
        let mut loader = ModuleLoader::new(
            scripted_catalog(&journal),
            GlintLog::new(dir.path().join("glints.jsonl")),
            dir.path(),
        );

        let report = dispatch(
            &mut loader,
            &descriptors(&[
                ("third", "test:ok", "on_idle"),
                ("first", "test:ok", "on_start"),
                ("second", "test:run", "on_start"),
            ]),
        )
        .await;

        assert_eq!(report.activated, vec!["third", "first", "second"]);
        assert_eq!(
            journal.entries(),
            vec![
                "third:load",
                "third:activate",
                "first:load",
                "first:activate",
                "second:load",
                "second:run",
            ]
        );
        assert!(report.keep_alive());
    }

    #[tokio::test]
    async fn failure_does_not_stop_later_modules() {
        let dir = tempdir().unwrap();
        let journal = Journal::default();
        let mut loader = ModuleLoader::new(
            scripted_catalog(&journal),
            GlintLog::new(dir.path().join("glints.jsonl")),
            dir.path(),
        );

        let report = dispatch(
            &mut loader,
            &descriptors(&[
                ("broken", "test:fail", "on_start"),
                ("boom", "test:panic", "on_start"),
                ("missing", "modules/tone.js", "on_start"),
                ("fine", "test:ok", "on_start"),
            ]),
        )
        .await;

        assert_eq!(report.failed, vec!["broken", "boom", "missing"]);
        assert_eq!(report.activated, vec!["fine"]);
        assert_eq!(loader.active().ids(), vec!["fine"]);
    }

    #[tokio::test]
    async fn on_demand_and_deferred_are_not_activated() {
        let dir = tempdir().unwrap();
        let journal = Journal::default();
        let log = GlintLog::new(dir.path().join("glints.jsonl"));
        let mut loader = ModuleLoader::new(scripted_catalog(&journal), log.clone(), dir.path());

        let report = dispatch(
            &mut loader,
            &descriptors(&[
                ("later", "test:ok", "on_demand"),
                ("someday", "test:ok", "deferred"),
                ("moon", "test:ok", "on_full_moon"),
            ]),
        )
        .await;

        assert!(report.activated.is_empty());
        assert_eq!(report.registered, vec!["later"]);
        assert_eq!(report.deferred, vec!["someday", "moon"]);
        assert!(journal.entries().is_empty());
        assert!(!report.keep_alive());

        let glints = GlintLog::read_all(log.path()).unwrap();
        let types: Vec<&str> = glints.iter().map(|g| g.glint_type.as_str()).collect();
        assert_eq!(
            types,
            vec![
                lifecycle::MODULE_REGISTERED,
                lifecycle::MODULE_DEFERRED,
                lifecycle::MODULE_DEFERRED,
            ]
        );
        assert_eq!(glints[2].payload["trigger"], "on_full_moon");
    }

    #[tokio::test]
    async fn only_failures_means_no_keep_alive() {
        let dir = tempdir().unwrap();
        let journal = Journal::default();
        let mut loader = ModuleLoader::new(
            scripted_catalog(&journal),
            GlintLog::new(dir.path().join("glints.jsonl")),
            dir.path(),
        );

        let report = dispatch(&mut loader, &descriptors(&[("broken", "test:fail", "on_start")])).await;
        assert_eq!(report.failed, vec!["broken"]);
        assert!(!report.keep_alive());
    }
}
