// catalog.rs — Resolving load targets to module instances.
//
// There is no runtime code loading. Every module the orchestrator can start
// is either linked into the binary and registered here under a load target
// (`builtin:heartbeat`), or an external program started through the
// `exec:` scheme. Anything else is a `LoadError::Unresolved`.

use std::collections::HashMap;

use crate::command::CommandModule;
use crate::descriptor::ModuleDescriptor;
use crate::error::LoadError;
use crate::module::Module;

/// Builds a fresh module instance for a descriptor.
pub type ModuleFactory =
    Box<dyn Fn(&ModuleDescriptor) -> anyhow::Result<Box<dyn Module>> + Send + Sync>;

/// Prefix of load targets that run an external program.
pub const EXEC_SCHEME: &str = "exec:";

/// Registration table mapping load targets to factories.
pub struct ModuleCatalog {
    factories: HashMap<String, ModuleFactory>,
    exec_enabled: bool,
}

impl ModuleCatalog {
    /// An empty catalog with `exec:` targets enabled.
    pub fn new() -> Self {
        Self {
            factories: HashMap::new(),
            exec_enabled: true,
        }
    }

    /// Refuse `exec:` targets; only registered factories resolve.
    pub fn without_exec(mut self) -> Self {
        self.exec_enabled = false;
        self
    }

    /// Register a factory under a load target. A later registration for the
    /// same target replaces the earlier one.
    pub fn register<F>(&mut self, target: impl Into<String>, factory: F)
    where
        F: Fn(&ModuleDescriptor) -> anyhow::Result<Box<dyn Module>> + Send + Sync + 'static,
    {
        let target = target.into();
        if self.factories.insert(target.clone(), Box::new(factory)).is_some() {
            tracing::debug!(target = %target, "module factory replaced");
        }
    }

    /// Whether `target` would resolve (without building anything).
    pub fn resolves(&self, target: &str) -> bool {
        let target = target.trim();
        if target.starts_with(EXEC_SCHEME) {
            return self.exec_enabled;
        }
        self.factories.contains_key(target)
    }

    /// Registered load targets, sorted.
    pub fn targets(&self) -> Vec<&str> {
        let mut targets: Vec<&str> = self.factories.keys().map(String::as_str).collect();
        targets.sort_unstable();
        targets
    }

    /// Build the module a descriptor points at.
    pub fn resolve(&self, descriptor: &ModuleDescriptor) -> Result<Box<dyn Module>, LoadError> {
        let target = descriptor.load_target.trim();

        if let Some(command_line) = target.strip_prefix(EXEC_SCHEME) {
            if !self.exec_enabled {
                return Err(self.unresolved(descriptor));
            }
            let module = CommandModule::from_descriptor(command_line, descriptor).map_err(
                |source| LoadError::Instantiate {
                    id: descriptor.id.clone(),
                    source,
                },
            )?;
            return Ok(Box::new(module));
        }

        let factory = self
            .factories
            .get(target)
            .ok_or_else(|| self.unresolved(descriptor))?;
        factory(descriptor).map_err(|source| LoadError::Instantiate {
            id: descriptor.id.clone(),
            source,
        })
    }

    fn unresolved(&self, descriptor: &ModuleDescriptor) -> LoadError {
        LoadError::Unresolved {
            id: descriptor.id.clone(),
            target: descriptor.load_target.clone(),
        }
    }
}

impl Default for ModuleCatalog {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::ScriptedModule;

    #[test]
    fn registered_target_resolves() {
        let mut catalog = ModuleCatalog::new();
        catalog.register("builtin:noop", |_| Ok(Box::new(ScriptedModule::ok()) as Box<dyn Module>));

        let descriptor = ModuleDescriptor::new("n", "builtin:noop", "on_start");
        assert!(catalog.resolve(&descriptor).is_ok());
        assert!(catalog.resolves("builtin:noop"));
        assert_eq!(catalog.targets(), vec!["builtin:noop"]);
    }

    #[test]
    fn surrounding_whitespace_is_ignored() {
        let mut catalog = ModuleCatalog::new();
        catalog.register("builtin:noop", |_| Ok(Box::new(ScriptedModule::ok()) as Box<dyn Module>));

        let descriptor = ModuleDescriptor::new("n", " builtin:noop ", "on_start");
        assert!(catalog.resolves(&descriptor.load_target));
        assert!(catalog.resolve(&descriptor).is_ok());
        assert!(catalog.resolves("  exec:/bin/true"));
    }

    #[test]
    fn unknown_target_is_unresolved() {
        let catalog = ModuleCatalog::new();
        let descriptor = ModuleDescriptor::new("x", "modules/tone.js", "on_start");
        let err = catalog.resolve(&descriptor).err().unwrap();
        assert!(matches!(err, LoadError::Unresolved { ref target, .. } if target == "modules/tone.js"));
    }

    #[test]
    fn factory_errors_become_instantiate_errors() {
        let mut catalog = ModuleCatalog::new();
        catalog.register("builtin:broken", |_| anyhow::bail!("missing option `interval_secs`"));

        let descriptor = ModuleDescriptor::new("b", "builtin:broken", "on_start");
        let err = catalog.resolve(&descriptor).err().unwrap();
        assert!(matches!(err, LoadError::Instantiate { .. }));
        assert!(err.to_string().contains("interval_secs"));
    }

    #[test]
    fn exec_targets_can_be_disabled() {
        let descriptor = ModuleDescriptor::new("c", "exec:/bin/true", "on_demand");
        assert!(ModuleCatalog::new().resolve(&descriptor).is_ok());

        let locked = ModuleCatalog::new().without_exec();
        assert!(!locked.resolves("exec:/bin/true"));
        assert!(matches!(
            locked.resolve(&descriptor).err().unwrap(),
            LoadError::Unresolved { .. }
        ));
    }

    #[test]
    fn empty_exec_target_fails_to_instantiate() {
        let descriptor = ModuleDescriptor::new("c", "exec:   ", "on_demand");
        assert!(matches!(
            ModuleCatalog::new().resolve(&descriptor).err().unwrap(),
            LoadError::Instantiate { .. }
        ));
    }
}
