//! Test doubles for exercising the loader and dispatcher without real
//! capability modules.
//!
//! [`ScriptedModule`] succeeds, fails or panics on demand and writes every
//! call into a shared [`Journal`], so a test can assert exactly which entry
//! points ran and in which order. [`scripted_catalog`] registers one
//! scripted module per behavior under `test:*` load targets.
//!
//! ```
//! use spiral_orchestrator::testing::{scripted_catalog, Journal};
//! use spiral_orchestrator::ModuleDescriptor;
//!
//! let journal = Journal::default();
//! let catalog = scripted_catalog(&journal);
//! assert!(catalog.resolves("test:ok"));
//! assert!(catalog.resolves("test:fail"));
//! ```

use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use crate::catalog::ModuleCatalog;
use crate::module::{EntryPoint, Module, ModuleContext};

/// Shared, ordered record of module calls (`"<id>:<call>"`).
#[derive(Debug, Clone, Default)]
pub struct Journal(Arc<Mutex<Vec<String>>>);

impl Journal {
    pub fn record(&self, entry: impl Into<String>) {
        if let Ok(mut entries) = self.0.lock() {
            entries.push(entry.into());
        }
    }

    pub fn entries(&self) -> Vec<String> {
        self.0.lock().map(|e| e.clone()).unwrap_or_default()
    }

    /// Entries recorded for one module id, without the id prefix.
    pub fn calls_for(&self, id: &str) -> Vec<String> {
        let prefix = format!("{}:", id);
        self.entries()
            .into_iter()
            .filter_map(|e| e.strip_prefix(&prefix).map(str::to_string))
            .collect()
    }
}

/// What a scripted entry point does when called.
#[derive(Debug, Clone)]
pub enum Behavior {
    Succeed,
    Fail(String),
    Panic(String),
}

/// A module whose behavior is fixed at construction.
#[derive(Debug, Clone)]
pub struct ScriptedModule {
    entry: EntryPoint,
    behavior: Behavior,
    journal: Journal,
    module_id: Option<String>,
}

impl ScriptedModule {
    pub fn new(behavior: Behavior) -> Self {
        Self {
            entry: EntryPoint::Activate,
            behavior,
            journal: Journal::default(),
            module_id: None,
        }
    }

    pub fn ok() -> Self {
        Self::new(Behavior::Succeed)
    }

    pub fn failing(message: impl Into<String>) -> Self {
        Self::new(Behavior::Fail(message.into()))
    }

    pub fn panicking(message: impl Into<String>) -> Self {
        Self::new(Behavior::Panic(message.into()))
    }

    pub fn with_entry(mut self, entry: EntryPoint) -> Self {
        self.entry = entry;
        self
    }

    pub fn journaled(mut self, journal: &Journal) -> Self {
        self.journal = journal.clone();
        self
    }

    fn invoke(&mut self, ctx: &ModuleContext, call: &str) -> anyhow::Result<()> {
        self.module_id = Some(ctx.module_id().to_string());
        self.journal.record(format!("{}:{}", ctx.module_id(), call));
        match &self.behavior {
            Behavior::Succeed => Ok(()),
            Behavior::Fail(message) => Err(anyhow::anyhow!("{}", message)),
            Behavior::Panic(message) => panic!("{}", message),
        }
    }
}

#[async_trait]
impl Module for ScriptedModule {
    fn entry_point(&self) -> EntryPoint {
        self.entry
    }

    async fn activate(&mut self, ctx: &ModuleContext) -> anyhow::Result<()> {
        self.invoke(ctx, "activate")
    }

    async fn run(&mut self, ctx: &ModuleContext) -> anyhow::Result<()> {
        self.invoke(ctx, "run")
    }

    async fn stop(&mut self) -> anyhow::Result<()> {
        if let Some(id) = &self.module_id {
            self.journal.record(format!("{}:stop", id));
        }
        Ok(())
    }
}

/// A catalog with `exec:` disabled and these targets registered:
///
/// | target | behavior |
/// |---|---|
/// | `test:ok` | `activate` succeeds |
/// | `test:run` | `run` succeeds |
/// | `test:load-only` | no entry point |
/// | `test:fail` | `activate` returns an error |
/// | `test:panic` | `activate` panics |
/// | `test:refuse` | the factory itself fails |
///
/// Factory calls are journaled as `"<id>:load"`.
pub fn scripted_catalog(journal: &Journal) -> ModuleCatalog {
    let mut catalog = ModuleCatalog::new().without_exec();
    let scripted: [(&str, fn() -> ScriptedModule); 5] = [
        ("test:ok", ScriptedModule::ok),
        ("test:run", || ScriptedModule::ok().with_entry(EntryPoint::Run)),
        ("test:load-only", || ScriptedModule::ok().with_entry(EntryPoint::None)),
        ("test:fail", || ScriptedModule::failing("scripted failure")),
        ("test:panic", || ScriptedModule::panicking("scripted panic")),
    ];
    for (target, build) in scripted {
        let journal = journal.clone();
        catalog.register(target, move |descriptor| {
            journal.record(format!("{}:load", descriptor.id));
            Ok(Box::new(build().journaled(&journal)) as Box<dyn Module>)
        });
    }
    let journal = journal.clone();
    catalog.register("test:refuse", move |descriptor| {
        journal.record(format!("{}:load", descriptor.id));
        anyhow::bail!("scripted factory refusal")
    });
    catalog
}
