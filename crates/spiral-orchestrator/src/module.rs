// module.rs — The contract every capability module implements.
//
// The orchestrator knows nothing about what a module does (tone inference,
// dream playback, a heartbeat). It only knows how to bring one up and, on
// shutdown, take it down again. Long-lived work (timers, watchers) is
// started by the module itself on the tokio runtime; the orchestrator does
// not supervise it after activation.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use spiral_glint::GlintEmitter;

/// Which entry point the loader invokes after instantiating a module.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EntryPoint {
    /// The default zero-argument entry: [`Module::activate`].
    #[default]
    Activate,
    /// The named `run` entry: [`Module::run`].
    Run,
    /// Load-only: instantiating the module is all there is to do.
    None,
}

impl EntryPoint {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntryPoint::Activate => "activate",
            EntryPoint::Run => "run",
            EntryPoint::None => "none",
        }
    }
}

/// Everything a module gets from the orchestrator.
#[derive(Debug, Clone)]
pub struct ModuleContext {
    module_id: String,
    project_root: PathBuf,
    glints: GlintEmitter,
}

impl ModuleContext {
    pub fn new(module_id: impl Into<String>, project_root: impl AsRef<Path>, glints: GlintEmitter) -> Self {
        Self {
            module_id: module_id.into(),
            project_root: project_root.as_ref().to_path_buf(),
            glints,
        }
    }

    /// Registry id of the module being activated.
    pub fn module_id(&self) -> &str {
        &self.module_id
    }

    /// Root of the project the orchestrator runs for.
    pub fn project_root(&self) -> &Path {
        &self.project_root
    }

    /// Glint emitter whose source is this module's id.
    pub fn glints(&self) -> &GlintEmitter {
        &self.glints
    }
}

/// A capability module.
///
/// Implementations declare one entry point; the loader calls only that one.
/// Both entry methods default to doing nothing so a module overrides just
/// the one it declares.
#[async_trait]
pub trait Module: Send + Sync {
    /// Which entry point the loader should invoke.
    fn entry_point(&self) -> EntryPoint {
        EntryPoint::Activate
    }

    /// Default entry point. Return once the module is up; spawn tasks for
    /// anything that should keep running.
    async fn activate(&mut self, _ctx: &ModuleContext) -> anyhow::Result<()> {
        Ok(())
    }

    /// Named `run` entry point, for modules that do one job and finish.
    async fn run(&mut self, _ctx: &ModuleContext) -> anyhow::Result<()> {
        Ok(())
    }

    /// Tear down whatever the entry point started. Called before the id may
    /// be activated again and on orchestrator shutdown.
    async fn stop(&mut self) -> anyhow::Result<()> {
        Ok(())
    }
}
