// loader.rs — Bringing modules up and tearing them down.
//
// `load` is the failure-isolation boundary. Resolving the load target,
// building the module and running its entry point can each fail (or panic);
// whatever happens is logged with the module id, recorded as a glint, and
// turned into `None`. Nothing propagates to the caller, so one broken module
// never stops the startup pass.
//
// Active modules are owned by the loader. Loading an id that is already
// active is refused: the old instance may still hold timers or child
// processes, and silently replacing it would leak them. `stop` first.

use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use futures_util::FutureExt;
use serde::Serialize;
use serde_json::json;
use spiral_glint::{GlintEmitter, GlintLog};

use crate::catalog::ModuleCatalog;
use crate::descriptor::ModuleDescriptor;
use crate::error::LoadError;
use crate::lifecycle;
use crate::module::{EntryPoint, Module, ModuleContext};

/// A module that was successfully activated.
pub struct ActiveModuleHandle {
    id: String,
    load_target: String,
    activated_at: DateTime<Utc>,
    entry_point: EntryPoint,
    module: Box<dyn Module>,
}

impl ActiveModuleHandle {
    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn activated_at(&self) -> DateTime<Utc> {
        self.activated_at
    }

    fn receipt(&self) -> ActivationReceipt {
        ActivationReceipt {
            id: self.id.clone(),
            load_target: self.load_target.clone(),
            activated_at: self.activated_at,
            entry_point: self.entry_point.as_str().to_string(),
        }
    }
}

/// What callers get back from a successful load. The module itself stays
/// with the loader.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ActivationReceipt {
    pub id: String,
    pub load_target: String,
    pub activated_at: DateTime<Utc>,
    /// `activate`, `run` or `none`.
    pub entry_point: String,
}

/// Active modules in activation order.
#[derive(Default)]
pub struct ActiveModules {
    handles: Vec<ActiveModuleHandle>,
}

impl ActiveModules {
    pub fn contains(&self, id: &str) -> bool {
        self.handles.iter().any(|h| h.id == id)
    }

    pub fn get(&self, id: &str) -> Option<&ActiveModuleHandle> {
        self.handles.iter().find(|h| h.id == id)
    }

    /// Ids in activation order.
    pub fn ids(&self) -> Vec<&str> {
        self.handles.iter().map(|h| h.id.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.handles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }

    fn insert(&mut self, handle: ActiveModuleHandle) {
        self.handles.push(handle);
    }

    fn remove(&mut self, id: &str) -> Option<ActiveModuleHandle> {
        let index = self.handles.iter().position(|h| h.id == id)?;
        Some(self.handles.remove(index))
    }
}

/// Resolves, activates and tracks modules.
pub struct ModuleLoader {
    catalog: ModuleCatalog,
    active: ActiveModules,
    glint_log: GlintLog,
    lifecycle: GlintEmitter,
    project_root: PathBuf,
}

impl ModuleLoader {
    pub fn new(catalog: ModuleCatalog, glint_log: GlintLog, project_root: impl AsRef<Path>) -> Self {
        let lifecycle = GlintEmitter::new(glint_log.clone(), lifecycle::ORCHESTRATOR_SOURCE);
        Self {
            catalog,
            active: ActiveModules::default(),
            glint_log,
            lifecycle,
            project_root: project_root.as_ref().to_path_buf(),
        }
    }

    /// Activate a module, isolating any failure.
    ///
    /// Returns `None` if the module could not be brought up; the reason has
    /// already been logged and recorded as an `orchestrator.module.failed`
    /// glint.
    pub async fn load(&mut self, descriptor: &ModuleDescriptor) -> Option<ActivationReceipt> {
        match self.try_load(descriptor).await {
            Ok(receipt) => {
                tracing::info!(
                    module = %receipt.id,
                    target = %receipt.load_target,
                    entry_point = %receipt.entry_point,
                    "module activated"
                );
                self.lifecycle.emit_or_warn(
                    lifecycle::MODULE_ACTIVATED,
                    json!({
                        "id": receipt.id,
                        "load_target": receipt.load_target,
                        "entry_point": receipt.entry_point,
                    }),
                );
                Some(receipt)
            }
            Err(e) => {
                tracing::error!(module = %descriptor.id, "module failed to load: {}", e);
                self.lifecycle.emit_or_warn(
                    lifecycle::MODULE_FAILED,
                    json!({
                        "id": descriptor.id,
                        "load_target": descriptor.load_target,
                        "error": e.to_string(),
                    }),
                );
                None
            }
        }
    }

    /// Activate a module and report why it failed, without logging.
    pub async fn try_load(
        &mut self,
        descriptor: &ModuleDescriptor,
    ) -> Result<ActivationReceipt, LoadError> {
        if self.active.contains(&descriptor.id) {
            return Err(LoadError::AlreadyActive {
                id: descriptor.id.clone(),
            });
        }

        let mut module = self.catalog.resolve(descriptor)?;
        let ctx = ModuleContext::new(
            descriptor.id.clone(),
            &self.project_root,
            GlintEmitter::new(self.glint_log.clone(), descriptor.id.clone()),
        );

        let entry_point = module.entry_point();
        let outcome = match entry_point {
            EntryPoint::Activate => AssertUnwindSafe(module.activate(&ctx)).catch_unwind().await,
            EntryPoint::Run => AssertUnwindSafe(module.run(&ctx)).catch_unwind().await,
            EntryPoint::None => Ok(Ok(())),
        };

        match outcome {
            Ok(Ok(())) => {}
            Ok(Err(source)) => {
                cleanup_failed(module.as_mut(), &descriptor.id).await;
                return Err(LoadError::EntryPoint {
                    id: descriptor.id.clone(),
                    source,
                });
            }
            Err(panic) => {
                cleanup_failed(module.as_mut(), &descriptor.id).await;
                return Err(LoadError::Panicked {
                    id: descriptor.id.clone(),
                    message: panic_message(panic.as_ref()),
                });
            }
        }

        let handle = ActiveModuleHandle {
            id: descriptor.id.clone(),
            load_target: descriptor.load_target.clone(),
            activated_at: Utc::now(),
            entry_point,
            module,
        };
        let receipt = handle.receipt();
        self.active.insert(handle);
        Ok(receipt)
    }

    /// Tear down an active module so its id can be activated again.
    ///
    /// The handle is released even if the module's stop hook fails.
    pub async fn stop(&mut self, id: &str) -> Result<(), LoadError> {
        let mut handle = self
            .active
            .remove(id)
            .ok_or_else(|| LoadError::NotActive { id: id.to_string() })?;

        let result = handle.module.stop().await;
        self.lifecycle.emit_or_warn(
            lifecycle::MODULE_STOPPED,
            json!({ "id": id, "clean": result.is_ok() }),
        );
        result.map_err(|source| LoadError::StopFailed {
            id: id.to_string(),
            source,
        })?;
        tracing::info!(module = %id, "module stopped");
        Ok(())
    }

    /// Stop every active module, most recently activated first. Returns the
    /// failures; every handle is released regardless.
    pub async fn stop_all(&mut self) -> Vec<LoadError> {
        let ids: Vec<String> = self
            .active
            .ids()
            .into_iter()
            .rev()
            .map(str::to_string)
            .collect();

        let mut failures = Vec::new();
        for id in ids {
            if let Err(e) = self.stop(&id).await {
                tracing::warn!(module = %id, "{}", e);
                failures.push(e);
            }
        }
        failures
    }

    pub fn active(&self) -> &ActiveModules {
        &self.active
    }

    pub fn catalog(&self) -> &ModuleCatalog {
        &self.catalog
    }

    pub fn glint_log(&self) -> &GlintLog {
        &self.glint_log
    }

    pub fn project_root(&self) -> &Path {
        &self.project_root
    }
}

/// Stop whatever a failed entry point got going before it failed. A stop
/// hook that errors or panics is only logged.
async fn cleanup_failed(module: &mut dyn Module, id: &str) {
    match AssertUnwindSafe(module.stop()).catch_unwind().await {
        Ok(Ok(())) => {}
        Ok(Err(e)) => tracing::warn!(module = %id, "cleanup after failed entry point: {:#}", e),
        Err(panic) => tracing::warn!(
            module = %id,
            "cleanup after failed entry point panicked: {}",
            panic_message(panic.as_ref())
        ),
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}
