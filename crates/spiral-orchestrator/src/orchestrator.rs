// orchestrator.rs — Registry + loader + dispatcher + invoker, composed.
//
// One Orchestrator owns one registry and one loader. Nothing is global, so
// tests run several orchestrators side by side against separate logs.

use std::future::Future;

use serde_json::json;
use spiral_glint::GlintEmitter;

use crate::dispatcher::{self, DispatchReport};
use crate::error::NotFoundError;
use crate::invoker::OnDemandInvoker;
use crate::lifecycle;
use crate::loader::{ActivationReceipt, ModuleLoader};
use crate::registry::ModuleRegistry;

pub struct Orchestrator {
    registry: ModuleRegistry,
    loader: ModuleLoader,
    lifecycle: GlintEmitter,
}

impl Orchestrator {
    pub fn new(registry: ModuleRegistry, loader: ModuleLoader) -> Self {
        let lifecycle = GlintEmitter::new(loader.glint_log().clone(), lifecycle::ORCHESTRATOR_SOURCE);
        Self {
            registry,
            loader,
            lifecycle,
        }
    }

    /// Run the startup pass over the whole registry.
    pub async fn start(&mut self) -> DispatchReport {
        tracing::info!(modules = self.registry.len(), "starting dispatch pass");
        self.lifecycle.emit_or_warn(
            lifecycle::STARTED,
            json!({
                "modules": self.registry.len(),
                "registry": self.registry.source().map(|p| p.display().to_string()),
            }),
        );

        let report = dispatcher::dispatch(&mut self.loader, self.registry.descriptors()).await;

        tracing::info!(
            activated = report.activated.len(),
            registered = report.registered.len(),
            deferred = report.deferred.len(),
            failed = report.failed.len(),
            "dispatch pass complete"
        );
        self.lifecycle.emit_or_warn(
            lifecycle::DISPATCHED,
            serde_json::to_value(&report).unwrap_or_default(),
        );
        report
    }

    /// Activate one on-demand module outside the startup pass.
    pub async fn invoke(&mut self, id: &str) -> Result<Option<ActivationReceipt>, NotFoundError> {
        OnDemandInvoker::new(&self.registry)
            .invoke_by_id(&mut self.loader, id)
            .await
    }

    /// Start, then stay resident until `shutdown` resolves if anything came
    /// up. With nothing active the pass result is returned straight away.
    pub async fn run_until<F>(&mut self, shutdown: F) -> DispatchReport
    where
        F: Future<Output = ()>,
    {
        let report = self.start().await;
        if !report.keep_alive() {
            tracing::info!("no module activated; nothing to keep resident");
            return report;
        }

        tracing::info!(active = ?self.loader.active().ids(), "resident; waiting for termination signal");
        shutdown.await;
        self.shutdown().await;
        report
    }

    /// [`Orchestrator::run_until`] ended by Ctrl-C or SIGTERM.
    pub async fn run_resident(&mut self) -> DispatchReport {
        self.run_until(shutdown_signal()).await
    }

    /// Stop every active module and record the shutdown.
    pub async fn shutdown(&mut self) {
        let stopped = self.loader.active().len();
        let failures = self.loader.stop_all().await;
        self.lifecycle.emit_or_warn(
            lifecycle::STOPPED,
            json!({
                "stopped": stopped,
                "failed": failures.iter().map(|e| e.module_id().to_string()).collect::<Vec<_>>(),
            }),
        );
        tracing::info!(stopped, failures = failures.len(), "orchestrator stopped");
    }

    pub fn registry(&self) -> &ModuleRegistry {
        &self.registry
    }

    pub fn loader(&self) -> &ModuleLoader {
        &self.loader
    }

    pub fn loader_mut(&mut self) -> &mut ModuleLoader {
        &mut self.loader
    }
}

/// Resolves on Ctrl-C, or SIGTERM on Unix. If a handler can't be installed
/// the error is logged and that source is ignored.
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::warn!("failed to listen for Ctrl-C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::warn!("failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => tracing::info!("received Ctrl-C"),
        _ = terminate => tracing::info!("received SIGTERM"),
    }
}
