//! # spiral-orchestrator
//!
//! Trigger-driven module orchestration for Spiral.
//!
//! A [`ModuleRegistry`] lists capability modules and the trigger that
//! decides when each is activated. The [`Orchestrator`] walks the registry
//! once at startup: `on_start`/`on_idle` modules are activated one after
//! another through the [`ModuleLoader`], `on_demand` modules wait for the
//! [`OnDemandInvoker`], and anything else is deferred. Every step is
//! recorded in the shared glint log (`spiral-glint`).
//!
//! ## Key components
//!
//! - [`ModuleRegistry`] — ordered, validated descriptors from JSON/YAML/TOML
//! - [`ModuleCatalog`] — load target → factory table, plus `exec:` commands
//! - [`ModuleLoader`] — failure-isolated activation and teardown
//! - [`dispatch`] — the startup pass, producing a [`DispatchReport`]
//! - [`OnDemandInvoker`] — activation of a single `on_demand` module by id
//! - [`Orchestrator`] — all of the above, plus resident mode
//! - [`Module`] — the trait capability modules implement

pub mod catalog;
pub mod command;
pub mod config;
pub mod descriptor;
pub mod dispatcher;
pub mod error;
pub mod invoker;
pub mod lifecycle;
pub mod loader;
pub mod module;
pub mod orchestrator;
pub mod registry;
pub mod testing;

pub use catalog::{ModuleCatalog, ModuleFactory, EXEC_SCHEME};
pub use command::CommandModule;
pub use config::SpiralConfig;
pub use descriptor::{ModuleDescriptor, Trigger};
pub use dispatcher::{dispatch, DispatchReport};
pub use error::{ConfigError, LoadError, NotFoundError, OrchestratorError};
pub use invoker::OnDemandInvoker;
pub use loader::{ActivationReceipt, ActiveModuleHandle, ActiveModules, ModuleLoader};
pub use module::{EntryPoint, Module, ModuleContext};
pub use orchestrator::{shutdown_signal, Orchestrator};
pub use registry::{ModuleRegistry, RegistryFormat};
