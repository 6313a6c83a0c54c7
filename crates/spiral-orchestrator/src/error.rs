// error.rs — Error types for module orchestration.
//
// Three failure classes with very different blast radii:
//   ConfigError   — the registry itself is broken; nothing is dispatched.
//   LoadError     — one module failed; logged, siblings carry on.
//   NotFoundError — an on-demand request named something not invocable.

use std::path::PathBuf;

use thiserror::Error;

/// The registry or daemon configuration could not be used.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The source file is missing or unreadable.
    #[error("failed to read {path}: {source}")]
    ReadFailed {
        path: PathBuf,
        source: std::io::Error,
    },

    /// The source is not valid JSON/YAML/TOML or has the wrong shape.
    #[error("failed to parse {origin}: {message}")]
    ParseFailed { origin: String, message: String },

    /// The file extension doesn't name a supported format.
    #[error("unsupported registry format for {path} (expected .json, .yaml, .yml or .toml)")]
    UnsupportedFormat { path: PathBuf },

    /// A descriptor is missing a required field or has it blank.
    #[error("module #{index} in {origin} is missing required field `{field}`")]
    MissingField {
        origin: String,
        index: usize,
        field: &'static str,
    },

    /// Two descriptors share an id.
    #[error("duplicate module id `{id}` in {origin}")]
    DuplicateId { origin: String, id: String },
}

/// A single module could not be brought up.
#[derive(Debug, Error)]
pub enum LoadError {
    /// No factory is registered for the load target.
    #[error("module `{id}`: no loader registered for target `{target}`")]
    Unresolved { id: String, target: String },

    /// The factory refused to build the module.
    #[error("module `{id}`: failed to instantiate: {source:#}")]
    Instantiate {
        id: String,
        #[source]
        source: anyhow::Error,
    },

    /// The module's entry point returned an error.
    #[error("module `{id}`: entry point failed: {source:#}")]
    EntryPoint {
        id: String,
        #[source]
        source: anyhow::Error,
    },

    /// The module's entry point panicked.
    #[error("module `{id}`: entry point panicked: {message}")]
    Panicked { id: String, message: String },

    /// The id is already active; it must be stopped before loading again.
    #[error("module `{id}` is already active; stop it before activating again")]
    AlreadyActive { id: String },

    /// `stop` was asked for a module that isn't active.
    #[error("module `{id}` is not active")]
    NotActive { id: String },

    /// The module's stop hook returned an error. The handle is dropped anyway.
    #[error("module `{id}`: stop failed: {source:#}")]
    StopFailed {
        id: String,
        #[source]
        source: anyhow::Error,
    },
}

impl LoadError {
    /// The module id this error is about.
    pub fn module_id(&self) -> &str {
        match self {
            LoadError::Unresolved { id, .. }
            | LoadError::Instantiate { id, .. }
            | LoadError::EntryPoint { id, .. }
            | LoadError::Panicked { id, .. }
            | LoadError::AlreadyActive { id }
            | LoadError::NotActive { id }
            | LoadError::StopFailed { id, .. } => id,
        }
    }
}

/// An on-demand invocation named a module that can't be invoked that way.
#[derive(Debug, Error)]
pub enum NotFoundError {
    /// No descriptor has this id.
    #[error("no module with id `{id}` in the registry")]
    UnknownId { id: String },

    /// The descriptor exists but isn't declared `on_demand`.
    #[error("module `{id}` is declared `{trigger}`, not `on_demand`")]
    NotOnDemand { id: String, trigger: String },
}

impl NotFoundError {
    pub fn module_id(&self) -> &str {
        match self {
            NotFoundError::UnknownId { id } | NotFoundError::NotOnDemand { id, .. } => id,
        }
    }
}

/// Umbrella error for callers that drive the whole orchestrator.
#[derive(Debug, Error)]
pub enum OrchestratorError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    NotFound(#[from] NotFoundError),

    #[error(transparent)]
    Load(#[from] LoadError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
