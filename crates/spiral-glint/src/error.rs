// error.rs — Error types for the glint log.
//
// Uses `thiserror` to derive the standard Rust `Error` trait automatically.
// Each variant maps to a specific failure mode when writing or reading glints.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while writing or reading the glint log.
#[derive(Debug, Error)]
pub enum GlintError {
    /// Failed to create the directory that holds the log.
    #[error("failed to create glint log directory {path}: {source}")]
    CreateDirFailed {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Failed to open or create the log file.
    #[error("failed to open glint log at {path}: {source}")]
    OpenFailed {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Failed to write a glint to the log.
    #[error("failed to append glint to {path}: {source}")]
    WriteFailed {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Failed to read from the log.
    #[error("failed to read glint log at {path}: {source}")]
    ReadFailed {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Failed to serialize a glint.
    #[error("serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
}
