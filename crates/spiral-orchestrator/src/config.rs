// config.rs — Where a Spiral project keeps its registry and glint log.
//
// `SpiralConfig::for_project()` gives the standard `.spiral/` layout. An
// optional `.spiral/spiral.toml` can move either file; command-line flags
// override both. Relative paths in the TOML file are taken relative to the
// project root.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Name of the per-project state directory.
pub const STATE_DIR: &str = ".spiral";

/// Resolved locations and settings for one project.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpiralConfig {
    /// Project root; modules run with this as their working directory.
    pub project_root: PathBuf,

    /// Module registry (JSON, YAML or TOML).
    pub registry: PathBuf,

    /// Append-only glint log.
    pub glint_log: PathBuf,

    /// How often `spiral glints tail --follow` checks for new lines.
    pub tail_poll_ms: u64,
}

/// Overrides read from `.spiral/spiral.toml`. Every key is optional.
#[derive(Debug, Clone, Default, Deserialize)]
struct ConfigFile {
    registry: Option<PathBuf>,
    glint_log: Option<PathBuf>,
    tail_poll_ms: Option<u64>,
}

impl SpiralConfig {
    /// Create a config with the standard `.spiral/` layout for a project.
    pub fn for_project(project_root: impl AsRef<Path>) -> Self {
        let root = project_root.as_ref().to_path_buf();
        let state_dir = root.join(STATE_DIR);
        Self {
            registry: state_dir.join("modules.json"),
            glint_log: state_dir.join("glints.jsonl"),
            tail_poll_ms: default_tail_poll_ms(),
            project_root: root,
        }
    }

    /// The standard layout with `.spiral/spiral.toml` applied, if present.
    pub fn load(project_root: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let mut config = Self::for_project(project_root);
        let path = config.config_file();
        if !path.exists() {
            return Ok(config);
        }

        let content = std::fs::read_to_string(&path).map_err(|source| ConfigError::ReadFailed {
            path: path.clone(),
            source,
        })?;
        let file: ConfigFile = toml::from_str(&content).map_err(|e| ConfigError::ParseFailed {
            origin: path.display().to_string(),
            message: e.to_string(),
        })?;

        if let Some(registry) = file.registry {
            config.registry = config.project_root.join(registry);
        }
        if let Some(glint_log) = file.glint_log {
            config.glint_log = config.project_root.join(glint_log);
        }
        if let Some(ms) = file.tail_poll_ms {
            config.tail_poll_ms = ms.max(1);
        }
        Ok(config)
    }

    /// Path of the optional overrides file.
    pub fn config_file(&self) -> PathBuf {
        self.project_root.join(STATE_DIR).join("spiral.toml")
    }

    pub fn tail_poll_interval(&self) -> Duration {
        Duration::from_millis(self.tail_poll_ms)
    }
}

fn default_tail_poll_ms() -> u64 {
    250
}
