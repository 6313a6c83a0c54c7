// registry.rs — Loading the declarative module registry.
//
// The registry is a JSON, YAML or TOML document listing module descriptors
// in order. JSON and YAML accept either a bare list or a `modules:` key;
// TOML uses `[[modules]]` tables. Every descriptor must name an `id` and a
// load target, and ids must be unique. Any violation rejects the whole
// registry: a half-loaded registry would make the startup pass lie about
// what was declared.

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::descriptor::{ModuleDescriptor, RawDescriptor};
use crate::error::ConfigError;

/// Document format of a registry source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegistryFormat {
    Json,
    Yaml,
    Toml,
}

impl RegistryFormat {
    /// Pick the format from a file extension.
    pub fn from_path(path: &Path) -> Option<Self> {
        match path.extension()?.to_str()?.to_ascii_lowercase().as_str() {
            "json" => Some(RegistryFormat::Json),
            "yaml" | "yml" => Some(RegistryFormat::Yaml),
            "toml" => Some(RegistryFormat::Toml),
            _ => None,
        }
    }
}

/// Either `[ {...}, ... ]` or `{ "modules": [ {...}, ... ] }`.
#[derive(Deserialize)]
#[serde(untagged)]
enum RegistryDocument {
    List(Vec<RawDescriptor>),
    Table { modules: Vec<RawDescriptor> },
}

impl RegistryDocument {
    fn into_entries(self) -> Vec<RawDescriptor> {
        match self {
            RegistryDocument::List(entries) | RegistryDocument::Table { modules: entries } => {
                entries
            }
        }
    }
}

/// An ordered, validated list of module descriptors.
#[derive(Debug, Clone, Default)]
pub struct ModuleRegistry {
    descriptors: Vec<ModuleDescriptor>,
    source: Option<PathBuf>,
}

impl ModuleRegistry {
    /// Load and validate a registry file. The format follows the extension.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let format = RegistryFormat::from_path(path).ok_or_else(|| {
            ConfigError::UnsupportedFormat {
                path: path.to_path_buf(),
            }
        })?;
        let content = fs::read_to_string(path).map_err(|source| ConfigError::ReadFailed {
            path: path.to_path_buf(),
            source,
        })?;

        let mut registry = Self::parse(&content, format, &path.display().to_string())?;
        registry.source = Some(path.to_path_buf());
        tracing::debug!(
            path = %path.display(),
            modules = registry.len(),
            "module registry loaded"
        );
        Ok(registry)
    }

    /// Parse registry content held in memory.
    pub fn parse_str(content: &str, format: RegistryFormat) -> Result<Self, ConfigError> {
        Self::parse(content, format, "<inline registry>")
    }

    /// Build a registry from descriptors constructed in code. The same
    /// validation as a file load applies.
    pub fn from_descriptors(descriptors: Vec<ModuleDescriptor>) -> Result<Self, ConfigError> {
        let origin = "<in-memory registry>";
        let mut seen = HashSet::new();
        for (index, descriptor) in descriptors.iter().enumerate() {
            if descriptor.id.trim().is_empty() {
                return Err(missing(origin, index, "id"));
            }
            if descriptor.load_target.trim().is_empty() {
                return Err(missing(origin, index, "path"));
            }
            if !seen.insert(descriptor.id.clone()) {
                return Err(ConfigError::DuplicateId {
                    origin: origin.to_string(),
                    id: descriptor.id.clone(),
                });
            }
        }
        Ok(Self {
            descriptors,
            source: None,
        })
    }

    fn parse(content: &str, format: RegistryFormat, origin: &str) -> Result<Self, ConfigError> {
        let parse_failed = |message: String| ConfigError::ParseFailed {
            origin: origin.to_string(),
            message,
        };

        let document: RegistryDocument = match format {
            RegistryFormat::Json => {
                serde_json::from_str(content).map_err(|e| parse_failed(e.to_string()))?
            }
            RegistryFormat::Yaml => {
                serde_yaml::from_str(content).map_err(|e| parse_failed(e.to_string()))?
            }
            RegistryFormat::Toml => {
                toml::from_str(content).map_err(|e| parse_failed(e.to_string()))?
            }
        };

        let mut descriptors = Vec::new();
        let mut seen = HashSet::new();
        for (index, raw) in document.into_entries().into_iter().enumerate() {
            let id = required(raw.id, origin, index, "id")?;
            let load_target = required(raw.path, origin, index, "path")?;
            if !seen.insert(id.clone()) {
                return Err(ConfigError::DuplicateId {
                    origin: origin.to_string(),
                    id,
                });
            }
            descriptors.push(ModuleDescriptor {
                id,
                load_target,
                trigger: raw.trigger,
                options: raw.options,
                description: raw.description,
            });
        }

        Ok(Self {
            descriptors,
            source: None,
        })
    }

    /// All descriptors, in registry order.
    pub fn descriptors(&self) -> &[ModuleDescriptor] {
        &self.descriptors
    }

    /// Look up a descriptor by id, whatever its trigger.
    pub fn get(&self, id: &str) -> Option<&ModuleDescriptor> {
        self.descriptors.iter().find(|d| d.id == id)
    }

    /// Look up a descriptor by id, only if it is declared `on_demand`.
    pub fn on_demand(&self, id: &str) -> Option<&ModuleDescriptor> {
        self.get(id).filter(|d| d.trigger.is_on_demand())
    }

    /// The file this registry was loaded from, if any.
    pub fn source(&self) -> Option<&Path> {
        self.source.as_deref()
    }

    pub fn len(&self) -> usize {
        self.descriptors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }
}

fn required(
    value: Option<String>,
    origin: &str,
    index: usize,
    field: &'static str,
) -> Result<String, ConfigError> {
    match value {
        Some(v) if !v.trim().is_empty() => Ok(v),
        _ => Err(missing(origin, index, field)),
    }
}

fn missing(origin: &str, index: usize, field: &'static str) -> ConfigError {
    ConfigError::MissingField {
        origin: origin.to_string(),
        index,
        field,
    }
}
