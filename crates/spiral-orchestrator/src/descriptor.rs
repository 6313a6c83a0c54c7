// descriptor.rs — Module descriptors and trigger policies.
//
// A descriptor is one entry of the registry: which module, where its code
// comes from, and when it should be activated. Descriptors are read once at
// startup and never change afterwards.

use std::fmt;

use serde::{Deserialize, Serialize};

/// When a module is activated.
///
/// `on_start` and `on_idle` are activated during the startup pass,
/// `on_demand` only through the on-demand invoker. Every other value,
/// including a missing trigger, is `Deferred`: logged and left inert. The
/// declared text is kept so logs show what the registry actually said.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Option<String>", into = "String")]
pub enum Trigger {
    OnStart,
    OnIdle,
    OnDemand,
    Deferred(Option<String>),
}

impl Trigger {
    /// Activated during the startup pass.
    pub fn is_immediate(&self) -> bool {
        matches!(self, Trigger::OnStart | Trigger::OnIdle)
    }

    pub fn is_on_demand(&self) -> bool {
        matches!(self, Trigger::OnDemand)
    }
}

impl Default for Trigger {
    fn default() -> Self {
        Trigger::Deferred(None)
    }
}

impl From<Option<String>> for Trigger {
    fn from(value: Option<String>) -> Self {
        match value.as_deref().map(str::trim) {
            Some("on_start") => Trigger::OnStart,
            Some("on_idle") => Trigger::OnIdle,
            Some("on_demand") => Trigger::OnDemand,
            Some("deferred") | Some("") | None => Trigger::Deferred(None),
            Some(other) => Trigger::Deferred(Some(other.to_string())),
        }
    }
}

impl From<&str> for Trigger {
    fn from(value: &str) -> Self {
        Trigger::from(Some(value.to_string()))
    }
}

impl From<Trigger> for String {
    fn from(trigger: Trigger) -> Self {
        trigger.to_string()
    }
}

impl fmt::Display for Trigger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Trigger::OnStart => write!(f, "on_start"),
            Trigger::OnIdle => write!(f, "on_idle"),
            Trigger::OnDemand => write!(f, "on_demand"),
            Trigger::Deferred(None) => write!(f, "deferred"),
            Trigger::Deferred(Some(raw)) => write!(f, "{}", raw),
        }
    }
}

/// One validated registry entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModuleDescriptor {
    /// Unique within one registry.
    pub id: String,

    /// Where the module's code comes from: a catalog key such as
    /// `builtin:heartbeat`, or `exec:<program> [args...]`.
    #[serde(rename = "path")]
    pub load_target: String,

    pub trigger: Trigger,

    /// Free-form settings handed to the module factory.
    #[serde(default, skip_serializing_if = "serde_json::Value::is_null")]
    pub options: serde_json::Value,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl ModuleDescriptor {
    pub fn new(
        id: impl Into<String>,
        load_target: impl Into<String>,
        trigger: impl Into<Trigger>,
    ) -> Self {
        Self {
            id: id.into(),
            load_target: load_target.into(),
            trigger: trigger.into(),
            options: serde_json::Value::Null,
            description: None,
        }
    }

    /// Set the factory options and return self.
    pub fn with_options(mut self, options: serde_json::Value) -> Self {
        self.options = options;
        self
    }

    /// Set the description and return self.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

/// A descriptor as written in the registry, before validation. Required
/// fields are optional here so a missing one becomes a precise
/// `ConfigError::MissingField` rather than a generic parse error.
#[derive(Debug, Deserialize)]
pub(crate) struct RawDescriptor {
    #[serde(default)]
    pub id: Option<String>,

    #[serde(default, alias = "loadTarget", alias = "load_target")]
    pub path: Option<String>,

    #[serde(default)]
    pub trigger: Trigger,

    #[serde(default)]
    pub options: serde_json::Value,

    #[serde(default)]
    pub description: Option<String>,
}
