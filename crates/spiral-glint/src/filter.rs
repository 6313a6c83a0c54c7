// filter.rs — Selecting glints by taxonomy and source.

use serde::{Deserialize, Serialize};

use crate::glint::Glint;

/// Consumer-side filter. An empty filter accepts everything.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GlintFilter {
    /// Taxonomy prefix, matched on whole segments: `spiral` accepts
    /// `spiral.awakened` but not `spiralling.x`.
    pub glint_type: Option<String>,

    /// Exact producer name.
    pub source: Option<String>,
}

impl GlintFilter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Restrict to a taxonomy prefix.
    pub fn glint_type(mut self, prefix: impl Into<String>) -> Self {
        self.glint_type = Some(prefix.into());
        self
    }

    /// Restrict to a single producer.
    pub fn source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }

    pub fn matches(&self, glint: &Glint) -> bool {
        if let Some(source) = &self.source {
            if glint.source != *source {
                return false;
            }
        }
        match &self.glint_type {
            Some(prefix) => type_matches(&glint.glint_type, prefix),
            None => true,
        }
    }
}

fn type_matches(glint_type: &str, prefix: &str) -> bool {
    if prefix.is_empty() || glint_type == prefix {
        return true;
    }
    match glint_type.strip_prefix(prefix) {
        Some(rest) => prefix.ends_with('.') || rest.starts_with('.'),
        None => false,
    }
}
