// awaken.rs — One-shot `spiral.awakened` announcement.

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;

use spiral_orchestrator::{Module, ModuleContext, ModuleDescriptor};

pub const AWAKENED: &str = "spiral.awakened";

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AwakenOptions {
    pub message: String,
    /// Copied into the glint payload as-is.
    pub extra: serde_json::Value,
}

impl Default for AwakenOptions {
    fn default() -> Self {
        Self {
            message: "the spiral is awake".to_string(),
            extra: serde_json::Value::Null,
        }
    }
}

/// Records a single glint when activated, then does nothing.
pub struct Awaken {
    options: AwakenOptions,
}

impl Awaken {
    pub fn from_descriptor(descriptor: &ModuleDescriptor) -> anyhow::Result<Self> {
        Ok(Self {
            options: crate::options(descriptor)?,
        })
    }
}

#[async_trait]
impl Module for Awaken {
    async fn activate(&mut self, ctx: &ModuleContext) -> anyhow::Result<()> {
        let mut payload = json!({
            "message": self.options.message,
            "project_root": ctx.project_root().display().to_string(),
        });
        if !self.options.extra.is_null() {
            payload["extra"] = self.options.extra.clone();
        }
        ctx.glints().emit(AWAKENED, payload)?;
        Ok(())
    }
}
