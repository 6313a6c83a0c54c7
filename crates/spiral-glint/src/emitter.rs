// emitter.rs — A glint log bound to one producer name.

use crate::error::GlintError;
use crate::glint::Glint;
use crate::log::GlintLog;

/// Appends glints on behalf of a fixed `source`.
///
/// Each module receives one of these in its context, so it never has to
/// spell its own name when recording what it did.
#[derive(Debug, Clone)]
pub struct GlintEmitter {
    log: GlintLog,
    source: String,
}

impl GlintEmitter {
    pub fn new(log: GlintLog, source: impl Into<String>) -> Self {
        Self {
            log,
            source: source.into(),
        }
    }

    /// Record a glint with the given type and payload. Returns the glint as
    /// written.
    pub fn emit(
        &self,
        glint_type: impl Into<String>,
        payload: serde_json::Value,
    ) -> Result<Glint, GlintError> {
        let glint = Glint::new(glint_type, self.source.clone()).with_payload(payload);
        self.log.append(&glint)?;
        Ok(glint)
    }

    /// Like [`GlintEmitter::emit`], but a failed write is only logged.
    /// For lifecycle bookkeeping that must never interrupt the caller.
    pub fn emit_or_warn(&self, glint_type: &str, payload: serde_json::Value) {
        if let Err(e) = self.emit(glint_type, payload) {
            tracing::warn!(source = %self.source, glint_type, "failed to record glint: {}", e);
        }
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn log(&self) -> &GlintLog {
        &self.log
    }
}
