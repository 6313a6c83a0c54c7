// glint.rs — Glint data model.
//
// A glint is one occurrence worth recording: a module woke up, a heartbeat
// fired, a module failed to load. Every glint is serialized as a single JSON
// object on its own line, so each line of the log can be parsed on its own.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A single glint — one line in the JSONL glint log.
///
/// `glint_type` is a dot-separated taxonomy string such as `spiral.awakened`
/// or `orchestrator.module.failed`. Older producers write the same field as
/// `type`, so both spellings are accepted on read.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Glint {
    /// When the glint was produced (UTC).
    pub timestamp: DateTime<Utc>,

    /// Dot-separated kind of occurrence.
    #[serde(alias = "type")]
    pub glint_type: String,

    /// Module or subsystem that produced the glint.
    pub source: String,

    /// Module-defined data. Omitted from the line when empty.
    #[serde(default, skip_serializing_if = "serde_json::Value::is_null")]
    pub payload: serde_json::Value,

    /// Random id so consumers can drop a line they have already seen.
    /// Producers outside this crate may not set it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub glint_id: Option<Uuid>,
}

impl Glint {
    /// Create a glint stamped with the current time and a fresh id.
    pub fn new(glint_type: impl Into<String>, source: impl Into<String>) -> Self {
        Self {
            timestamp: Utc::now(),
            glint_type: glint_type.into(),
            source: source.into(),
            payload: serde_json::Value::Null,
            glint_id: Some(Uuid::new_v4()),
        }
    }

    /// Attach a payload and return self (builder pattern).
    pub fn with_payload(mut self, payload: serde_json::Value) -> Self {
        self.payload = payload;
        self
    }

    /// Override the timestamp. Used when replaying or importing glints.
    pub fn at(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = timestamp;
        self
    }

    /// The first segment of the taxonomy (`spiral` for `spiral.awakened`).
    pub fn family(&self) -> &str {
        self.glint_type
            .split('.')
            .next()
            .unwrap_or(self.glint_type.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn serializes_to_a_single_line() {
        let glint = Glint::new("spiral.awakened", "awaken")
            .with_payload(json!({ "note": "line one\nline two" }));
        let line = serde_json::to_string(&glint).unwrap();
        assert!(!line.contains('\n'));
        assert!(line.contains("\"glint_type\":\"spiral.awakened\""));
    }

    #[test]
    fn accepts_legacy_type_field() {
        let line = r#"{"timestamp":"2024-03-01T12:00:00.000Z","type":"tone.shift","source":"tone"}"#;
        let glint: Glint = serde_json::from_str(line).unwrap();
        assert_eq!(glint.glint_type, "tone.shift");
        assert_eq!(glint.source, "tone");
        assert!(glint.payload.is_null());
        assert!(glint.glint_id.is_none());
    }

    #[test]
    fn empty_payload_is_omitted() {
        let line = serde_json::to_string(&Glint::new("a.b", "x")).unwrap();
        assert!(!line.contains("payload"));
    }

    #[test]
    fn glint_ids_are_unique() {
        let g1 = Glint::new("a.b", "x");
        let g2 = Glint::new("a.b", "x");
        assert_ne!(g1.glint_id, g2.glint_id);
    }

    #[test]
    fn family_is_first_segment() {
        assert_eq!(Glint::new("spiral.awakened", "x").family(), "spiral");
        assert_eq!(Glint::new("flat", "x").family(), "flat");
    }
}
