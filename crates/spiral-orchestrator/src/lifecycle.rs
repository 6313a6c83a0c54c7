// lifecycle.rs — Glint types the orchestrator records about itself.
//
// Dashboards key on these strings, so they are part of the log format.

/// `source` of every glint written by the orchestrator.
pub const ORCHESTRATOR_SOURCE: &str = "orchestrator";

pub const STARTED: &str = "orchestrator.started";
pub const DISPATCHED: &str = "orchestrator.dispatched";
pub const STOPPED: &str = "orchestrator.stopped";

pub const MODULE_ACTIVATED: &str = "orchestrator.module.activated";
pub const MODULE_FAILED: &str = "orchestrator.module.failed";
pub const MODULE_REGISTERED: &str = "orchestrator.module.registered";
pub const MODULE_DEFERRED: &str = "orchestrator.module.deferred";
pub const MODULE_STOPPED: &str = "orchestrator.module.stopped";
