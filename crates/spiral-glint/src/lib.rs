//! # spiral-glint
//!
//! Append-only glint log for Spiral.
//!
//! Everything worth knowing about a running orchestrator (a module was
//! activated, a module failed, a heartbeat fired) is recorded as a [`Glint`]
//! in a JSONL (JSON Lines) file. Producers only append; consumers follow the
//! file with a [`GlintReader`] and never call into producers.
//!
//! ## Quick Example
//!
//! ```rust,no_run
//! use spiral_glint::{Glint, GlintLog, GlintReader};
//!
//! let log = GlintLog::new("/tmp/glints.jsonl");
//! log.append(&Glint::new("spiral.awakened", "awaken")).unwrap();
//!
//! let mut reader = GlintReader::from_start("/tmp/glints.jsonl");
//! for glint in reader.poll().unwrap() {
//!     println!("{} {}", glint.source, glint.glint_type);
//! }
//! ```

// Module declarations — each `mod foo;` tells Rust to look for `foo.rs`
// in the same directory and include it as a submodule.
pub mod emitter;
pub mod error;
pub mod filter;
pub mod glint;
pub mod log;
pub mod reader;

// Re-export the main types at the crate root for convenience.
pub use emitter::GlintEmitter;
pub use error::GlintError;
pub use filter::GlintFilter;
pub use glint::Glint;
pub use log::GlintLog;
pub use reader::{Follow, GlintReader};
