//! # spiral-builtins
//!
//! Capability modules compiled into the Spiral daemon.
//!
//! | load target | module | entry |
//! |---|---|---|
//! | `builtin:heartbeat` | [`Heartbeat`] — `spiral.pulse` every interval | long-lived |
//! | `builtin:awaken` | [`Awaken`] — one `spiral.awakened` glint | one-shot |
//! | `builtin:watch` | [`Watch`] — `spiral.file.*` glints for a path | long-lived |

pub mod awaken;
pub mod heartbeat;
pub mod watch;

pub use awaken::Awaken;
pub use heartbeat::Heartbeat;
pub use watch::Watch;

use serde::de::DeserializeOwned;
use spiral_orchestrator::{Module, ModuleCatalog, ModuleDescriptor};

/// Register every built-in module in `catalog`.
pub fn register_builtins(catalog: &mut ModuleCatalog) {
    catalog.register("builtin:heartbeat", |d| {
        Ok(Box::new(Heartbeat::from_descriptor(d)?) as Box<dyn Module>)
    });
    catalog.register("builtin:awaken", |d| {
        Ok(Box::new(Awaken::from_descriptor(d)?) as Box<dyn Module>)
    });
    catalog.register("builtin:watch", |d| {
        Ok(Box::new(Watch::from_descriptor(d)?) as Box<dyn Module>)
    });
}

/// A catalog holding the built-ins, with `exec:` targets enabled.
pub fn builtin_catalog() -> ModuleCatalog {
    let mut catalog = ModuleCatalog::new();
    register_builtins(&mut catalog);
    catalog
}

/// Descriptor options as `T`; absent options mean `T::default()`.
pub(crate) fn options<T: DeserializeOwned + Default>(
    descriptor: &ModuleDescriptor,
) -> anyhow::Result<T> {
    if descriptor.options.is_null() {
        return Ok(T::default());
    }
    serde_json::from_value(descriptor.options.clone()).map_err(|e| {
        anyhow::anyhow!("invalid options for module `{}`: {}", descriptor.id, e)
    })
}
