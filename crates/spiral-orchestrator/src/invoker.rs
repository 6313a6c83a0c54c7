// invoker.rs — Activating a single on-demand module by id.
//
// Only descriptors declared `on_demand` can be invoked. Asking for an
// `on_start` or deferred module by name fails just like asking for one that
// doesn't exist, and the loader is never touched.

use crate::error::NotFoundError;
use crate::loader::{ActivationReceipt, ModuleLoader};
use crate::registry::ModuleRegistry;

/// Looks up on-demand descriptors and hands them to the loader.
pub struct OnDemandInvoker<'a> {
    registry: &'a ModuleRegistry,
}

impl<'a> OnDemandInvoker<'a> {
    pub fn new(registry: &'a ModuleRegistry) -> Self {
        Self { registry }
    }

    /// Activate the on-demand module `id`.
    ///
    /// `Err` means nothing was invocable under that id. `Ok(None)` means the
    /// module was found but failed to load; the loader has already logged
    /// why.
    pub async fn invoke_by_id(
        &self,
        loader: &mut ModuleLoader,
        id: &str,
    ) -> Result<Option<ActivationReceipt>, NotFoundError> {
        let descriptor = match self.registry.get(id) {
            None => return Err(NotFoundError::UnknownId { id: id.to_string() }),
            Some(d) if !d.trigger.is_on_demand() => {
                return Err(NotFoundError::NotOnDemand {
                    id: id.to_string(),
                    trigger: d.trigger.to_string(),
                })
            }
            Some(d) => d,
        };

        tracing::info!(module = %id, "invoking on-demand module");
        Ok(loader.load(descriptor).await)
    }
}
