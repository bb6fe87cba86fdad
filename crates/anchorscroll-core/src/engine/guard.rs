//! Registration tied to the lifetime of a value.

use std::fmt;
use std::sync::Weak;

use super::EngineInner;
use crate::host::AnchorHandle;

/// Keeps an anchor registered until dropped.
///
/// Returned by [`super::AnchorEngine::attach`]. Dropping the guard
/// unregisters the anchor unless the name has since been registered with a
/// different handle. The guard does not keep the engine alive.
#[must_use = "the anchor is unregistered as soon as the guard is dropped"]
pub struct AnchorGuard {
    engine: Weak<EngineInner>,
    name: String,
    handle: Weak<dyn AnchorHandle>,
}

impl AnchorGuard {
    pub(super) fn new(engine: Weak<EngineInner>, name: String, handle: Weak<dyn AnchorHandle>) -> Self {
        Self { engine, name, handle }
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

impl Drop for AnchorGuard {
    fn drop(&mut self) {
        if let Some(engine) = self.engine.upgrade() {
            engine.unregister_if_same(&self.name, &self.handle);
        }
    }
}

impl fmt::Debug for AnchorGuard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AnchorGuard").field("name", &self.name).finish_non_exhaustive()
    }
}
