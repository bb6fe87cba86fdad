//! Programmatic navigation and manual suppression of scroll listeners.

use std::sync::PoisonError;

use tracing::{debug, info};

use super::{AnchorEngine, AnchorEvent, EngineInner};
use crate::anchor::resolver;
use crate::geometry::Coordinates;
use crate::Result;

impl AnchorEngine {
    /// Scroll the viewport to the anchor `name`, plus the configured offsets.
    ///
    /// Fails with [`crate::Error::InvalidAnchorKey`] for an unknown name. An
    /// anchor that can no longer be measured is a silent no-op. Repeated
    /// requests for the same anchor inside one throttle window collapse into
    /// the first; requests for different anchors never delay each other.
    pub async fn scroll_to(&self, name: &str) -> Result<()> {
        let snapshot = self.inner.snapshot();
        let anchor =
            match resolver::resolve_one(&snapshot, &self.inner.viewport, name, || self.inner.offset()).await {
                Ok(anchor) => anchor,
                Err(e) if e.is_invalid_handle() => {
                    debug!(anchor = name, error = %e, "Skipping navigation to unmeasurable anchor");
                    return Ok(());
                }
                Err(e) => return Err(e),
            };

        let config = &self.inner.config;
        let target = anchor + Coordinates::new(config.offset_x, config.offset_y);

        let throttle = self.inner.navigation.call(&name.to_string())?;
        if throttle.is_throttled() {
            debug!(anchor = name, "Navigation throttled");
        }
        throttle.call(target);

        Ok(())
    }

    /// Suppress reached-anchor detection until `duration_ms` passes without
    /// another call with the same duration.
    ///
    /// Scroll offsets keep being tracked while suppressed. Each distinct
    /// duration has its own release timer.
    pub fn timeout_on_scroll(&self, duration_ms: u64) -> Result<()> {
        self.inner.scroll.lock().unwrap_or_else(PoisonError::into_inner).suppressed = true;
        debug!(duration_ms, "Scroll listeners suppressed");
        self.inner.emit(AnchorEvent::Suppressed { duration_ms });

        let release = self.inner.releases.call(&duration_ms)?;
        release.call(());
        Ok(())
    }
}

/// Leading edge of a per-anchor navigation throttle
pub(super) fn issue_move(engine: &EngineInner, name: &str, target: Coordinates) {
    let Some(viewport) = engine.viewport.upgrade() else {
        debug!(anchor = name, "Viewport dropped before navigation");
        return;
    };

    info!(anchor = name, target = %target, "Scrolling to anchor");
    engine.emit(AnchorEvent::NavigationIssued {
        name: name.to_string(),
        target,
    });
    tokio::spawn(async move {
        viewport.scroll_to(target).await;
    });
}

/// Trailing edge of a suppression timer
pub(super) fn release(engine: &EngineInner) {
    let released = {
        let mut scroll = engine.scroll.lock().unwrap_or_else(PoisonError::into_inner);
        std::mem::replace(&mut scroll.suppressed, false)
    };

    if released {
        debug!("Scroll listeners released");
        engine.emit(AnchorEvent::Released);
    }
}
