//! Scroll event pipeline.
//!
//! Every event updates the tracked offset. While not suppressed, events also
//! go through the shared detection throttle, whose leading call spawns a
//! detection pass: resolve all anchors, find the reached anchor per axis,
//! notify the axis callbacks.

use std::sync::{Arc, PoisonError};

use tracing::{debug, trace, warn};

use super::{AnchorEngine, AnchorEvent, EngineInner};
use crate::anchor::{detector, resolver};
use crate::geometry::Axis;
use crate::host::ScrollEvent;

impl AnchorEngine {
    /// Scroll event handler to wire to the viewport.
    ///
    /// The offset update is applied before returning; detection runs in a
    /// spawned task.
    pub fn on_scroll(&self, event: ScrollEvent) {
        let suppressed = {
            let mut scroll = self.inner.scroll.lock().unwrap_or_else(PoisonError::into_inner);
            scroll.offset = event.offset;
            scroll.suppressed
        };

        if suppressed {
            trace!(offset = %event.offset, "Scroll event while suppressed");
            return;
        }

        self.inner.detection.call(event);
    }
}

pub(super) async fn run_detection(engine: Arc<EngineInner>, event: ScrollEvent) {
    let snapshot = engine.snapshot();
    trace!(
        offset = %event.offset,
        anchors = snapshot.len(),
        version = snapshot.version(),
        "Running reached-anchor detection"
    );

    let anchors = match resolver::resolve_all(&snapshot, &engine.viewport, || engine.offset()).await {
        Ok(anchors) => anchors,
        Err(e) => {
            warn!(error = %e, "Reached-anchor detection failed");
            return;
        }
    };

    // A suppression requested while measurements were in flight wins.
    if engine.is_suppressed() {
        debug!("Dropping detection result: suppressed during measurement");
        return;
    }

    let offset = engine.offset();
    let reached = detector::detect(&anchors, offset, engine.config.keep_in_bounds);

    for axis in Axis::ALL {
        let Some(name) = reached.get(axis) else {
            continue;
        };

        debug!(%axis, anchor = name, offset = %offset, "Anchor reached");
        let callback = match axis {
            Axis::X => engine.on_reached_x.as_ref(),
            Axis::Y => engine.on_reached_y.as_ref(),
        };
        if let Some(callback) = callback {
            callback(name);
        }
        engine.emit(AnchorEvent::AnchorReached {
            axis,
            name: name.to_string(),
        });
    }
}
