//! Collaborator traits implemented by the UI layer.
//!
//! The engine never owns a handle: the registry and the engine keep `Weak`
//! references, so an element dropped by its owner behaves exactly like a
//! detached one.

use serde::{Deserialize, Serialize};

use crate::geometry::Coordinates;
use crate::Result;

/// Raw scroll event delivered by the viewport
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ScrollEvent {
    /// Current content offset of the viewport
    pub offset: Coordinates,
}

impl ScrollEvent {
    pub const fn new(x: f64, y: f64) -> Self {
        Self {
            offset: Coordinates::new(x, y),
        }
    }
}

/// A measurable anchor element
#[async_trait::async_trait]
pub trait AnchorHandle: Send + Sync {
    /// Whether the underlying element is currently attached
    fn is_mounted(&self) -> bool;

    /// Measure absolute screen coordinates of the element.
    ///
    /// Completes after the host's layout pass. Fails with
    /// [`crate::Error::InvalidHandle`] when the element is detached.
    async fn measure(&self) -> Result<Coordinates>;
}

/// The scrollable container anchors are positioned in
#[async_trait::async_trait]
pub trait ViewportHandle: Send + Sync {
    /// Measure absolute screen coordinates of the viewport origin.
    ///
    /// Same contract as [`AnchorHandle::measure`].
    async fn measure(&self) -> Result<Coordinates>;

    /// Move the content offset to `target`
    async fn scroll_to(&self, target: Coordinates);
}
