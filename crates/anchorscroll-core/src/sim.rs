//! In-memory host: a viewport and anchors laid out in its content.
//!
//! Measurements follow real hosts: an anchor reports its absolute screen
//! position, which moves as the viewport scrolls. Used by the tests and the
//! command-line driver.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError, Weak};
use std::time::Duration;

use tokio::sync::mpsc;
use tracing::warn;

use crate::geometry::Coordinates;
use crate::host::{AnchorHandle, ScrollEvent, ViewportHandle};
use crate::{Error, Result};

#[derive(Debug, Default)]
struct ViewportState {
    offset: Coordinates,
    moves: Vec<Coordinates>,
}

/// Simulated scroll container
#[derive(Debug)]
pub struct SimViewport {
    /// Absolute screen position of the content origin at offset zero
    origin: Coordinates,
    state: Mutex<ViewportState>,
    mounted: AtomicBool,
    latency: Duration,
    events: Option<mpsc::UnboundedSender<ScrollEvent>>,
}

impl SimViewport {
    pub fn new(origin: Coordinates) -> Self {
        Self {
            origin,
            state: Mutex::new(ViewportState::default()),
            mounted: AtomicBool::new(true),
            latency: Duration::ZERO,
            events: None,
        }
    }

    /// Delay every measurement by `latency`, standing in for a layout pass
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    /// Publish a scroll event whenever the offset changes
    pub fn with_scroll_events(mut self, tx: mpsc::UnboundedSender<ScrollEvent>) -> Self {
        self.events = Some(tx);
        self
    }

    pub fn latency(&self) -> Duration {
        self.latency
    }

    pub fn offset(&self) -> Coordinates {
        self.state.lock().unwrap_or_else(PoisonError::into_inner).offset
    }

    /// Move the content offset as a user gesture would, returning the event a
    /// real host would deliver
    pub fn set_offset(&self, offset: Coordinates) -> ScrollEvent {
        self.state.lock().unwrap_or_else(PoisonError::into_inner).offset = offset;
        let event = ScrollEvent { offset };
        self.publish(event);
        event
    }

    /// Every target passed to `scroll_to`, oldest first
    pub fn moves(&self) -> Vec<Coordinates> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner).moves.clone()
    }

    pub fn detach(&self) {
        self.mounted.store(false, Ordering::SeqCst);
    }

    fn publish(&self, event: ScrollEvent) {
        if let Some(tx) = &self.events {
            if tx.send(event).is_err() {
                warn!("Failed to send scroll event: receiver dropped");
            }
        }
    }
}

#[async_trait::async_trait]
impl ViewportHandle for SimViewport {
    async fn measure(&self) -> Result<Coordinates> {
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
        if !self.mounted.load(Ordering::SeqCst) {
            return Err(Error::InvalidHandle("viewport is detached".to_string()));
        }
        Ok(self.origin)
    }

    async fn scroll_to(&self, target: Coordinates) {
        {
            let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
            state.offset = target;
            state.moves.push(target);
        }
        self.publish(ScrollEvent { offset: target });
    }
}

/// Simulated anchor placed at a fixed position in the viewport's content
#[derive(Debug)]
pub struct SimAnchor {
    viewport: Weak<SimViewport>,
    position: Mutex<Coordinates>,
    mounted: AtomicBool,
    failure: Mutex<Option<String>>,
}

impl SimAnchor {
    pub fn new(viewport: &Arc<SimViewport>, position: Coordinates) -> Arc<Self> {
        Arc::new(Self {
            viewport: Arc::downgrade(viewport),
            position: Mutex::new(position),
            mounted: AtomicBool::new(true),
            failure: Mutex::new(None),
        })
    }

    pub fn position(&self) -> Coordinates {
        *self.position.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Relayout: move the anchor within the content
    pub fn set_position(&self, position: Coordinates) {
        *self.position.lock().unwrap_or_else(PoisonError::into_inner) = position;
    }

    pub fn detach(&self) {
        self.mounted.store(false, Ordering::SeqCst);
    }

    pub fn attach(&self) {
        self.mounted.store(true, Ordering::SeqCst);
    }

    /// Make every later measurement fail with a host error
    pub fn fail_measurement(&self, message: impl Into<String>) {
        *self.failure.lock().unwrap_or_else(PoisonError::into_inner) = Some(message.into());
    }
}

#[async_trait::async_trait]
impl AnchorHandle for SimAnchor {
    fn is_mounted(&self) -> bool {
        self.mounted.load(Ordering::SeqCst)
    }

    async fn measure(&self) -> Result<Coordinates> {
        let latency = self.viewport.upgrade().map(|v| v.latency()).unwrap_or_default();
        if !latency.is_zero() {
            tokio::time::sleep(latency).await;
        }

        if let Some(message) = self.failure.lock().unwrap_or_else(PoisonError::into_inner).clone() {
            return Err(Error::Host(message));
        }
        if !self.is_mounted() {
            return Err(Error::InvalidHandle("anchor is detached".to_string()));
        }
        let viewport = self
            .viewport
            .upgrade()
            .ok_or_else(|| Error::InvalidHandle("anchor outlived its viewport".to_string()))?;

        let position = self.position();
        let offset = viewport.offset();
        Ok(Coordinates::new(
            viewport.origin.x + position.x - offset.x,
            viewport.origin.y + position.y - offset.y,
        ))
    }
}
