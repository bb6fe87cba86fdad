//! Anchor coordination engine bound to one viewport.
//!
//! `AnchorEngine` is a cheap `Clone` around shared state: hand a clone to
//! every element that needs to register itself or navigate. All methods must
//! be called from within a tokio runtime, since rate-limited work is spawned
//! onto it.
//!
//! - `pipeline` - scroll event handling and reached-anchor detection
//! - `navigation` - `scroll_to` and `timeout_on_scroll`
//! - `guard` - mount-scoped registration

mod guard;
mod navigation;
mod pipeline;

use std::collections::BTreeMap;
use std::fmt;
use std::sync::{Arc, Mutex, PoisonError, Weak};
use std::time::Duration;

use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::anchor::{resolver, AnchorRegistry, RegistrySnapshot};
use crate::config::AnchorConfig;
use crate::geometry::{Axis, Coordinates};
use crate::host::{AnchorHandle, ScrollEvent, ViewportHandle};
use crate::limiter::{Debounce, Memoize, Throttle};
use crate::Result;

pub use guard::AnchorGuard;

/// Callback invoked with the name of a reached anchor
pub type ReachedCallback = Arc<dyn Fn(&str) + Send + Sync>;

/// Events emitted by the engine to an optional observer
#[derive(Debug, Clone, PartialEq)]
pub enum AnchorEvent {
    Registered { name: String },
    Unregistered { name: String },
    /// The viewport reached `name` on `axis`
    AnchorReached { axis: Axis, name: String },
    /// A move-viewport command was issued for `name`
    NavigationIssued { name: String, target: Coordinates },
    /// Reached-anchor callbacks are suppressed for `duration_ms` of quiet
    Suppressed { duration_ms: u64 },
    /// Suppression lifted
    Released,
}

/// Configuration plus the non-serializable parts of engine setup
#[derive(Clone, Default)]
pub struct AnchorOptions {
    config: AnchorConfig,
    on_reached_x: Option<ReachedCallback>,
    on_reached_y: Option<ReachedCallback>,
    event_tx: Option<mpsc::UnboundedSender<AnchorEvent>>,
}

impl AnchorOptions {
    pub fn new(config: AnchorConfig) -> Self {
        Self {
            config,
            ..Default::default()
        }
    }

    /// Called when an anchor is reached on the x-axis. Requires scroll
    /// events to be forwarded to [`AnchorEngine::on_scroll`].
    pub fn with_on_anchor_reached_x<F>(mut self, callback: F) -> Self
    where
        F: Fn(&str) + Send + Sync + 'static,
    {
        self.on_reached_x = Some(Arc::new(callback));
        self
    }

    /// Called when an anchor is reached on the y-axis
    pub fn with_on_anchor_reached_y<F>(mut self, callback: F) -> Self
    where
        F: Fn(&str) + Send + Sync + 'static,
    {
        self.on_reached_y = Some(Arc::new(callback));
        self
    }

    /// Set the event sender for observers
    pub fn with_event_sender(mut self, tx: mpsc::UnboundedSender<AnchorEvent>) -> Self {
        self.event_tx = Some(tx);
        self
    }

    pub fn config(&self) -> &AnchorConfig {
        &self.config
    }
}

impl fmt::Debug for AnchorOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AnchorOptions")
            .field("config", &self.config)
            .field("on_reached_x", &self.on_reached_x.is_some())
            .field("on_reached_y", &self.on_reached_y.is_some())
            .field("event_tx", &self.event_tx.is_some())
            .finish()
    }
}

#[derive(Debug, Default)]
struct ScrollState {
    offset: Coordinates,
    /// Set by `timeout_on_scroll`, cleared by the release debounce
    suppressed: bool,
}

struct EngineInner {
    config: AnchorConfig,
    on_reached_x: Option<ReachedCallback>,
    on_reached_y: Option<ReachedCallback>,
    event_tx: Option<mpsc::UnboundedSender<AnchorEvent>>,
    viewport: Weak<dyn ViewportHandle>,
    registry: Mutex<AnchorRegistry>,
    scroll: Mutex<ScrollState>,
    /// Shared by every scroll event
    detection: Throttle<ScrollEvent, ()>,
    /// One throttle per anchor name, evicted on unregister
    navigation: Memoize<String, Arc<Throttle<Coordinates, ()>>>,
    /// One release timer per suppression duration
    releases: Memoize<u64, Arc<Debounce<()>>>,
}

impl EngineInner {
    fn snapshot(&self) -> RegistrySnapshot {
        self.registry.lock().unwrap_or_else(PoisonError::into_inner).snapshot()
    }

    fn offset(&self) -> Coordinates {
        self.scroll.lock().unwrap_or_else(PoisonError::into_inner).offset
    }

    fn is_suppressed(&self) -> bool {
        self.scroll.lock().unwrap_or_else(PoisonError::into_inner).suppressed
    }

    fn unregister_if_same(&self, name: &str, handle: &Weak<dyn AnchorHandle>) {
        let removed = self
            .registry
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .unregister_if_same(name, handle);
        if removed {
            self.after_unregister(name);
        }
    }

    fn after_unregister(&self, name: &str) {
        if let Err(e) = self.navigation.forget(&name.to_string()) {
            warn!(anchor = name, error = %e, "Failed to evict navigation throttle");
        }
        debug!(anchor = name, "Anchor unregistered");
        self.emit(AnchorEvent::Unregistered {
            name: name.to_string(),
        });
    }

    /// Send an event to the observer (if an event channel is configured)
    fn emit(&self, event: AnchorEvent) {
        if let Some(ref tx) = self.event_tx {
            if tx.send(event).is_err() {
                warn!("Failed to send anchor event: receiver dropped");
            }
        }
    }
}

/// Coordinates anchors of one viewport
#[derive(Clone)]
pub struct AnchorEngine {
    inner: Arc<EngineInner>,
}

impl AnchorEngine {
    /// Create an engine bound to `viewport`. Only a weak reference is kept.
    pub fn new<V>(viewport: &Arc<V>, options: AnchorOptions) -> Self
    where
        V: ViewportHandle + 'static,
    {
        let weak: Weak<dyn ViewportHandle> = Arc::<V>::downgrade(viewport);
        Self::with_viewport(weak, options)
    }

    pub fn with_viewport(viewport: Weak<dyn ViewportHandle>, options: AnchorOptions) -> Self {
        let AnchorOptions {
            config,
            on_reached_x,
            on_reached_y,
            event_tx,
        } = options;
        let window = config.throttle_window();

        let inner = Arc::new_cyclic(|engine: &Weak<EngineInner>| {
            let detection = {
                let engine = engine.clone();
                Throttle::new(
                    move |event: ScrollEvent| {
                        if let Some(engine) = engine.upgrade() {
                            tokio::spawn(pipeline::run_detection(engine, event));
                        }
                    },
                    window,
                )
            };

            let navigation = {
                let engine = engine.clone();
                Memoize::new(move |name: &String| {
                    let engine = engine.clone();
                    let name = name.clone();
                    Arc::new(Throttle::new(
                        move |target: Coordinates| {
                            if let Some(engine) = engine.upgrade() {
                                navigation::issue_move(&engine, &name, target);
                            }
                        },
                        window,
                    ))
                })
            };

            let releases = {
                let engine = engine.clone();
                Memoize::new(move |duration_ms: &u64| {
                    let engine = engine.clone();
                    Arc::new(Debounce::new(
                        move |()| {
                            if let Some(engine) = engine.upgrade() {
                                navigation::release(&engine);
                            }
                        },
                        Duration::from_millis(*duration_ms),
                    ))
                })
            };

            EngineInner {
                config,
                on_reached_x,
                on_reached_y,
                event_tx,
                viewport,
                registry: Mutex::new(AnchorRegistry::new()),
                scroll: Mutex::new(ScrollState::default()),
                detection,
                navigation,
                releases,
            }
        });

        Self { inner }
    }

    /// Register (or replace) the anchor `name`.
    ///
    /// Fails with [`crate::Error::InvalidHandle`] if the element is not
    /// mounted yet.
    pub fn register<H>(&self, name: impl Into<String>, handle: &Arc<H>) -> Result<()>
    where
        H: AnchorHandle + 'static,
    {
        let weak: Weak<dyn AnchorHandle> = Arc::<H>::downgrade(handle);
        self.register_weak(name, weak)
    }

    pub fn register_weak(&self, name: impl Into<String>, handle: Weak<dyn AnchorHandle>) -> Result<()> {
        let name = name.into();
        self.inner
            .registry
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .register(name.clone(), handle)?;

        debug!(anchor = %name, "Anchor registered");
        self.inner.emit(AnchorEvent::Registered { name });
        Ok(())
    }

    /// Remove the anchor `name`. No-op when it is not registered.
    pub fn unregister(&self, name: &str) {
        let removed = self
            .inner
            .registry
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .unregister(name);
        if removed {
            self.inner.after_unregister(name);
        }
    }

    /// Register `name` for as long as the returned guard is alive
    pub fn attach<H>(&self, name: impl Into<String>, handle: &Arc<H>) -> Result<AnchorGuard>
    where
        H: AnchorHandle + 'static,
    {
        let name = name.into();
        let weak: Weak<dyn AnchorHandle> = Arc::<H>::downgrade(handle);
        self.register_weak(name.clone(), weak.clone())?;
        Ok(AnchorGuard::new(Arc::downgrade(&self.inner), name, weak))
    }

    /// Current registry contents
    pub fn anchors(&self) -> RegistrySnapshot {
        self.inner.snapshot()
    }

    /// Resolve one anchor relative to the viewport content origin
    pub async fn resolve(&self, name: &str) -> Result<Coordinates> {
        let snapshot = self.inner.snapshot();
        resolver::resolve_one(&snapshot, &self.inner.viewport, name, || self.inner.offset()).await
    }

    /// Resolve every currently measurable anchor
    pub async fn resolve_all(&self) -> Result<BTreeMap<String, Coordinates>> {
        let snapshot = self.inner.snapshot();
        resolver::resolve_all(&snapshot, &self.inner.viewport, || self.inner.offset()).await
    }

    /// Last content offset delivered to [`AnchorEngine::on_scroll`]
    pub fn scroll_offset(&self) -> Coordinates {
        self.inner.offset()
    }

    /// Whether reached-anchor detection is currently suppressed
    pub fn is_suppressed(&self) -> bool {
        self.inner.is_suppressed()
    }

    pub fn config(&self) -> &AnchorConfig {
        &self.inner.config
    }
}

impl fmt::Debug for AnchorEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AnchorEngine")
            .field("config", &self.inner.config)
            .field("anchors", &self.inner.snapshot())
            .field("scroll_offset", &self.inner.offset())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::{SimAnchor, SimViewport};

    fn engine() -> (Arc<SimViewport>, AnchorEngine, mpsc::UnboundedReceiver<AnchorEvent>) {
        let viewport = Arc::new(SimViewport::new(Coordinates::default()));
        let (tx, rx) = mpsc::unbounded_channel();
        let engine = AnchorEngine::new(&viewport, AnchorOptions::default().with_event_sender(tx));
        (viewport, engine, rx)
    }

    #[tokio::test]
    async fn test_register_emits_and_lists() {
        let (viewport, engine, mut rx) = engine();
        let anchor = SimAnchor::new(&viewport, Coordinates::new(0.0, 10.0));

        engine.register("intro", &anchor).unwrap();

        assert_eq!(engine.anchors().names().collect::<Vec<_>>(), vec!["intro"]);
        assert_eq!(
            rx.recv().await,
            Some(AnchorEvent::Registered {
                name: "intro".to_string()
            })
        );
    }

    #[tokio::test]
    async fn test_unregister_absent_emits_nothing() {
        let (viewport, engine, mut rx) = engine();
        let anchor = SimAnchor::new(&viewport, Coordinates::default());
        engine.register("kept", &anchor).unwrap();
        rx.recv().await;

        engine.unregister("ghost");

        assert!(rx.try_recv().is_err());
        assert!(engine.anchors().contains("kept"));
    }

    #[tokio::test]
    async fn test_resolve_after_user_scroll() {
        let (viewport, engine, _rx) = engine();
        let anchor = SimAnchor::new(&viewport, Coordinates::new(0.0, 640.0));
        engine.register("footer", &anchor).unwrap();

        engine.on_scroll(viewport.set_offset(Coordinates::new(0.0, 300.0)));

        assert_eq!(engine.scroll_offset(), Coordinates::new(0.0, 300.0));
        assert_eq!(engine.resolve("footer").await.unwrap(), Coordinates::new(0.0, 640.0));
    }

    #[test]
    fn test_options_debug_hides_callbacks() {
        let options = AnchorOptions::default().with_on_anchor_reached_y(|_| {});
        let rendered = format!("{options:?}");
        assert!(rendered.contains("on_reached_y: true"));
        assert!(rendered.contains("on_reached_x: false"));
    }
}
