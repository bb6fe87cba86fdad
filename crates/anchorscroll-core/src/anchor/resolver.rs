//! Resolves anchor positions relative to the viewport content origin.
//!
//! Both measurements are absolute, so the relative position is rebuilt as
//! `anchor + scroll_offset - viewport`. The scroll offset is read after the
//! measurements complete, so it is the latest one the pipeline has seen.

use std::collections::BTreeMap;
use std::sync::Weak;

use tracing::debug;

use super::registry::RegistrySnapshot;
use crate::geometry::Coordinates;
use crate::host::ViewportHandle;
use crate::{Error, Result};

/// Resolve a single anchor.
///
/// Fails with [`Error::InvalidAnchorKey`] when `name` is not in `snapshot`,
/// and with [`Error::InvalidHandle`] when the anchor or the viewport can no
/// longer be measured.
pub async fn resolve_one<F>(
    snapshot: &RegistrySnapshot,
    viewport: &Weak<dyn ViewportHandle>,
    name: &str,
    current_offset: F,
) -> Result<Coordinates>
where
    F: Fn() -> Coordinates,
{
    let handle = snapshot
        .lookup(name)
        .ok_or_else(|| Error::InvalidAnchorKey(name.to_string()))?;

    let anchor = handle.upgrade().filter(|h| h.is_mounted());
    let (Some(anchor), true) = (anchor, viewport.strong_count() > 0) else {
        return Err(missing_handle(name));
    };

    let anchor_pos = anchor.measure().await?;
    drop(anchor);

    // The viewport may have gone away while the anchor was being measured.
    let viewport = viewport.upgrade().ok_or_else(|| missing_handle(name))?;
    let viewport_pos = viewport.measure().await?;

    let offset = current_offset();
    Ok(Coordinates::new(
        anchor_pos.x + offset.x - viewport_pos.x,
        anchor_pos.y + offset.y - viewport_pos.y,
    ))
}

/// Resolve every anchor in `snapshot`.
///
/// Anchors failing with [`Error::InvalidHandle`] are left out of the result;
/// any other error aborts the batch.
pub async fn resolve_all<F>(
    snapshot: &RegistrySnapshot,
    viewport: &Weak<dyn ViewportHandle>,
    current_offset: F,
) -> Result<BTreeMap<String, Coordinates>>
where
    F: Fn() -> Coordinates,
{
    let mut anchors = BTreeMap::new();

    for name in snapshot.names() {
        match resolve_one(snapshot, viewport, name, &current_offset).await {
            Ok(coords) => {
                anchors.insert(name.to_string(), coords);
            }
            Err(e) if e.is_invalid_handle() => {
                debug!(anchor = name, error = %e, "Skipping unmeasurable anchor");
            }
            Err(e) => return Err(e),
        }
    }

    Ok(anchors)
}

fn missing_handle(name: &str) -> Error {
    Error::InvalidHandle(format!(
        "missing handle for anchor {name} or its viewport, element may have been unmounted"
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::anchor::AnchorRegistry;
    use crate::host::AnchorHandle;
    use crate::sim::{SimAnchor, SimViewport};
    use std::sync::Arc;

    fn setup() -> (Arc<SimViewport>, Weak<dyn ViewportHandle>) {
        let viewport = Arc::new(SimViewport::new(Coordinates::new(10.0, 40.0)));
        let weak: Weak<dyn ViewportHandle> = Arc::<SimViewport>::downgrade(&viewport);
        (viewport, weak)
    }

    fn register(registry: &mut AnchorRegistry, name: &str, anchor: &Arc<SimAnchor>) {
        let weak: Weak<dyn AnchorHandle> = Arc::<SimAnchor>::downgrade(anchor);
        registry.register(name, weak).unwrap();
    }

    #[tokio::test]
    async fn test_resolve_one_is_scroll_adjusted() {
        let (viewport, weak_viewport) = setup();
        let anchor = SimAnchor::new(&viewport, Coordinates::new(0.0, 300.0));
        let mut registry = AnchorRegistry::new();
        register(&mut registry, "a", &anchor);

        viewport.set_offset(Coordinates::new(0.0, 120.0));
        let offset = viewport.offset();
        let coords = resolve_one(&registry.snapshot(), &weak_viewport, "a", || offset)
            .await
            .unwrap();

        assert_eq!(coords, Coordinates::new(0.0, 300.0));
    }

    #[tokio::test]
    async fn test_resolve_one_unknown_name() {
        let (_viewport, weak_viewport) = setup();
        let registry = AnchorRegistry::new();

        let err = resolve_one(&registry.snapshot(), &weak_viewport, "nope", Coordinates::default)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::InvalidAnchorKey(name) if name == "nope"));
    }

    #[tokio::test]
    async fn test_resolve_one_detached_anchor() {
        let (viewport, weak_viewport) = setup();
        let anchor = SimAnchor::new(&viewport, Coordinates::new(0.0, 10.0));
        let mut registry = AnchorRegistry::new();
        register(&mut registry, "a", &anchor);
        anchor.detach();

        let err = resolve_one(&registry.snapshot(), &weak_viewport, "a", Coordinates::default)
            .await
            .unwrap_err();
        assert!(err.is_invalid_handle());
    }

    #[tokio::test]
    async fn test_resolve_one_dropped_viewport() {
        let (viewport, weak_viewport) = setup();
        let anchor = SimAnchor::new(&viewport, Coordinates::new(0.0, 10.0));
        let mut registry = AnchorRegistry::new();
        register(&mut registry, "a", &anchor);
        drop(viewport);

        let err = resolve_one(&registry.snapshot(), &weak_viewport, "a", Coordinates::default)
            .await
            .unwrap_err();
        assert!(err.is_invalid_handle());
    }

    #[tokio::test]
    async fn test_resolve_all_skips_detached() {
        let (viewport, weak_viewport) = setup();
        let mut registry = AnchorRegistry::new();
        let anchors: Vec<_> = (0..5)
            .map(|i| {
                let anchor = SimAnchor::new(&viewport, Coordinates::new(0.0, i as f64 * 100.0));
                register(&mut registry, &format!("section-{i}"), &anchor);
                anchor
            })
            .collect();
        anchors[2].detach();

        let resolved = resolve_all(&registry.snapshot(), &weak_viewport, Coordinates::default)
            .await
            .unwrap();

        assert_eq!(resolved.len(), 4);
        assert!(!resolved.contains_key("section-2"));
        assert_eq!(resolved["section-4"], Coordinates::new(0.0, 400.0));
    }

    #[tokio::test]
    async fn test_resolve_all_propagates_host_errors() {
        let (viewport, weak_viewport) = setup();
        let mut registry = AnchorRegistry::new();
        let good = SimAnchor::new(&viewport, Coordinates::new(0.0, 0.0));
        let broken = SimAnchor::new(&viewport, Coordinates::new(0.0, 50.0));
        register(&mut registry, "good", &good);
        register(&mut registry, "broken", &broken);
        broken.fail_measurement("layout pass failed");

        let err = resolve_all(&registry.snapshot(), &weak_viewport, Coordinates::default)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Host(_)));
    }
}
