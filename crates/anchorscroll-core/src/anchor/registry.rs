//! Name to handle mapping with copy-on-write snapshots.
//!
//! Every mutation produces a new version; in-flight resolutions keep reading
//! the snapshot they started with.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::{Arc, Weak};

use crate::host::AnchorHandle;
use crate::{Error, Result};

type Entries = BTreeMap<String, Weak<dyn AnchorHandle>>;

#[derive(Default)]
pub struct AnchorRegistry {
    version: u64,
    entries: Arc<Entries>,
}

impl AnchorRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace the handle registered under `name`.
    ///
    /// Fails with [`Error::InvalidHandle`] if the element is not mounted yet
    /// (or its owner already dropped it).
    pub fn register(&mut self, name: impl Into<String>, handle: Weak<dyn AnchorHandle>) -> Result<()> {
        let name = name.into();
        let mounted = handle.upgrade().is_some_and(|h| h.is_mounted());
        if !mounted {
            return Err(Error::InvalidHandle(format!(
                "anchor {name} has no mounted element to register"
            )));
        }

        Arc::make_mut(&mut self.entries).insert(name, handle);
        self.version += 1;
        Ok(())
    }

    /// Remove `name`. Returns whether an entry was removed.
    pub fn unregister(&mut self, name: &str) -> bool {
        if !self.entries.contains_key(name) {
            return false;
        }
        Arc::make_mut(&mut self.entries).remove(name);
        self.version += 1;
        true
    }

    /// Remove `name` only while it still maps to `handle`
    pub fn unregister_if_same(&mut self, name: &str, handle: &Weak<dyn AnchorHandle>) -> bool {
        match self.entries.get(name) {
            Some(current) if Weak::ptr_eq(current, handle) => self.unregister(name),
            _ => false,
        }
    }

    pub fn snapshot(&self) -> RegistrySnapshot {
        RegistrySnapshot {
            version: self.version,
            entries: self.entries.clone(),
        }
    }
}

impl fmt::Debug for AnchorRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AnchorRegistry")
            .field("version", &self.version)
            .field("anchors", &self.entries.keys().collect::<Vec<_>>())
            .finish()
    }
}

/// Immutable view of the registry at one version
#[derive(Clone, Default)]
pub struct RegistrySnapshot {
    version: u64,
    entries: Arc<Entries>,
}

impl RegistrySnapshot {
    /// Number of mutations applied to the registry when this was taken
    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    /// Registered names in ascending order
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    /// The live handle for `name`, if registered and not yet dropped
    pub fn get(&self, name: &str) -> Option<Arc<dyn AnchorHandle>> {
        self.entries.get(name).and_then(Weak::upgrade)
    }

    pub(crate) fn lookup(&self, name: &str) -> Option<&Weak<dyn AnchorHandle>> {
        self.entries.get(name)
    }
}

impl fmt::Debug for RegistrySnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegistrySnapshot")
            .field("version", &self.version)
            .field("anchors", &self.entries.keys().collect::<Vec<_>>())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Coordinates;
    use std::sync::atomic::{AtomicBool, Ordering};

    struct Fixed {
        at: Coordinates,
        mounted: AtomicBool,
    }

    impl Fixed {
        fn new(y: f64) -> Arc<Self> {
            Arc::new(Self {
                at: Coordinates::new(0.0, y),
                mounted: AtomicBool::new(true),
            })
        }
    }

    #[async_trait::async_trait]
    impl AnchorHandle for Fixed {
        fn is_mounted(&self) -> bool {
            self.mounted.load(Ordering::SeqCst)
        }

        async fn measure(&self) -> Result<Coordinates> {
            Ok(self.at)
        }
    }

    fn weak(handle: &Arc<Fixed>) -> Weak<dyn AnchorHandle> {
        let weak: Weak<dyn AnchorHandle> = Arc::<Fixed>::downgrade(handle);
        weak
    }

    #[test]
    fn test_register_replaces_previous_handle() {
        let (first, second) = (Fixed::new(1.0), Fixed::new(2.0));
        let mut registry = AnchorRegistry::new();

        registry.register("a", weak(&first)).unwrap();
        registry.register("a", weak(&second)).unwrap();

        let snapshot = registry.snapshot();
        assert_eq!(snapshot.len(), 1);
        assert_eq!(snapshot.version(), 2);
        assert!(Weak::ptr_eq(snapshot.lookup("a").unwrap(), &weak(&second)));
    }

    #[test]
    fn test_register_unmounted_fails() {
        let handle = Fixed::new(0.0);
        handle.mounted.store(false, Ordering::SeqCst);

        let mut registry = AnchorRegistry::new();
        let err = registry.register("a", weak(&handle)).unwrap_err();
        assert!(err.is_invalid_handle());
        assert!(registry.snapshot().is_empty());
    }

    #[test]
    fn test_register_dropped_handle_fails() {
        let dangling = weak(&Fixed::new(0.0));
        let mut registry = AnchorRegistry::new();
        assert!(registry.register("a", dangling).unwrap_err().is_invalid_handle());
    }

    #[test]
    fn test_unregister_is_idempotent() {
        let handle = Fixed::new(0.0);
        let mut registry = AnchorRegistry::new();
        registry.register("a", weak(&handle)).unwrap();
        registry.register("b", weak(&handle)).unwrap();

        assert!(registry.unregister("a"));
        assert!(!registry.unregister("a"));
        assert!(!registry.unregister("missing"));

        let snapshot = registry.snapshot();
        assert_eq!(snapshot.names().collect::<Vec<_>>(), vec!["b"]);
        assert_eq!(snapshot.version(), 3);
    }

    #[test]
    fn test_snapshot_is_isolated_from_later_mutations() {
        let handle = Fixed::new(0.0);
        let mut registry = AnchorRegistry::new();
        registry.register("a", weak(&handle)).unwrap();

        let before = registry.snapshot();
        registry.unregister("a");
        registry.register("b", weak(&handle)).unwrap();

        assert!(before.contains("a"));
        assert!(!before.contains("b"));
        assert!(before.get("a").is_some());
        assert!(registry.snapshot().contains("b"));
    }

    #[test]
    fn test_unregister_if_same_keeps_newer_registration() {
        let (old, new) = (Fixed::new(0.0), Fixed::new(1.0));
        let mut registry = AnchorRegistry::new();
        registry.register("a", weak(&old)).unwrap();
        registry.register("a", weak(&new)).unwrap();

        assert!(!registry.unregister_if_same("a", &weak(&old)));
        assert!(registry.snapshot().contains("a"));
        assert!(registry.unregister_if_same("a", &weak(&new)));
        assert!(registry.snapshot().is_empty());
    }
}
