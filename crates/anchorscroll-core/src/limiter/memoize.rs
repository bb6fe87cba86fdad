//! Per-argument result cache.

use std::collections::HashMap;
use std::fmt;
use std::marker::PhantomData;
use std::sync::{Mutex, PoisonError};

use serde::Serialize;

use crate::Result;

type MemoizedFn<A, R> = Box<dyn Fn(&A) -> R + Send + Sync>;

/// Caches results keyed by the JSON serialization of the argument.
///
/// Entries live as long as the `Memoize` itself unless removed with
/// [`Memoize::forget`] or [`Memoize::clear`]. Only meant for small key
/// spaces such as anchor names or suppression durations.
pub struct Memoize<A, R> {
    func: MemoizedFn<A, R>,
    cache: Mutex<HashMap<String, R>>,
    _args: PhantomData<fn(&A)>,
}

impl<A: Serialize, R: Clone> Memoize<A, R> {
    pub fn new<F>(func: F) -> Self
    where
        F: Fn(&A) -> R + Send + Sync + 'static,
    {
        Self {
            func: Box::new(func),
            cache: Mutex::new(HashMap::new()),
            _args: PhantomData,
        }
    }

    /// Return the cached result for `args`, computing it on first use
    pub fn call(&self, args: &A) -> Result<R> {
        let key = serde_json::to_string(args)?;
        let mut cache = self.cache.lock().unwrap_or_else(PoisonError::into_inner);

        if let Some(result) = cache.get(&key) {
            return Ok(result.clone());
        }

        let result = (self.func)(args);
        cache.insert(key, result.clone());
        Ok(result)
    }

    /// Evict the entry for `args`. Returns whether an entry existed.
    pub fn forget(&self, args: &A) -> Result<bool> {
        let key = serde_json::to_string(args)?;
        let mut cache = self.cache.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(cache.remove(&key).is_some())
    }

    pub fn clear(&self) {
        self.cache.lock().unwrap_or_else(PoisonError::into_inner).clear();
    }

    pub fn len(&self) -> usize {
        self.cache.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<A, R> fmt::Debug for Memoize<A, R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let entries = self.cache.lock().unwrap_or_else(PoisonError::into_inner).len();
        f.debug_struct("Memoize").field("entries", &entries).finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[test]
    fn test_structurally_equal_args_hit_cache() {
        let count = Arc::new(AtomicUsize::new(0));
        let counter = count.clone();
        let memo = Memoize::new(move |(name, scale): &(String, u32)| {
            counter.fetch_add(1, Ordering::SeqCst);
            format!("{name}:{scale}")
        });

        assert_eq!(memo.call(&("a".to_string(), 1)).unwrap(), "a:1");
        assert_eq!(memo.call(&("a".to_string(), 1)).unwrap(), "a:1");
        assert_eq!(count.load(Ordering::SeqCst), 1);

        assert_eq!(memo.call(&("a".to_string(), 2)).unwrap(), "a:2");
        assert_eq!(memo.call(&("b".to_string(), 1)).unwrap(), "b:1");
        assert_eq!(count.load(Ordering::SeqCst), 3);
        assert_eq!(memo.len(), 3);
    }

    #[test]
    fn test_cached_values_are_shared_instances() {
        let memo = Memoize::new(|name: &String| Arc::new(name.clone()));

        let first = memo.call(&"anchor".to_string()).unwrap();
        let second = memo.call(&"anchor".to_string()).unwrap();
        assert!(Arc::ptr_eq(&first, &second));
    }

    #[test]
    fn test_forget_recomputes() {
        let count = Arc::new(AtomicUsize::new(0));
        let counter = count.clone();
        let memo = Memoize::new(move |value: &u64| {
            counter.fetch_add(1, Ordering::SeqCst);
            *value
        });

        memo.call(&100).unwrap();
        assert!(memo.forget(&100).unwrap());
        assert!(!memo.forget(&100).unwrap());
        assert!(memo.is_empty());

        memo.call(&100).unwrap();
        assert_eq!(count.load(Ordering::SeqCst), 2);

        memo.clear();
        assert!(memo.is_empty());
    }
}
