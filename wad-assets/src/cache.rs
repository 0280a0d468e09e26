//! Name-keyed memoization of decoded artifacts
//!
//! Each entry is a tri-state cell: absent (never attempted), `Some`
//! (decoded, shared behind an `Arc`), or a stored `None` (decode failed;
//! logged once, never retried). Archives are immutable once opened, so
//! entries are never invalidated.

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use std::sync::Arc;
use tracing::warn;
use wad_archive::Name8;

use crate::error::Result;

/// Memoizes decode results by lump name for one immutable archive handle.
pub struct ResourceCache<T> {
    entries: DashMap<Name8, Option<Arc<T>>>,
}

impl<T> ResourceCache<T> {
    pub fn new() -> Self {
        Self {
            entries: DashMap::new(),
        }
    }

    /// Return the cached artifact for `name`, running `decode` on first
    /// request.
    ///
    /// Concurrent first requests may each run `decode`; the first stored
    /// result wins and every caller observes the converged value. A
    /// failure is recorded so the decode is not re-attempted on hot
    /// paths, and logged once per distinct name rather than once per
    /// call.
    pub fn get_or_decode(&self, name: Name8, decode: impl FnOnce() -> Result<T>) -> Option<Arc<T>> {
        if let Some(slot) = self.entries.get(&name) {
            return slot.value().clone();
        }

        match decode() {
            Ok(artifact) => {
                let slot = self
                    .entries
                    .entry(name)
                    .or_insert_with(|| Some(Arc::new(artifact)));
                slot.value().clone()
            }
            Err(err) => match self.entries.entry(name) {
                Entry::Occupied(slot) => slot.get().clone(),
                Entry::Vacant(slot) => {
                    warn!("failed to decode {name}: {err}");
                    slot.insert(None);
                    None
                }
            },
        }
    }

    /// Cached tri-state for `name` without decoding: outer `None` means
    /// never attempted, inner `None` means a recorded failure.
    pub fn get(&self, name: Name8) -> Option<Option<Arc<T>>> {
        self.entries.get(&name).map(|slot| slot.value().clone())
    }

    /// Number of names with a recorded outcome.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<T> Default for ResourceCache<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AssetError;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn decodes_once_and_memoizes() {
        let cache = ResourceCache::new();
        let calls = AtomicUsize::new(0);
        let name = Name8::new("TROOA1");

        let first = cache
            .get_or_decode(name, || {
                calls.fetch_add(1, Ordering::SeqCst);
                Ok(42u32)
            })
            .unwrap();
        let second = cache
            .get_or_decode(name, || {
                calls.fetch_add(1, Ordering::SeqCst);
                Ok(99u32)
            })
            .unwrap();

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(*second, 42);
        assert!(Arc::ptr_eq(&first, &second));
    }

    #[test]
    fn failure_is_recorded_and_not_retried() {
        let cache: ResourceCache<u32> = ResourceCache::new();
        let calls = AtomicUsize::new(0);
        let name = Name8::new("BROKEN");

        for _ in 0..3 {
            let result = cache.get_or_decode(name, || {
                calls.fetch_add(1, Ordering::SeqCst);
                Err(AssetError::InvalidFormat("bad".into()))
            });
            assert!(result.is_none());
        }

        // Only the first call ran the decoder; the failure is cached.
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(cache.get(name), Some(None));
    }

    #[test]
    fn distinct_names_are_independent() {
        let cache = ResourceCache::new();
        cache.get_or_decode(Name8::new("A"), || Ok(1u32));
        let b = cache.get_or_decode(Name8::new("B"), || Ok(2u32)).unwrap();
        assert_eq!(*b, 2);
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn concurrent_first_requests_converge() {
        use std::thread;

        let cache = Arc::new(ResourceCache::new());
        let name = Name8::new("SHARED");

        let handles: Vec<_> = (0..8)
            .map(|i| {
                let cache = Arc::clone(&cache);
                thread::spawn(move || cache.get_or_decode(name, move || Ok(i)).unwrap())
            })
            .collect();

        let results: Vec<Arc<i32>> = handles.into_iter().map(|h| h.join().unwrap()).collect();

        // Whatever raced in, the first stored artifact won and every
        // caller observed it.
        let converged = cache.get(name).unwrap().unwrap();
        assert!(results.iter().all(|r| Arc::ptr_eq(r, &converged)));
        let later = cache.get_or_decode(name, || Ok(-1)).unwrap();
        assert!(Arc::ptr_eq(&converged, &later));
    }
}
