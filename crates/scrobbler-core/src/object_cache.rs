// SPDX-License-Identifier: GPL-3.0-or-later

use crate::error::{CoreError, Result};
use crate::identity::{Identity, IdentityKey};
use moka::sync::Cache;
use std::any::{Any, TypeId};
use std::fmt;
use std::sync::Arc;
use tracing::debug;

type Entry = Arc<dyn Any + Send + Sync>;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct CacheKey {
    type_id: TypeId,
    identity: IdentityKey,
}

/// Deduplicates entity instances by identity key.
///
/// Entries live as long as the cache unless a capacity was set, in which case
/// least recently used entries may be evicted. Concurrent lookups of a missing
/// key are coalesced: only one factory runs and every caller receives the
/// instance it produced.
#[derive(Clone)]
pub struct ObjectCache {
    entries: Cache<CacheKey, Entry>,
}

impl ObjectCache {
    /// Unbounded cache, entries are kept for its whole lifetime.
    pub fn new() -> Self {
        Self {
            entries: Cache::builder().build(),
        }
    }

    /// Cache evicting entries once more than `max_capacity` are stored.
    pub fn with_capacity(max_capacity: u64) -> Self {
        Self {
            entries: Cache::builder().max_capacity(max_capacity).build(),
        }
    }

    /// Return the instance cached for `key`, creating it with `factory` on a miss.
    ///
    /// Fails only with [`CoreError::KindMismatch`], which cannot happen while
    /// every entry is keyed by the `TypeId` of the type stored under it.
    pub fn get_or_create<E, F>(&self, key: IdentityKey, factory: F) -> Result<Arc<E>>
    where
        E: Identity,
        F: FnOnce() -> E,
    {
        let cache_key = CacheKey {
            type_id: TypeId::of::<E>(),
            identity: key,
        };

        let entry = self.entries.get_with(cache_key.clone(), || {
            debug!(target: "cache", key = %cache_key.identity, "cache miss, constructing");
            Arc::new(factory()) as Entry
        });

        entry
            .downcast::<E>()
            .map_err(|_| CoreError::KindMismatch { kind: E::KIND })
    }

    /// Look up an instance without creating it.
    pub fn get<E: Identity>(&self, key: &IdentityKey) -> Option<Arc<E>> {
        let cache_key = CacheKey {
            type_id: TypeId::of::<E>(),
            identity: key.clone(),
        };
        self.entries
            .get(&cache_key)
            .and_then(|entry| entry.downcast::<E>().ok())
    }

    pub fn contains<E: Identity>(&self, key: &IdentityKey) -> bool {
        self.entries.contains_key(&CacheKey {
            type_id: TypeId::of::<E>(),
            identity: key.clone(),
        })
    }

    /// Drop one entry; the next lookup constructs a fresh instance.
    pub fn invalidate<E: Identity>(&self, key: &IdentityKey) {
        self.entries.invalidate(&CacheKey {
            type_id: TypeId::of::<E>(),
            identity: key.clone(),
        });
    }

    pub fn clear(&self) {
        debug!(target: "cache", "clearing object cache");
        self.entries.invalidate_all();
    }
}

impl Default for ObjectCache {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for ObjectCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObjectCache")
            .field("max_capacity", &self.entries.policy().max_capacity())
            .finish_non_exhaustive()
    }
}
