// Copyright 2024 SSL Object Cache Contributors.
// See the "LICENSE.txt" file at the top-level directory of this distribution.
//
// Licensed under the MIT license. This file may not be copied, modified,
// or distributed except according to those terms.

//! The bounded cache populated on the per-connection hot path (spec
//! section 4.5): capacity, validity and inactivity bounds, opportunistic
//! tail eviction, and most-recently-used ordering.

use crate::clock::Clock;
use crate::entry::{index_key, Entry, IndexKey};
use crate::errors::Result;
use crate::family::Family;
use crate::freshness::stat_path;
use crate::key::{bytes_to_path, classify, Key, KeyKind};
use crate::loader::{self, LoaderContext, LoaderData};
use crate::object::CachedObject;
use crate::store::Store;

/// Bounded cache with `max ≥ 1`, `valid` and `inactive` time bounds (spec
/// section 4.5). Freshness/age math is driven by an injected [`Clock`] so
/// tests can pin exact second offsets (spec section 8 scenarios 5 and 6).
#[derive(Debug)]
pub struct ConnectionCache {
    store: Store,
    prefix: std::path::PathBuf,
    max: usize,
    valid: u64,
    inactive: u64,
    current: usize,
    clock: Box<dyn Clock>,
}

impl ConnectionCache {
    pub fn new(
        prefix: impl Into<std::path::PathBuf>,
        max: usize,
        valid: u64,
        inactive: u64,
        clock: Box<dyn Clock>,
    ) -> Self {
        assert!(max >= 1, "connection cache requires max >= 1");
        Self {
            store: Store::new(),
            prefix: prefix.into(),
            max,
            valid,
            inactive,
            current: 0,
            clock,
        }
    }

    pub fn current(&self) -> usize {
        self.current
    }

    pub fn max(&self) -> usize {
        self.max
    }

    /// `connection_fetch`'s cached path (spec section 6). The
    /// `cache_or_null = null` branch of the external interface is handled
    /// by the caller choosing not to call this at all and invoking
    /// [`crate::loader::create`] directly instead.
    pub fn fetch(
        &mut self,
        family: Family,
        reference: &str,
        loader_data: &LoaderData,
        ctx: &LoaderContext,
    ) -> Result<CachedObject> {
        let key = classify(family, reference, &self.prefix);

        if loader_data.bypasses_cache(family) {
            return loader::create(family, &key, loader_data, ctx);
        }

        let idx = index_key(family, &key.bytes, key.hash);
        let now = self.clock.now_secs();

        let Some((accessed, created, path_stamp)) =
            self.store.get(&idx).map(|e| (e.accessed, e.created, e.path_stamp))
        else {
            return self.insert_fresh(family, key, idx, loader_data, ctx, now);
        };

        if now.saturating_sub(accessed) > self.inactive {
            self.remove_and_decrement(&idx);
            return self.insert_fresh(family, key, idx, loader_data, ctx, now);
        }

        self.store.detach(&idx);

        let fresh_stamp = current_path_stamp(&key);
        let file_changed = fresh_stamp != path_stamp;
        if now.saturating_sub(created) > self.valid && file_changed {
            match loader::create(family, &key, loader_data, ctx) {
                Ok(object) => {
                    let entry = self.store.get_mut(&idx).expect("entry present after detach");
                    entry.object = object;
                    entry.path_stamp = fresh_stamp;
                    entry.created = now;
                }
                Err(err) => {
                    self.remove_and_decrement(&idx);
                    return Err(err);
                }
            }
        }

        let entry = self.store.get_mut(&idx).expect("entry present after detach");
        entry.accessed = now;
        self.store.splice_to_head(&idx);
        Ok(self.store.get(&idx).expect("entry present after splice").object.make_handle())
    }

    fn insert_fresh(
        &mut self,
        family: Family,
        key: Key,
        idx: IndexKey,
        loader_data: &LoaderData,
        ctx: &LoaderContext,
        now: u64,
    ) -> Result<CachedObject> {
        let path_stamp = current_path_stamp(&key);
        let object = loader::create(family, &key, loader_data, ctx)?;

        if self.current >= self.max {
            self.evict_opportunistic(now);
        }

        let handle = object.make_handle();
        let entry = Entry::new(family, key.bytes, object, now, path_stamp);
        self.store.insert(idx.clone(), entry);
        self.store.splice_to_head(&idx);
        self.current += 1;

        Ok(handle)
    }

    /// Spec section 4.5.1: inspect up to three tail entries. The first is
    /// always evicted to make room; the second and third only if idle
    /// longer than `inactive`. Stops early once the list is empty.
    fn evict_opportunistic(&mut self, now: u64) {
        for candidate in 0..3 {
            let Some(tail) = self.store.tail_key() else {
                break;
            };
            if candidate > 0 {
                let idle = self
                    .store
                    .get(&tail)
                    .map_or(0, |entry| now.saturating_sub(entry.accessed));
                if idle <= self.inactive {
                    break;
                }
            }
            self.remove_and_decrement(&tail);
        }
    }

    fn remove_and_decrement(&mut self, idx: &IndexKey) {
        if self.store.remove(idx).is_some() {
            self.current = self.current.saturating_sub(1);
        }
    }
}

fn current_path_stamp(key: &Key) -> Option<crate::freshness::FileStamp> {
    match key.kind {
        KeyKind::Path => stat_path(&bytes_to_path(&key.bytes)),
        _ => None,
    }
}

impl Drop for ConnectionCache {
    fn drop(&mut self) {
        // Spec section 4.6: walk the index, free every object (an ordinary
        // Rust drop), then check the invariant that current == 0 and the
        // recency list is empty. A mismatch here means `current` drifted
        // from the store's real population, which is a bug in the
        // eviction/insertion bookkeeping above, not an expected outcome.
        let freed = self.store.drain_all().len();
        self.current = self.current.saturating_sub(freed);
        crate::lifecycle::check_teardown_invariant(
            "connection",
            self.current,
            self.store.recency_list_is_empty(),
        );
    }
}
