// Copyright 2024 SSL Object Cache Contributors.
// See the "LICENSE.txt" file at the top-level directory of this distribution.
//
// Licensed under the MIT license. This file may not be copied, modified,
// or distributed except according to those terms.

//! The permanent, unbounded cache populated during configuration load
//! (spec section 4.4). Supports inheriting already-parsed objects from the
//! previous configuration generation's cache across a live reload.

use tracing::debug;

use crate::clock::Clock;
use crate::entry::{index_key, Entry, IndexKey};
use crate::errors::Result;
use crate::family::Family;
use crate::freshness::stat_path;
use crate::key::{bytes_to_path, classify, KeyKind};
use crate::loader::{self, LoaderContext, LoaderData};
use crate::object::CachedObject;
use crate::store::Store;

/// Unbounded cache (`max = 0` in spec terms) populated at configuration
/// load. Never evicts; destroyed wholesale when its owning cycle tears
/// down (spec section 4.4).
#[derive(Debug)]
pub struct ConfigCache {
    store: Store,
    prefix: std::path::PathBuf,
    inherit: bool,
}

impl ConfigCache {
    /// `init(0, 0, 0)` from spec section 4.6, with `inherit` defaulting to
    /// the configuration directive's default of `on`.
    pub fn new(prefix: impl Into<std::path::PathBuf>, inherit: bool) -> Self {
        Self {
            store: Store::new(),
            prefix: prefix.into(),
            inherit,
        }
    }

    pub fn len(&self) -> usize {
        self.store.len()
    }

    pub fn is_empty(&self) -> bool {
        self.store.is_empty()
    }

    /// `config_fetch` (spec section 6), consulting `previous` (the prior
    /// generation's cache, read-only) when inheritance is enabled.
    pub fn fetch(
        &mut self,
        clock: &dyn Clock,
        family: Family,
        reference: &str,
        loader_data: &LoaderData,
        ctx: &LoaderContext,
        previous: Option<&ConfigCache>,
    ) -> Result<CachedObject> {
        let key = classify(family, reference, &self.prefix);

        // Spec section 4.4 step 2: PKEY with passwords bypasses the cache
        // entirely so the key file under different passwords never collides
        // and passwords are never retained in the cache key.
        if loader_data.bypasses_cache(family) {
            return loader::create(family, &key, loader_data, ctx);
        }

        let index_key = index_key(family, &key.bytes, key.hash);
        if let Some(entry) = self.store.get(&index_key) {
            return Ok(entry.object.make_handle());
        }

        let path_stamp = match key.kind {
            KeyKind::Path => stat_path(&bytes_to_path(&key.bytes)),
            _ => None,
        };

        let adopted = self
            .inherit
            .then(|| previous)
            .flatten()
            .and_then(|prev| Self::adopt_from_previous(prev, family, &key.bytes, &index_key, path_stamp));

        let object = match adopted {
            Some(object) => object,
            None => loader::create(family, &key, loader_data, ctx)?,
        };

        let now = clock.now_secs();
        let entry = Entry::new(family, key.bytes, object, now, path_stamp);
        let handle = entry.object.make_handle();
        self.store.insert(index_key, entry);
        Ok(handle)
    }

    /// Spec section 4.4 step c: adopt the previous generation's object when
    /// it exists and (for PATH keys) its `mtime`/`uniq` still matches.
    fn adopt_from_previous(
        previous: &ConfigCache,
        family: Family,
        key_bytes: &[u8],
        index_key: &IndexKey,
        fresh_stamp: Option<crate::freshness::FileStamp>,
    ) -> Option<CachedObject> {
        let prior = previous.store.get(index_key)?;
        debug_assert_eq!(prior.family, family);
        debug_assert_eq!(prior.key_bytes, key_bytes);

        let matches = match (prior.path_stamp, fresh_stamp) {
            (Some(old), Some(new)) => old == new,
            (None, None) => true,
            _ => false,
        };
        if !matches {
            return None;
        }

        debug!(family = %family, "inheriting parsed object from previous configuration generation");
        Some(prior.object.make_handle())
    }
}

impl Drop for ConfigCache {
    fn drop(&mut self) {
        // Spec section 4.4: the configuration cache never evicts; it is
        // destroyed wholesale when its owning cycle tears down. The
        // recency list is always empty for an unbounded cache (spec
        // section 9), so this reduces to freeing every entry and
        // confirming that invariant held.
        self.store.drain_all();
        crate::lifecycle::check_teardown_invariant("configuration", self.store.len(), self.store.recency_list_is_empty());
    }
}

#[cfg(test)]
mod tests;
