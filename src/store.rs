// Copyright 2024 SSL Object Cache Contributors.
// See the "LICENSE.txt" file at the top-level directory of this distribution.
//
// Licensed under the MIT license. This file may not be copied, modified,
// or distributed except according to those terms.

//! The indexed store: a self-balancing ordered map keyed by
//! `(hash, family, key-bytes)` (spec section 4.3), plus the doubly-linked
//! recency list used by bounded caches. `BTreeMap` gives O(log n)
//! insert/lookup/remove and in-order iteration for teardown for free.

use std::collections::BTreeMap;

use crate::entry::{Entry, IndexKey};

/// Ordered map of cache entries plus an optional recency list threaded
/// through the entries themselves. `bounded` caches (the connection cache)
/// maintain the list; the unbounded configuration cache does not (spec
/// section 9: the list is unused in unbounded mode).
#[derive(Debug, Default)]
pub struct Store {
    entries: BTreeMap<IndexKey, Entry>,
    head: Option<IndexKey>,
    tail: Option<IndexKey>,
}

impl Store {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, key: &IndexKey) -> Option<&Entry> {
        self.entries.get(key)
    }

    pub fn get_mut(&mut self, key: &IndexKey) -> Option<&mut Entry> {
        self.entries.get_mut(key)
    }

    /// Insert a freshly-created entry, detached from the recency list.
    /// Callers that maintain a bounded cache call [`Store::splice_to_head`]
    /// immediately afterwards.
    pub fn insert(&mut self, key: IndexKey, entry: Entry) {
        self.entries.insert(key, entry);
    }

    pub fn remove(&mut self, key: &IndexKey) -> Option<Entry> {
        let removed = self.entries.remove(key)?;
        self.unlink(key, &removed);
        Some(removed)
    }

    /// In-order walk of every entry, used by teardown (spec section 4.6)
    /// and by configuration-cache inheritance lookups on the previous
    /// generation's store.
    pub fn iter(&self) -> impl Iterator<Item = (&IndexKey, &Entry)> {
        self.entries.iter()
    }

    /// Drain every entry, releasing the store's reference to each object
    /// (an ordinary Rust `drop`, which is this crate's `free`).
    pub fn drain_all(&mut self) -> Vec<Entry> {
        self.head = None;
        self.tail = None;
        self.entries.drain().map(|(_, entry)| entry).collect()
    }

    /// Detach `key` from the recency list if linked, then move it to the
    /// head (most-recently-used). No-op if the key is missing.
    pub fn splice_to_head(&mut self, key: &IndexKey) {
        self.detach(key);

        let old_head = self.head.replace(key.clone());
        if let Some(old_head) = &old_head {
            if let Some(entry) = self.entries.get_mut(key) {
                entry.next = Some(old_head.clone());
            }
            if let Some(head_entry) = self.entries.get_mut(old_head) {
                head_entry.prev = Some(key.clone());
            }
        }
        if self.tail.is_none() {
            self.tail = Some(key.clone());
        }
    }

    /// Remove `key` from the recency list without removing it from the
    /// index. Idempotent (spec section 9).
    pub fn detach(&mut self, key: &IndexKey) {
        let (prev, next) = match self.entries.get(key) {
            Some(entry) => (entry.prev.clone(), entry.next.clone()),
            None => return,
        };

        if let Some(prev_key) = &prev {
            if let Some(prev_entry) = self.entries.get_mut(prev_key) {
                prev_entry.next = next.clone();
            }
        } else if self.head.as_ref() == Some(key) {
            self.head = next.clone();
        }

        if let Some(next_key) = &next {
            if let Some(next_entry) = self.entries.get_mut(next_key) {
                next_entry.prev = prev.clone();
            }
        } else if self.tail.as_ref() == Some(key) {
            self.tail = prev.clone();
        }

        if let Some(entry) = self.entries.get_mut(key) {
            entry.detach_links();
        }
    }

    fn unlink(&mut self, key: &IndexKey, entry: &Entry) {
        if let Some(prev_key) = &entry.prev {
            if let Some(prev_entry) = self.entries.get_mut(prev_key) {
                prev_entry.next = entry.next.clone();
            }
        } else if self.head.as_ref() == Some(key) {
            self.head = entry.next.clone();
        }

        if let Some(next_key) = &entry.next {
            if let Some(next_entry) = self.entries.get_mut(next_key) {
                next_entry.prev = entry.prev.clone();
            }
        } else if self.tail.as_ref() == Some(key) {
            self.tail = entry.prev.clone();
        }
    }

    /// The key currently at the tail (least-recently-used) of the recency
    /// list, if any.
    pub fn tail_key(&self) -> Option<IndexKey> {
        self.tail.clone()
    }

    pub fn head_key(&self) -> Option<IndexKey> {
        self.head.clone()
    }

    /// True if the recency list has no linked entries, used by teardown's
    /// invariant check (spec section 4.6).
    pub fn recency_list_is_empty(&self) -> bool {
        self.head.is_none() && self.tail.is_none()
    }
}

#[cfg(test)]
mod tests;
