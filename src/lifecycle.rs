// Copyright 2024 SSL Object Cache Contributors.
// See the "LICENSE.txt" file at the top-level directory of this distribution.
//
// Licensed under the MIT license. This file may not be copied, modified,
// or distributed except according to those terms.

//! Shared teardown-invariant check (spec section 4.6): after walking a
//! cache's index and freeing every entry, `current` must be zero and the
//! recency list must be empty. Both [`crate::config_cache::ConfigCache`]
//! and [`crate::connection_cache::ConnectionCache`] call this from their
//! `Drop` implementation, which is this crate's equivalent of "register an
//! explicit destructor on the cache object" (spec section 9) in the
//! absence of the source's arena-bound teardown hooks.

/// Log an alert-level violation if teardown left the cache in an
/// inconsistent state. Does not abort teardown (spec section 7).
pub fn check_teardown_invariant(cache_kind: &'static str, current: usize, recency_list_is_empty: bool) {
    if current != 0 || !recency_list_is_empty {
        tracing::error!(
            cache_kind,
            current,
            recency_list_is_empty,
            "cache teardown invariant violated: entries or recency list outlived the index walk"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clean_teardown_does_not_panic() {
        check_teardown_invariant("test", 0, true);
    }

    #[test]
    fn dirty_teardown_does_not_abort() {
        // Spec section 7: teardown errors are logged, never fatal.
        check_teardown_invariant("test", 3, false);
    }
}
