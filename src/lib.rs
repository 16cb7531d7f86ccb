// Copyright 2024 SSL Object Cache Contributors.
// See the "LICENSE.txt" file at the top-level directory of this distribution.
//
// Licensed under the MIT license. This file may not be copied, modified,
// or distributed except according to those terms.

#![doc = include_str!("../README.md")]
#![doc(html_root_url = "https://docs.rs/ssl-object-cache/0.1.0")]
#![warn(
    missing_docs,
    keyword_idents,
    macro_use_extern_crate,
    missing_debug_implementations,
    non_ascii_idents,
    trivial_casts,
    trivial_numeric_casts,
    unstable_features,
    unused_extern_crates,
    unused_import_braces,
    unused_labels,
    variant_size_differences,
    unused_qualifications,
    clippy::must_use_candidate,
    clippy::default_numeric_fallback
)]

mod clock;
mod config_cache;
mod connection_cache;
mod decrypt;
mod directive;
mod engine;
mod entry;
mod errors;
mod family;
mod freshness;
mod hash;
mod key;
mod lifecycle;
mod loader;
mod object;
mod pem;
mod store;

use std::path::Path;

pub use crate::clock::{Clock, SystemClock};
pub use crate::config_cache::ConfigCache;
pub use crate::connection_cache::ConnectionCache;
pub use crate::decrypt::PemDecryptor;
pub use crate::directive::ObjectCacheConfig;
pub use crate::engine::{Engine, EngineRegistry};
pub use crate::errors::Error;
pub use crate::family::Family;
pub use crate::loader::{LoaderContext, LoaderData};
pub use crate::object::{
    CachedObject, CertificateChain, CrlChain, Certificate, CertificateRevocationList, PrivateKey,
};

/// Result of a fallible cache operation (spec section 7).
pub type Result<T> = core::result::Result<T, Error>;

/// `config_fetch` (spec section 6): use during configuration load. `cache`
/// is the current generation's configuration cache; `previous` is the
/// prior generation's cache, consulted for inheritance only when
/// `cache`'s `inherit` flag (spec section 4.4) is set. The caller holds
/// both caches alive for the narrow handoff window described in spec
/// section 5; this crate performs no arena bookkeeping of its own; the
/// Rust ownership of `cache`/`previous` plays that role.
pub fn config_fetch(
    cache: &mut ConfigCache,
    clock: &dyn Clock,
    family: Family,
    reference: &str,
    loader_data: &LoaderData,
    ctx: &LoaderContext,
    previous: Option<&ConfigCache>,
) -> Result<CachedObject> {
    cache.fetch(clock, family, reference, loader_data, ctx, previous)
}

/// `connection_fetch` (spec section 6): use on the hot path.
/// `cache = None` means "don't cache, just load" (the `cache_or_null =
/// null` branch of the spec's external interface); `prefix` resolves
/// PATH-kind references the same way it would inside `cache`.
pub fn connection_fetch(
    cache: Option<&mut ConnectionCache>,
    family: Family,
    reference: &str,
    loader_data: &LoaderData,
    ctx: &LoaderContext,
    prefix: &Path,
) -> Result<CachedObject> {
    match cache {
        Some(cache) => cache.fetch(family, reference, loader_data, ctx),
        None => {
            let key = key::classify(family, reference, prefix);
            loader::create(family, &key, loader_data, ctx)
        }
    }
}
