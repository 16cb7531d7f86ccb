// Copyright 2024 SSL Object Cache Contributors.
// See the "LICENSE.txt" file at the top-level directory of this distribution.
//
// Licensed under the MIT license. This file may not be copied, modified,
// or distributed except according to those terms.

//! The parsed objects the cache hands out, and the refcount handoff
//! contract described in spec section 5: cloning a container bumps every
//! element's `Rc` strong count, exactly like `ref()` bumping an external
//! crypto library's own refcount. Dropping a handle releases the caller's
//! reference independently of the cache's own.

use std::rc::Rc;

/// A parsed X.509 certificate, as produced by an external crypto library.
/// This crate treats the DER payload as opaque; it never validates or
/// interprets certificate fields.
#[derive(Debug, PartialEq, Eq)]
pub struct Certificate {
    pub der: Vec<u8>,
}

/// A parsed private key.
#[derive(Debug, PartialEq, Eq)]
pub struct PrivateKey {
    pub der: Vec<u8>,
}

/// A parsed certificate revocation list.
#[derive(Debug, PartialEq, Eq)]
pub struct CertificateRevocationList {
    pub der: Vec<u8>,
}

/// An ordered, non-empty chain of reference-counted certificates. `CERT`
/// and `CA` both produce this; CERT distinguishes a leaf during parsing
/// (spec section 4.2), but the resulting container shape is the same.
pub type CertificateChain = Vec<Rc<Certificate>>;

/// An ordered, non-empty chain of reference-counted CRLs.
pub type CrlChain = Vec<Rc<CertificateRevocationList>>;

/// The tagged union of everything the cache can hold or hand out. This is
/// both the cache entry's payload and the handle returned to callers:
/// cloning it is `ref()`, dropping it is the caller releasing its
/// reference. The cache's own copy is released the same way, on eviction
/// or teardown.
#[derive(Debug, Clone)]
pub enum CachedObject {
    Cert(CertificateChain),
    Pkey(Rc<PrivateKey>),
    Crl(CrlChain),
}

impl CachedObject {
    /// A caller-owned handle that shares the underlying refcounted objects
    /// with this one. Mirrors the family loader's `ref()` operation: the
    /// cache's own reference is unaffected by producing a handle.
    pub fn make_handle(&self) -> CachedObject {
        self.clone()
    }

    /// The family this object was produced by. CA objects are represented
    /// identically to CERT objects (both are [`CachedObject::Cert`]); the
    /// distinction lives in which family the entry was stored under, not
    /// in the object shape.
    pub fn kind_name(&self) -> &'static str {
        match self {
            CachedObject::Cert(_) => "cert-chain",
            CachedObject::Pkey(_) => "private-key",
            CachedObject::Crl(_) => "crl-chain",
        }
    }
}
