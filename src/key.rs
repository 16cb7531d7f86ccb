// Copyright 2024 SSL Object Cache Contributors.
// See the "LICENSE.txt" file at the top-level directory of this distribution.
//
// Licensed under the MIT license. This file may not be copied, modified,
// or distributed except according to those terms.

//! Key identity: classifying a caller-supplied reference string into a
//! typed, hashed, comparable key.

use std::path::{Component, Path, PathBuf};

use crate::family::Family;
use crate::hash::hash32;

/// Maximum key byte length the spec allows (2^30 - 1).
pub const MAX_KEY_BYTES: usize = (1 << 30) - 1;

/// Which syntactic form a reference took.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum KeyKind {
    Path,
    Data,
    Engine,
}

/// A normalized, hashed identity for a cache entry.
///
/// Two keys are equal iff their `(family, bytes)` are equal; `hash` is a
/// cheap pre-filter consulted by the store before the full byte comparison.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Key {
    pub kind: KeyKind,
    pub bytes: Vec<u8>,
    pub hash: u32,
}

impl Key {
    fn new(kind: KeyKind, bytes: Vec<u8>) -> Self {
        debug_assert!(bytes.len() <= MAX_KEY_BYTES, "key bytes exceed spec bound");
        let hash = hash32(&bytes);
        Self { kind, bytes, hash }
    }
}

/// Classify a reference string for the given family, resolving PATH
/// references against `prefix`. This never fails: malformed `engine:`
/// references are classified as [`KeyKind::Engine`] and rejected later, at
/// load time, per spec section 4.1 rule 2.
pub fn classify(family: Family, reference: &str, prefix: &Path) -> Key {
    if matches!(family, Family::Cert | Family::Pkey) && reference.starts_with("data:") {
        return Key::new(KeyKind::Data, reference.as_bytes().to_vec());
    }

    if family == Family::Pkey && reference.starts_with("engine:") {
        return Key::new(KeyKind::Engine, reference.as_bytes().to_vec());
    }

    let normalized = normalize_path(reference, prefix);
    Key::new(KeyKind::Path, path_to_bytes(&normalized))
}

/// Lexically resolve `reference` against `prefix` into an absolute,
/// normalized path, without touching the filesystem (no symlink
/// resolution, no existence check - matching the "missing file is not an
/// error at this step" rule of spec section 4.4).
fn normalize_path(reference: &str, prefix: &Path) -> PathBuf {
    let candidate = Path::new(reference);
    let joined = if candidate.is_absolute() {
        candidate.to_path_buf()
    } else {
        prefix.join(candidate)
    };

    let mut out = PathBuf::new();
    for component in joined.components() {
        match component {
            Component::ParentDir => {
                out.pop();
            }
            Component::CurDir => {}
            other => out.push(other.as_os_str()),
        }
    }
    out
}

#[cfg(unix)]
fn path_to_bytes(path: &Path) -> Vec<u8> {
    use std::os::unix::ffi::OsStrExt;
    path.as_os_str().as_bytes().to_vec()
}

#[cfg(not(unix))]
fn path_to_bytes(path: &Path) -> Vec<u8> {
    path.to_string_lossy().into_owned().into_bytes()
}

/// The inverse of [`path_to_bytes`], shared by the loader and both caches
/// so PATH-kind key bytes are interpreted as a path exactly once.
#[cfg(unix)]
pub fn bytes_to_path(bytes: &[u8]) -> PathBuf {
    use std::ffi::OsStr;
    use std::os::unix::ffi::OsStrExt;
    PathBuf::from(OsStr::from_bytes(bytes))
}

#[cfg(not(unix))]
pub fn bytes_to_path(bytes: &[u8]) -> PathBuf {
    PathBuf::from(String::from_utf8_lossy(bytes).into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn data_prefix_is_retained_in_key_bytes() {
        let key = classify(Family::Cert, "data:abc", Path::new("/etc/ssl"));
        assert_eq!(key.kind, KeyKind::Data);
        assert_eq!(key.bytes, b"data:abc");
    }

    #[test]
    fn data_only_recognized_for_cert_and_pkey() {
        let key = classify(Family::Crl, "data:abc", Path::new("/etc/ssl"));
        assert_eq!(key.kind, KeyKind::Path);
    }

    #[test]
    fn engine_only_recognized_for_pkey() {
        let pkey = classify(Family::Pkey, "engine:soft:key1", Path::new("/etc/ssl"));
        assert_eq!(pkey.kind, KeyKind::Engine);

        let cert = classify(Family::Cert, "engine:soft:key1", Path::new("/etc/ssl"));
        assert_eq!(cert.kind, KeyKind::Path);
    }

    #[test]
    fn malformed_engine_reference_still_classifies() {
        let key = classify(Family::Pkey, "engine:nocolon", Path::new("/etc/ssl"));
        assert_eq!(key.kind, KeyKind::Engine);
        assert_eq!(key.bytes, b"engine:nocolon");
    }

    #[test]
    fn relative_path_resolved_against_prefix() {
        let key = classify(Family::Cert, "cert.pem", Path::new("/etc/ssl"));
        assert_eq!(key.kind, KeyKind::Path);
        assert_eq!(key.bytes, b"/etc/ssl/cert.pem");
    }

    #[test]
    fn absolute_path_bypasses_prefix() {
        let key = classify(Family::Ca, "/var/ca.pem", Path::new("/etc/ssl"));
        assert_eq!(key.bytes, b"/var/ca.pem");
    }

    #[test]
    fn dot_dot_components_are_collapsed() {
        let key = classify(Family::Cert, "sub/../cert.pem", Path::new("/etc/ssl"));
        assert_eq!(key.bytes, b"/etc/ssl/cert.pem");
    }

    #[test]
    fn same_reference_classifies_identically() {
        let a = classify(Family::Cert, "data:xyz", Path::new("/etc/ssl"));
        let b = classify(Family::Cert, "data:xyz", Path::new("/etc/ssl"));
        assert_eq!(a, b);
        assert_eq!(a.hash, b.hash);
    }
}
