// Copyright 2024 SSL Object Cache Contributors.
// See the "LICENSE.txt" file at the top-level directory of this distribution.
//
// Licensed under the MIT license. This file may not be copied, modified,
// or distributed except according to those terms.

use std::path::PathBuf;

/// Result alias used throughout the crate.
pub type Result<T> = core::result::Result<T, Error>;

/// Information about a failure of an operation, covering every error class
/// in spec section 7.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// An `engine:` reference was missing its `key-id` colon separator.
    #[error("invalid syntax: engine reference \"{reference}\" is missing a key id")]
    InvalidEngineSyntax { reference: String },

    #[error("failed to open source. Path: {path:?}")]
    Open {
        path: Option<PathBuf>,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to read metadata. Path: {path}")]
    ReadMetaData {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("parsing failed during {step}. Path: {path:?}")]
    Parse {
        step: &'static str,
        path: Option<PathBuf>,
        #[source]
        source: nom::Err<nom::error::Error<usize>>,
    },

    /// CRL and CA loaders (and, transitively, CERT) require at least one
    /// object in the source.
    #[error("{family} source contained no objects. Path: {path:?}")]
    EmptyInput {
        family: &'static str,
        path: Option<PathBuf>,
    },

    #[error("engine not found: {engine_id}")]
    EngineNotFound { engine_id: String },

    #[error("engine {engine_id} could not load key {key_id}: {reason}")]
    EngineKeyNotLoadable {
        engine_id: String,
        key_id: String,
        reason: String,
    },

    /// The password callback was invoked to encrypt rather than decrypt.
    /// This is a programmer error in the calling crypto library; it is
    /// logged at alert level by the caller and surfaced here as a failure.
    #[error("password callback invoked for encryption, which is not supported")]
    WrongCallbackDirection,

    #[error("no supplied password decrypted the key. Path: {path:?}")]
    NoPasswordMatched { path: Option<PathBuf> },

    #[error(transparent)]
    Utf8(#[from] core::str::Utf8Error),
}
