// Copyright 2024 SSL Object Cache Contributors.
// See the "LICENSE.txt" file at the top-level directory of this distribution.
//
// Licensed under the MIT license. This file may not be copied, modified,
// or distributed except according to those terms.

//! Object loaders: per-family `{create, ref, free}` triples (spec
//! section 4.2), dispatched on [`Family`] rather than through an
//! inheritance hierarchy, per the design note in spec section 9.

use std::path::PathBuf;
use std::rc::Rc;

use memmap2::Mmap;

use crate::decrypt::{fill_password_buffer, CallbackDirection, NoopDecryptor, PemDecryptor};
use crate::engine::EngineRegistry;
use crate::errors::{Error, Result};
use crate::family::Family;
use crate::key::{bytes_to_path, Key, KeyKind};
use crate::object::{CachedObject, Certificate, CertificateRevocationList, PrivateKey};
use crate::pem::{split_pem_blocks, PemBlock};

/// The legacy `PEM_BUFSIZE` the password callback contract is bound by.
pub const PASSWORD_CALLBACK_BUF_SIZE: usize = 256;

/// Family-specific loader input. Only PKEY uses it; other families ignore
/// whatever is passed.
#[derive(Debug, Clone, Default)]
pub enum LoaderData {
    #[default]
    None,
    Passwords(Vec<String>),
}

impl LoaderData {
    pub fn passwords(&self) -> &[String] {
        match self {
            LoaderData::None => &[],
            LoaderData::Passwords(passwords) => passwords,
        }
    }

    /// Spec sections 4.4/4.5: a non-empty password list bypasses the
    /// cache entirely for PKEY fetches.
    pub fn bypasses_cache(&self, family: Family) -> bool {
        family == Family::Pkey && !self.passwords().is_empty()
    }
}

/// Collaborators a real crypto library would supply: engines for
/// `engine:` references and a decryptor for encrypted private keys.
#[derive(Debug)]
pub struct LoaderContext {
    pub engines: EngineRegistry,
    pub decryptor: Box<dyn PemDecryptor>,
}

impl Default for LoaderContext {
    fn default() -> Self {
        Self {
            engines: EngineRegistry::new(),
            decryptor: Box::new(NoopDecryptor),
        }
    }
}

/// Parse `key` into a cache object. This is the `create` half of the
/// loader triple; `ref`/`free` are [`CachedObject::make_handle`] and
/// ordinary `drop`, respectively (see spec section 5 and
/// [`crate::object`]).
pub fn create(
    family: Family,
    key: &Key,
    loader_data: &LoaderData,
    ctx: &LoaderContext,
) -> Result<CachedObject> {
    match family {
        Family::Cert => create_cert_or_ca(key, "cert"),
        Family::Ca => create_cert_or_ca(key, "ca"),
        Family::Crl => create_crl(key),
        Family::Pkey => create_pkey(key, loader_data, ctx),
    }
}

fn create_cert_or_ca(key: &Key, family_name: &'static str) -> Result<CachedObject> {
    let path = path_of(key);
    let text = read_source(key)?;
    let blocks = split_pem_blocks(&text, path.clone())?;
    if blocks.is_empty() {
        return Err(Error::EmptyInput {
            family: family_name,
            path,
        });
    }

    let chain = blocks
        .into_iter()
        .map(|block| Rc::new(Certificate { der: block.der }))
        .collect();
    Ok(CachedObject::Cert(chain))
}

fn create_crl(key: &Key) -> Result<CachedObject> {
    let path = path_of(key);
    let text = read_source(key)?;
    let blocks = split_pem_blocks(&text, path.clone())?;
    if blocks.is_empty() {
        return Err(Error::EmptyInput {
            family: "crl",
            path,
        });
    }

    let chain = blocks
        .into_iter()
        .map(|block| Rc::new(CertificateRevocationList { der: block.der }))
        .collect();
    Ok(CachedObject::Crl(chain))
}

fn create_pkey(key: &Key, loader_data: &LoaderData, ctx: &LoaderContext) -> Result<CachedObject> {
    match key.kind {
        KeyKind::Engine => create_pkey_engine(key, ctx),
        KeyKind::Data | KeyKind::Path => create_pkey_file(key, loader_data, ctx),
    }
}

fn create_pkey_engine(key: &Key, ctx: &LoaderContext) -> Result<CachedObject> {
    let reference = std::str::from_utf8(&key.bytes)?;
    let remainder = reference.strip_prefix("engine:").unwrap_or(reference);
    let Some((engine_id, key_id)) = remainder.split_once(':') else {
        return Err(Error::InvalidEngineSyntax {
            reference: reference.to_string(),
        });
    };

    let engine = ctx.engines.get(engine_id).ok_or_else(|| Error::EngineNotFound {
        engine_id: engine_id.to_string(),
    })?;

    let private_key = engine
        .load_private_key(key_id)
        .map_err(|reason| Error::EngineKeyNotLoadable {
            engine_id: engine_id.to_string(),
            key_id: key_id.to_string(),
            reason,
        })?;

    Ok(CachedObject::Pkey(private_key))
}

fn create_pkey_file(key: &Key, loader_data: &LoaderData, ctx: &LoaderContext) -> Result<CachedObject> {
    let path = path_of(key);
    let text = read_source(key)?;
    let blocks = split_pem_blocks(&text, path.clone())?;
    let block = blocks.into_iter().next().ok_or(Error::EmptyInput {
        family: "pkey",
        path: path.clone(),
    })?;

    let der = decrypt_key_block(&block, loader_data.passwords(), ctx.decryptor.as_ref(), &path)?;
    Ok(CachedObject::Pkey(Rc::new(PrivateKey { der })))
}

fn decrypt_key_block(
    block: &PemBlock,
    passwords: &[String],
    decryptor: &dyn PemDecryptor,
    path: &Option<PathBuf>,
) -> Result<Vec<u8>> {
    if passwords.is_empty() {
        return decryptor
            .decrypt(block, &[])
            .map_err(|_| Error::NoPasswordMatched { path: path.clone() });
    }

    let mut buf = [0u8; PASSWORD_CALLBACK_BUF_SIZE];
    for password in passwords {
        // This crate's own retry loop only ever asks for a password to
        // decrypt, never to encrypt (spec section 4.2).
        let len = fill_password_buffer(CallbackDirection::Read, password, &mut buf)?;
        if let Ok(der) = decryptor.decrypt(block, &buf[..len]) {
            return Ok(der);
        }
        // Between attempts the real callback resets the input source and
        // clears accumulated decoder errors; our block is already fully
        // structurally parsed, so there is nothing stateful to rewind.
    }

    Err(Error::NoPasswordMatched { path: path.clone() })
}

fn path_of(key: &Key) -> Option<PathBuf> {
    match key.kind {
        KeyKind::Path => Some(bytes_to_path(&key.bytes)),
        _ => None,
    }
}

/// Read the PEM text backing `key`: the inline body for DATA, the mapped
/// file contents for PATH. ENGINE keys have no byte source.
fn read_source(key: &Key) -> Result<String> {
    match key.kind {
        KeyKind::Data => {
            let without_prefix = key.bytes.strip_prefix(b"data:").unwrap_or(&key.bytes);
            Ok(std::str::from_utf8(without_prefix)?.to_string())
        }
        KeyKind::Path => {
            let path = bytes_to_path(&key.bytes);
            let file = std::fs::File::open(&path).map_err(|source| Error::Open {
                path: Some(path.clone()),
                source,
            })?;
            let len = file
                .metadata()
                .map_err(|source| Error::ReadMetaData {
                    path: path.clone(),
                    source,
                })?
                .len();
            if len == 0 {
                return Ok(String::new());
            }

            // SAFETY: the file is not concurrently truncated by another
            // thread of this process during the cache's single-threaded
            // fetch (spec section 5).
            let map = unsafe { Mmap::map(&file) }.map_err(|source| Error::Open {
                path: Some(path.clone()),
                source,
            })?;
            Ok(std::str::from_utf8(&map)?.to_string())
        }
        KeyKind::Engine => Ok(String::new()),
    }
}

#[cfg(test)]
mod tests;
