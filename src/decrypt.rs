// Copyright 2024 SSL Object Cache Contributors.
// See the "LICENSE.txt" file at the top-level directory of this distribution.
//
// Licensed under the MIT license. This file may not be copied, modified,
// or distributed except according to those terms.

//! The decryption seam a real crypto library plugs into for encrypted
//! private keys (spec section 4.2, PKEY DATA/PATH branch). This crate
//! performs no real cryptography; it defines the trait and ships only a
//! passthrough implementation plus a test double.

use std::fmt;

use crate::errors::Error;

/// Which direction a PEM password callback was invoked for. The callback
/// this crate hands to a PEM decoder is only ever meant to be asked for a
/// password to *decrypt* an existing key; a write-mode invocation means
/// the decoder wired the callback up to an encryption path, which is a
/// programmer error in the calling crypto library (spec section 4.2,
/// error kind 6 in section 7).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallbackDirection {
    Read,
    Write,
}

/// Decrypts (or passes through) a PEM block's DER payload given a
/// candidate password. A real implementation would apply PKCS#5/PKCS#8 or
/// the legacy `DEK-Info` cipher named in the block's headers.
pub trait PemDecryptor: fmt::Debug {
    /// Attempt to produce cleartext key DER from `der` using `password`.
    /// `block` is unencrypted (no `Proc-Type: ENCRYPTED` header): return
    /// `der` unchanged.
    fn decrypt(&self, block: &crate::pem::PemBlock, password: &[u8]) -> Result<Vec<u8>, String>;
}

/// Passes unencrypted bodies through; refuses anything encrypted. This is
/// the crate's built-in stand-in for "no real crypto library configured".
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopDecryptor;

impl PemDecryptor for NoopDecryptor {
    fn decrypt(&self, block: &crate::pem::PemBlock, password: &[u8]) -> Result<Vec<u8>, String> {
        if block.is_encrypted() {
            let _ = password;
            Err("no decryptor configured for encrypted key material".to_string())
        } else {
            Ok(block.der.clone())
        }
    }
}

/// Maximum bytes the password callback contract copies from a candidate
/// password, matching spec section 4.2's `buf_size` truncation rule. A
/// `Write`-direction invocation is rejected outright: it never happens on
/// this crate's own decrypt path (section 4.2's retry loop always calls
/// with `Read`), but a decoder that invokes the callback for encryption
/// anyway must be refused rather than silently handed key material.
pub fn fill_password_buffer(
    direction: CallbackDirection,
    password: &str,
    buf: &mut [u8],
) -> Result<usize, Error> {
    if direction == CallbackDirection::Write {
        tracing::error!("password callback invoked for encryption, which is not supported");
        return Err(Error::WrongCallbackDirection);
    }

    let bytes = password.as_bytes();
    if bytes.len() > buf.len() {
        tracing::warn!(
            password_len = bytes.len(),
            buf_size = buf.len(),
            "password truncated to fit callback buffer"
        );
    }
    let copy_len = bytes.len().min(buf.len());
    buf[..copy_len].copy_from_slice(&bytes[..copy_len]);
    Ok(copy_len)
}

#[cfg(test)]
pub mod test_support {
    use super::PemDecryptor;

    /// Succeeds only for one exact password, used to exercise the retry
    /// semantics of spec section 4.2/section 8 scenario 2 without real
    /// cryptography: the "ciphertext" is treated as valid key DER only
    /// when the supplied password matches.
    #[derive(Debug, Clone)]
    pub struct FixedPasswordDecryptor {
        pub correct_password: String,
    }

    impl PemDecryptor for FixedPasswordDecryptor {
        fn decrypt(
            &self,
            block: &crate::pem::PemBlock,
            password: &[u8],
        ) -> Result<Vec<u8>, String> {
            if !block.is_encrypted() {
                return Ok(block.der.clone());
            }
            if password == self.correct_password.as_bytes() {
                Ok(block.der.clone())
            } else {
                Err("incorrect password".to_string())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::test_support::FixedPasswordDecryptor;
    use super::*;
    use crate::pem::PemBlock;

    fn encrypted_block() -> PemBlock {
        PemBlock {
            label: "RSA PRIVATE KEY".to_string(),
            headers: vec![
                ("Proc-Type".to_string(), "4,ENCRYPTED".to_string()),
                ("DEK-Info".to_string(), "AES-128-CBC,AA".to_string()),
            ],
            der: vec![1, 2, 3],
        }
    }

    #[test]
    fn noop_decryptor_passes_through_unencrypted() {
        let block = PemBlock {
            label: "PRIVATE KEY".to_string(),
            headers: vec![],
            der: vec![9, 9, 9],
        };
        let out = NoopDecryptor.decrypt(&block, b"").unwrap();
        assert_eq!(out, vec![9, 9, 9]);
    }

    #[test]
    fn noop_decryptor_rejects_encrypted() {
        assert!(NoopDecryptor.decrypt(&encrypted_block(), b"pw").is_err());
    }

    #[test]
    fn fill_password_buffer_truncates() {
        let mut buf = [0u8; 4];
        let written = fill_password_buffer(CallbackDirection::Read, "toolong", &mut buf).unwrap();
        assert_eq!(written, 4);
        assert_eq!(&buf, b"tool");
    }

    #[test]
    fn fill_password_buffer_fits() {
        let mut buf = [0u8; 8];
        let written = fill_password_buffer(CallbackDirection::Read, "ok", &mut buf).unwrap();
        assert_eq!(written, 2);
        assert_eq!(&buf[..2], b"ok");
    }

    #[test]
    fn fill_password_buffer_rejects_write_direction() {
        // Spec section 4.2/7 error kind 6: a write-mode callback invocation
        // is a programmer error, logged and failed rather than honored.
        let mut buf = [0u8; 8];
        let err = fill_password_buffer(CallbackDirection::Write, "ok", &mut buf).unwrap_err();
        assert!(matches!(err, Error::WrongCallbackDirection));
    }

    #[test]
    fn fixed_password_decryptor_requires_exact_match() {
        let decryptor = FixedPasswordDecryptor {
            correct_password: "right".to_string(),
        };
        let block = encrypted_block();
        assert!(decryptor.decrypt(&block, b"wrong").is_err());
        assert!(decryptor.decrypt(&block, b"right").is_ok());
    }
}
