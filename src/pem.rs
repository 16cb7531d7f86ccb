// Copyright 2024 SSL Object Cache Contributors.
// See the "LICENSE.txt" file at the top-level directory of this distribution.
//
// Licensed under the MIT license. This file may not be copied, modified,
// or distributed except according to those terms.

//! Structural PEM block splitting.
//!
//! This is the only "parsing" this crate does itself: finding
//! `-----BEGIN ...-----` / `-----END ...-----` delimited blocks, any
//! `Key: Value` headers inside them (used by legacy encrypted private
//! keys), and decoding the base64 body to raw bytes. Interpreting those
//! bytes as an X.509 certificate, a PKCS#8 key, or a CRL is the job of the
//! external crypto library behind the [`crate::loader`] seam; this module
//! never looks inside the decoded bytes.

use std::path::PathBuf;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use nom::bytes::complete::{tag, take_until};
use nom::character::complete::{char as nom_char, not_line_ending};
use nom::sequence::{preceded, terminated};
use nom::IResult;

use crate::errors::Error;

/// One block found between a `BEGIN`/`END` pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PemBlock {
    pub label: String,
    pub headers: Vec<(String, String)>,
    pub der: Vec<u8>,
}

impl PemBlock {
    /// `true` for the legacy `Proc-Type: 4,ENCRYPTED` encrypted key header.
    pub fn is_encrypted(&self) -> bool {
        self.headers
            .iter()
            .any(|(k, v)| k.eq_ignore_ascii_case("Proc-Type") && v.contains("ENCRYPTED"))
    }

    /// The `DEK-Info` header value, e.g. `AES-128-CBC,D54228DF542A4FCF`.
    pub fn dek_info(&self) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case("DEK-Info"))
            .map(|(_, v)| v.as_str())
    }
}

fn begin_line(input: &str) -> IResult<&str, &str> {
    preceded(tag("-----BEGIN "), terminated(take_until("-----"), tag("-----")))(input)
}

fn end_line(input: &str) -> IResult<&str, &str> {
    preceded(tag("-----END "), terminated(take_until("-----"), tag("-----")))(input)
}

fn header_line(input: &str) -> IResult<&str, (&str, &str)> {
    let (input, key) = take_until(":")(input)?;
    let (input, _) = nom_char(':')(input)?;
    let (input, value) = preceded(nom_char(' '), not_line_ending)(input)?;
    Ok((input, (key, value)))
}

/// Split `text` into an ordered sequence of PEM blocks.
///
/// An input with no `BEGIN` line at all is not an error: it is the normal
/// "no start line" end-of-input signal from spec section 4.2 and yields an
/// empty vector. A `BEGIN` whose matching `END`/label is missing or whose
/// body fails to base64-decode is a parse failure.
pub fn split_pem_blocks(text: &str, path: Option<PathBuf>) -> Result<Vec<PemBlock>, Error> {
    let mut blocks = Vec::new();
    let mut lines = text.lines().peekable();

    while let Some(line) = lines.next() {
        let Ok((_, label)) = begin_line(line) else {
            continue;
        };
        let label = label.to_string();

        let mut headers = Vec::new();
        let mut body = String::new();
        let mut saw_end = false;

        for line in lines.by_ref() {
            if let Ok((_, end_label)) = end_line(line) {
                if end_label != label {
                    return Err(Error::Parse {
                        step: "pem end label mismatch",
                        path: path.clone(),
                        source: nom::Err::Error(nom::error::Error::new(
                            0,
                            nom::error::ErrorKind::Tag,
                        )),
                    });
                }
                saw_end = true;
                break;
            }

            if body.is_empty() && headers.len() < 16 {
                if let Ok((_, (key, value))) = header_line(line) {
                    headers.push((key.to_string(), value.to_string()));
                    continue;
                }
            }

            body.push_str(line.trim());
        }

        if !saw_end {
            return Err(Error::Parse {
                step: "pem missing end line",
                path: path.clone(),
                source: nom::Err::Error(nom::error::Error::new(0, nom::error::ErrorKind::Eof)),
            });
        }

        let der = BASE64.decode(body.as_bytes()).map_err(|_| Error::Parse {
            step: "pem base64 body",
            path: path.clone(),
            source: nom::Err::Error(nom::error::Error::new(0, nom::error::ErrorKind::Verify)),
        })?;

        blocks.push(PemBlock { label, headers, der });
    }

    Ok(blocks)
}

#[cfg(test)]
mod tests;
