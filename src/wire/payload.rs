// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Token payload codec.
//!
//! Settings payloads are up to four null-terminated ASCII tokens in
//! fixed order: `section \0 name \0 value \0 type \0`. A historical
//! encoding terminated the type field with one extra null; [`parse`]
//! reports it as [`Tokens::ExtraNull`] and callers accept both forms.

use crate::config::MAX_PAYLOAD_LEN;
use crate::error::{Error, Result};

/// Classification of a parsed payload: how many tokens were located.
///
/// Ordered so that `tokens >= Tokens::Value` asks "is a value present".
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Tokens {
    /// Unterminated or over-tokenized buffer.
    Invalid,
    /// Zero-length buffer.
    Empty,
    /// One token: section.
    Section,
    /// Two tokens: section, name.
    Name,
    /// Three tokens: section, name, value.
    Value,
    /// Four tokens: section, name, value, type.
    Type,
    /// Four tokens followed by a lone extra null terminator.
    ExtraNull,
}

/// Borrowed views of the tokens located by [`parse`].
///
/// Tokens that were not present are `None`; present tokens may be empty
/// strings.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Fields<'a> {
    pub section: Option<&'a str>,
    pub name: Option<&'a str>,
    pub value: Option<&'a str>,
    pub type_tag: Option<&'a str>,
}

/// Parse a settings payload into its tokens.
///
/// Returns the classification and borrowed token slices; no copies are
/// made. On [`Tokens::Invalid`] every field is `None`.
pub fn parse(buf: &[u8]) -> (Tokens, Fields<'_>) {
    let none = Fields::default();

    if buf.is_empty() {
        return (Tokens::Empty, none);
    }
    if buf[buf.len() - 1] != 0 {
        return (Tokens::Invalid, none);
    }

    let mut nulls = [0usize; 5];
    let mut count = 0usize;
    for (i, &byte) in buf.iter().enumerate() {
        if byte == 0 {
            if count == 5 {
                return (Tokens::Invalid, none);
            }
            nulls[count] = i;
            count += 1;
        }
    }

    // A fifth terminator is only valid as a lone trailing byte directly
    // after the type token's own terminator.
    if count == 5 && nulls[3] != buf.len() - 2 {
        return (Tokens::Invalid, none);
    }

    let mut fields = Fields::default();
    for idx in 0..count.min(4) {
        let start = if idx == 0 { 0 } else { nulls[idx - 1] + 1 };
        let bytes = &buf[start..nulls[idx]];
        let text = match std::str::from_utf8(bytes) {
            Ok(text) => text,
            Err(_) => return (Tokens::Invalid, none),
        };
        match idx {
            0 => fields.section = Some(text),
            1 => fields.name = Some(text),
            2 => fields.value = Some(text),
            _ => fields.type_tag = Some(text),
        }
    }

    let tokens = match count {
        1 => Tokens::Section,
        2 => Tokens::Name,
        3 => Tokens::Value,
        4 => Tokens::Type,
        _ => Tokens::ExtraNull,
    };

    (tokens, fields)
}

/// Append one null-terminated token to a payload under construction.
///
/// Rejects tokens with interior NUL bytes and enforces the payload
/// ceiling over the whole buffer.
pub fn push_token(out: &mut Vec<u8>, token: &str) -> Result<()> {
    if token.as_bytes().contains(&0) {
        return Err(Error::EmbeddedNul);
    }
    if out.len() + token.len() + 1 > MAX_PAYLOAD_LEN {
        return Err(Error::PayloadTooLarge);
    }
    out.extend_from_slice(token.as_bytes());
    out.push(0);
    Ok(())
}

/// Format tokens into `out` in wire order, stopping at the first absent
/// token. Returns the number of bytes appended (terminators included).
pub fn format(
    out: &mut Vec<u8>,
    section: Option<&str>,
    name: Option<&str>,
    value: Option<&str>,
    type_tag: Option<&str>,
) -> Result<usize> {
    let start = out.len();
    for token in [section, name, value, type_tag] {
        let Some(token) = token else { break };
        push_token(out, token)?;
    }
    Ok(out.len() - start)
}
