// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Typed setting values.
//!
//! The storage width travels in the variant, so no raw buffer or length
//! crosses the public API. `Str` values own a fixed 255-byte buffer
//! internally; numeric variants map to little-endian buffers of their
//! natural width.

use crate::config::STRING_CAPACITY;
use crate::error::{Error, Result};

use super::TypeId;

/// A typed setting value.
#[derive(Debug, Clone, PartialEq)]
pub enum SettingValue {
    Int8(i8),
    Int16(i16),
    Int32(i32),
    Float(f32),
    Double(f64),
    Str(String),
    Bool(bool),
    /// Index into a registered enum's name list.
    Enum(TypeId, u8),
}

impl SettingValue {
    /// The registry id this value is encoded with.
    #[must_use]
    pub fn type_id(&self) -> TypeId {
        match self {
            Self::Int8(_) | Self::Int16(_) | Self::Int32(_) => TypeId::INT,
            Self::Float(_) | Self::Double(_) => TypeId::FLOAT,
            Self::Str(_) => TypeId::STRING,
            Self::Bool(_) => TypeId::BOOL,
            Self::Enum(id, _) => *id,
        }
    }

    /// Encode into the fixed-width buffer a setting owns.
    pub fn encode(&self) -> Result<Vec<u8>> {
        Ok(match self {
            Self::Int8(v) => vec![*v as u8],
            Self::Int16(v) => v.to_le_bytes().to_vec(),
            Self::Int32(v) => v.to_le_bytes().to_vec(),
            Self::Float(v) => v.to_le_bytes().to_vec(),
            Self::Double(v) => v.to_le_bytes().to_vec(),
            Self::Str(s) => {
                let bytes = s.as_bytes();
                if bytes.len() + 1 > STRING_CAPACITY {
                    return Err(Error::PayloadTooLarge);
                }
                if bytes.contains(&0) {
                    return Err(Error::EmbeddedNul);
                }
                let mut buf = vec![0u8; STRING_CAPACITY];
                buf[..bytes.len()].copy_from_slice(bytes);
                buf
            }
            Self::Bool(v) => vec![u8::from(*v)],
            Self::Enum(_, index) => vec![*index],
        })
    }

    /// Decode a buffer back into a typed value.
    ///
    /// The width disambiguates the integer and float variants; ids
    /// beyond the built-ins decode as [`SettingValue::Enum`].
    pub fn decode(type_id: TypeId, buf: &[u8]) -> Option<Self> {
        match type_id {
            TypeId::INT => match buf.len() {
                1 => Some(Self::Int8(buf[0] as i8)),
                2 => Some(Self::Int16(i16::from_le_bytes([buf[0], buf[1]]))),
                4 => Some(Self::Int32(i32::from_le_bytes([
                    buf[0], buf[1], buf[2], buf[3],
                ]))),
                _ => None,
            },
            TypeId::FLOAT => match buf.len() {
                4 => Some(Self::Float(f32::from_le_bytes([
                    buf[0], buf[1], buf[2], buf[3],
                ]))),
                8 => {
                    let mut bytes = [0u8; 8];
                    bytes.copy_from_slice(buf);
                    Some(Self::Double(f64::from_le_bytes(bytes)))
                }
                _ => None,
            },
            TypeId::STRING => {
                let end = buf.iter().position(|&b| b == 0).unwrap_or(buf.len());
                std::str::from_utf8(&buf[..end])
                    .ok()
                    .map(|s| Self::Str(s.to_owned()))
            }
            TypeId::BOOL => buf.first().map(|&b| Self::Bool(b != 0)),
            other => buf.first().map(|&b| Self::Enum(other, b)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_numeric_widths() {
        assert_eq!(SettingValue::Int8(-1).encode().expect("encode").len(), 1);
        assert_eq!(SettingValue::Int16(-1).encode().expect("encode").len(), 2);
        assert_eq!(SettingValue::Int32(-1).encode().expect("encode").len(), 4);
        assert_eq!(SettingValue::Float(1.0).encode().expect("encode").len(), 4);
        assert_eq!(SettingValue::Double(1.0).encode().expect("encode").len(), 8);
    }

    #[test]
    fn test_encode_decode_round_trip() {
        for value in [
            SettingValue::Int8(-128),
            SettingValue::Int16(32767),
            SettingValue::Int32(-2147483648),
            SettingValue::Float(0.5),
            SettingValue::Double(1e-12),
            SettingValue::Str("surveyed".to_owned()),
            SettingValue::Bool(true),
            SettingValue::Enum(TypeId(4), 2),
        ] {
            let buf = value.encode().expect("encode failed");
            let decoded =
                SettingValue::decode(value.type_id(), &buf).expect("decode failed");
            assert_eq!(decoded, value);
        }
    }

    #[test]
    fn test_oversize_string_rejected() {
        let value = SettingValue::Str("x".repeat(STRING_CAPACITY));
        assert!(matches!(value.encode(), Err(Error::PayloadTooLarge)));
    }
}
