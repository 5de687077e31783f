// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Signed integer codec (1, 2 or 4 bytes, little-endian buffers).

use super::Codec;

pub struct IntCodec;

impl Codec for IntCodec {
    fn to_text(&self, buf: &[u8]) -> Option<String> {
        match buf.len() {
            // Widen to 16 bits: the textual form of an 8-bit value is
            // identical and the daemon never sees the storage width.
            1 => Some(i16::from(buf[0] as i8).to_string()),
            2 => Some(i16::from_le_bytes([buf[0], buf[1]]).to_string()),
            4 => Some(i32::from_le_bytes([buf[0], buf[1], buf[2], buf[3]]).to_string()),
            _ => None,
        }
    }

    fn from_text(&self, text: &str, buf: &mut [u8]) -> bool {
        match buf.len() {
            1 => match text.parse::<i8>() {
                Ok(value) => {
                    buf[0] = value as u8;
                    true
                }
                Err(_) => false,
            },
            2 => match text.parse::<i16>() {
                Ok(value) => {
                    buf.copy_from_slice(&value.to_le_bytes());
                    true
                }
                Err(_) => false,
            },
            4 => match text.parse::<i32>() {
                Ok(value) => {
                    buf.copy_from_slice(&value.to_le_bytes());
                    true
                }
                Err(_) => false,
            },
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_int8_bounds() {
        let codec = IntCodec;
        let mut buf = [0u8; 1];
        assert!(codec.from_text("-128", &mut buf));
        assert_eq!(codec.to_text(&buf).as_deref(), Some("-128"));
        assert!(codec.from_text("127", &mut buf));
        assert_eq!(buf[0] as i8, 127);
        assert!(!codec.from_text("128", &mut buf));
    }

    #[test]
    fn test_int16_bounds() {
        let codec = IntCodec;
        let mut buf = [0u8; 2];
        assert!(codec.from_text("-32768", &mut buf));
        assert_eq!(codec.to_text(&buf).as_deref(), Some("-32768"));
        assert!(codec.from_text("32767", &mut buf));
        assert_eq!(codec.to_text(&buf).as_deref(), Some("32767"));
    }

    #[test]
    fn test_int32_bounds() {
        let codec = IntCodec;
        let mut buf = [0u8; 4];
        assert!(codec.from_text("-2147483648", &mut buf));
        assert_eq!(codec.to_text(&buf).as_deref(), Some("-2147483648"));
        assert!(codec.from_text("2147483647", &mut buf));
        assert_eq!(codec.to_text(&buf).as_deref(), Some("2147483647"));
    }

    #[test]
    fn test_rejects_garbage_and_odd_widths() {
        let codec = IntCodec;
        let mut buf = [0u8; 2];
        assert!(!codec.from_text("12abc", &mut buf));
        assert!(!codec.from_text("", &mut buf));
        let mut odd = [0u8; 3];
        assert!(!codec.from_text("1", &mut odd));
        assert_eq!(codec.to_text(&odd), None);
    }
}
