// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Enum codec: a 1-byte index into an owned name list.

use super::Codec;

/// Wire tag prefix announcing an enumerated type.
pub const ENUM_TAG: &str = "enum:";

pub struct EnumCodec {
    names: Vec<String>,
}

impl EnumCodec {
    pub fn new(names: &[&str]) -> Self {
        Self {
            names: names.iter().map(|&n| n.to_owned()).collect(),
        }
    }

    #[must_use]
    pub fn names(&self) -> &[String] {
        &self.names
    }
}

impl Codec for EnumCodec {
    fn to_text(&self, buf: &[u8]) -> Option<String> {
        if buf.len() != 1 {
            return None;
        }
        self.names.get(usize::from(buf[0])).cloned()
    }

    fn from_text(&self, text: &str, buf: &mut [u8]) -> bool {
        if buf.len() != 1 {
            return false;
        }
        match self.names.iter().position(|name| name == text) {
            Some(index) => {
                buf[0] = index as u8;
                true
            }
            None => false,
        }
    }

    fn describe_type(&self) -> Option<String> {
        Some(format!("{ENUM_TAG}{}", self.names.join(",")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exact_name_match() {
        let codec = EnumCodec::new(&["Test1", "Test2"]);
        let mut buf = [0u8];
        assert!(codec.from_text("Test2", &mut buf));
        assert_eq!(buf[0], 1);
        assert!(!codec.from_text("test2", &mut buf));
        assert!(!codec.from_text("Test", &mut buf));
    }

    #[test]
    fn test_index_to_name() {
        let codec = EnumCodec::new(&["Test1", "Test2"]);
        assert_eq!(codec.to_text(&[0]).as_deref(), Some("Test1"));
        assert_eq!(codec.to_text(&[1]).as_deref(), Some("Test2"));
        assert_eq!(codec.to_text(&[2]), None);
    }

    #[test]
    fn test_describe_type_has_no_trailing_comma() {
        let codec = EnumCodec::new(&["Test1", "Test2"]);
        assert_eq!(codec.describe_type().as_deref(), Some("enum:Test1,Test2"));
        let single = EnumCodec::new(&["Only"]);
        assert_eq!(single.describe_type().as_deref(), Some("enum:Only"));
    }
}
