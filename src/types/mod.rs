// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Type codec registry.
//!
//! Every setting value crosses the wire as text; codecs convert between
//! the textual form and the fixed-width byte buffer a setting owns. The
//! registry is an ordered list: a codec's [`TypeId`] is its insertion
//! index, and the four built-ins occupy ids 0..=3 in a fixed order so
//! that clients and daemon agree without negotiation.

mod enums;
mod float;
mod int;
mod string;
mod value;

pub use enums::{EnumCodec, ENUM_TAG};
pub use float::FloatCodec;
pub use int::IntCodec;
pub use string::StrCodec;
pub use value::SettingValue;

use std::sync::Arc;

/// Handle for a registered codec.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TypeId(pub usize);

impl TypeId {
    /// Signed integer, 1/2/4 bytes.
    pub const INT: TypeId = TypeId(0);
    /// Floating point, 4/8 bytes.
    pub const FLOAT: TypeId = TypeId(1);
    /// NUL-terminated string.
    pub const STRING: TypeId = TypeId(2);
    /// Boolean, an enum over {"False", "True"}.
    pub const BOOL: TypeId = TypeId(3);
}

/// Value codec: opaque bytes to wire text and back.
pub trait Codec: Send + Sync {
    /// Render the buffer as wire text. `None` when the buffer width is
    /// not one this codec accepts.
    fn to_text(&self, buf: &[u8]) -> Option<String>;

    /// Parse wire text into the buffer. Returns `false` without
    /// modifying `buf` beyond recognition when the text is rejected.
    fn from_text(&self, text: &str, buf: &mut [u8]) -> bool;

    /// Wire tag describing the type (`"enum:a,b"` for enums). Built-in
    /// scalar codecs carry no tag.
    fn describe_type(&self) -> Option<String> {
        None
    }
}

/// Ordered codec list; ids are insertion indexes.
pub struct TypeRegistry {
    codecs: Vec<Arc<dyn Codec>>,
}

impl TypeRegistry {
    /// Registry with the built-in codecs in their contractual order.
    pub fn with_builtins() -> Self {
        let mut registry = Self { codecs: Vec::new() };
        let int = registry.register(Arc::new(IntCodec));
        debug_assert_eq!(int, TypeId::INT);
        let float = registry.register(Arc::new(FloatCodec));
        debug_assert_eq!(float, TypeId::FLOAT);
        let string = registry.register(Arc::new(StrCodec));
        debug_assert_eq!(string, TypeId::STRING);
        let boolean = registry.register(Arc::new(EnumCodec::new(&["False", "True"])));
        debug_assert_eq!(boolean, TypeId::BOOL);
        registry
    }

    /// Append a codec; the returned id equals the pre-insertion length.
    pub fn register(&mut self, codec: Arc<dyn Codec>) -> TypeId {
        let id = TypeId(self.codecs.len());
        self.codecs.push(codec);
        id
    }

    /// Register a user enum over `names`.
    pub fn register_enum(&mut self, names: &[&str]) -> TypeId {
        self.register(Arc::new(EnumCodec::new(names)))
    }

    /// Look up a codec by id.
    pub fn lookup(&self, id: TypeId) -> Option<&Arc<dyn Codec>> {
        self.codecs.get(id.0)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.codecs.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.codecs.is_empty()
    }
}
