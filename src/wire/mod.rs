// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Wire formats: the token payload codec and the message/status model.

pub mod message;
pub mod payload;

pub use message::{
    index_request, split_index, split_status, MessageKind, RegisterResult, WriteResult,
};
pub use payload::{format, parse, push_token, Fields, Tokens};
