// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Protocol constants - single source of truth.
//!
//! This module centralizes the wire limits and retry budgets the client
//! shares with the settings daemon. **NEVER hardcode these elsewhere!**

use std::time::Duration;

/// Maximum length of a single settings payload in bytes.
///
/// Every token payload (section, name, value, type plus terminators) must
/// fit in one bus frame of this size.
pub const MAX_PAYLOAD_LEN: usize = 255;

/// Maximum length of an inbound write payload in bytes.
///
/// Values longer than this cannot be echoed back through a read-by-index
/// response (2-byte index prefix + terminator), so the client rejects the
/// write up front instead of storing a value the daemon cannot serve.
pub const MAX_WRITE_LEN: usize = 252;

/// Upper bound on the correlation prefix recorded per request.
///
/// Equal to the payload ceiling; a prefix can never exceed the message it
/// was cut from.
pub const MAX_COMPARE_LEN: usize = MAX_PAYLOAD_LEN;

/// Significant digits used when rendering floating point values to text.
///
/// The precision is part of the wire contract: the daemon stores the
/// textual form, and round-trips are only lossless at this precision.
pub const FLOAT_PRECISION: usize = 12;

/// Timeout for one attempt of a register or write exchange.
pub const REGISTER_TIMEOUT: Duration = Duration::from_millis(500);

/// Number of attempts for a register or write exchange.
pub const REGISTER_TRIES: u8 = 5;

/// Timeout for one attempt of a watch-priming or interactive read.
pub const WATCH_INIT_TIMEOUT: Duration = Duration::from_millis(500);

/// Number of attempts for a watch-priming or interactive read.
pub const WATCH_INIT_TRIES: u8 = 5;

/// Well-known sender id of the settings daemon.
///
/// Requests are addressed to this id and protocol responses from any
/// other sender are ignored.
pub const DAEMON_SENDER_ID: u16 = 0x42;

/// Buffer capacity owned by string settings.
///
/// Replaces the caller-supplied buffer length of pointer-based APIs: a
/// registered string setting can always hold the largest value the wire
/// can carry.
pub const STRING_CAPACITY: usize = MAX_PAYLOAD_LEN;
