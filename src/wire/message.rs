// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Wire message kinds and status codes.
//!
//! Numeric message ids are assigned by the bus layer; the client keys
//! everything on [`MessageKind`]. Status bytes are part of the framed
//! response layouts and round-trip through [`WriteResult`] and
//! [`RegisterResult`].

/// The settings exchanges carried over the bus.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MessageKind {
    /// Owner announces a setting with its default value.
    Register,
    /// Daemon's answer to a registration.
    RegisterResp,
    /// Daemon forwards a write to the owning client.
    Write,
    /// Owner's (broadcast) verdict on a write.
    WriteResp,
    /// Interactive read by (section, name).
    ReadReq,
    /// Daemon's answer to a read.
    ReadResp,
    /// Interactive read by daemon-assigned index.
    ReadByIndexReq,
    /// One entry of the index enumeration.
    ReadByIndexResp,
    /// End of the index enumeration.
    ReadByIndexDone,
}

/// Outcome of a write exchange; the leading byte of a write-response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum WriteResult {
    /// Setting written.
    Ok = 0,
    /// Codec or notify predicate rejected the value.
    ValueRejected = 1,
    /// No such (section, name).
    SettingRejected = 2,
    /// Value text could not be parsed.
    ParseFailed = 3,
    /// Setting is read only.
    ReadOnly = 4,
    /// Setting is temporarily not modifiable.
    ModifyDisabled = 5,
    /// Daemon-side failure while applying the write.
    ServiceFailed = 6,
    /// No response within the retry budget.
    Timeout = 7,
}

impl WriteResult {
    /// Decode the wire status byte.
    pub fn from_wire(byte: u8) -> Option<Self> {
        Some(match byte {
            0 => Self::Ok,
            1 => Self::ValueRejected,
            2 => Self::SettingRejected,
            3 => Self::ParseFailed,
            4 => Self::ReadOnly,
            5 => Self::ModifyDisabled,
            6 => Self::ServiceFailed,
            7 => Self::Timeout,
            _ => return None,
        })
    }

    #[inline]
    pub fn to_wire(self) -> u8 {
        self as u8
    }
}

/// Outcome of a registration; the leading byte of a register-response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum RegisterResult {
    /// Registered, requested default value in use.
    Accepted = 0,
    /// Registered, a persisted value was found and returned.
    Persisted = 1,
    /// Already registered, value from memory returned.
    Registered = 2,
    /// Daemon could not parse the registration payload.
    ParseFailed = 3,
}

impl RegisterResult {
    /// Decode the wire status byte.
    pub fn from_wire(byte: u8) -> Option<Self> {
        Some(match byte {
            0 => Self::Accepted,
            1 => Self::Persisted,
            2 => Self::Registered,
            3 => Self::ParseFailed,
            _ => return None,
        })
    }

    #[inline]
    pub fn to_wire(self) -> u8 {
        self as u8
    }
}

/// Split a status-framed response (`status byte + token payload`).
pub fn split_status(payload: &[u8]) -> Option<(u8, &[u8])> {
    let (&status, rest) = payload.split_first()?;
    Some((status, rest))
}

/// Split a read-by-index response (`u16 LE index + token payload`).
pub fn split_index(payload: &[u8]) -> Option<(u16, &[u8])> {
    if payload.len() < 2 {
        return None;
    }
    let index = u16::from_le_bytes([payload[0], payload[1]]);
    Some((index, &payload[2..]))
}

/// Encode a read-by-index request payload.
#[inline]
pub fn index_request(index: u16) -> [u8; 2] {
    index.to_le_bytes()
}
