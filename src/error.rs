// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Error types surfaced by the settings client.

use thiserror::Error;

use crate::iface::BusError;
use crate::types::TypeId;

/// Result type for settings operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors returned by the client API.
///
/// Daemon verdicts on writes travel as [`crate::wire::WriteResult`]
/// values, not as errors: a rejected write is a successful exchange with
/// a negative answer. `Error` covers local failures and exchanges that
/// never completed.
#[derive(Debug, Error)]
pub enum Error {
    /// A setting with the same (section, name) is already in the store.
    #[error("duplicate setting {section}.{name}")]
    DuplicateSetting { section: String, name: String },

    /// The requested type id does not resolve in the registry.
    #[error("unknown type id {0:?}")]
    UnknownType(TypeId),

    /// The value variant does not match the setting's registered type.
    #[error("value type does not match setting type")]
    TypeMismatch,

    /// A codec refused the textual value.
    #[error("value parsing failed")]
    ValueParse,

    /// A formatted payload would exceed the wire ceiling.
    #[error("payload exceeds {max} bytes", max = crate::config::MAX_PAYLOAD_LEN)]
    PayloadTooLarge,

    /// A token contained an interior NUL byte.
    #[error("token contains an embedded NUL byte")]
    EmbeddedNul,

    /// No response arrived within the retry budget.
    #[error("request timed out")]
    Timeout,

    /// The bus interface reported a failure.
    #[error("bus error: {0}")]
    Bus(#[from] BusError),
}
