// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! # buscfg - settings client for binary message buses
//!
//! A client library for the request/reply settings protocol spoken over
//! a pre-existing binary message bus. A peer on the bus - the settings
//! daemon - arbitrates named configuration parameters owned by multiple
//! independent producer processes. This crate lets a host process:
//!
//! - **own** settings: register them, answer daemon-forwarded writes,
//!   serve external reads;
//! - **watch** settings owned elsewhere, kept coherent through
//!   write-response broadcasts;
//! - **query** settings interactively: read by name, enumerate by
//!   index, write.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use buscfg::{SettingsClient, SettingValue, Result};
//! # fn main() -> Result<()> {
//! # let bus: std::sync::Arc<dyn buscfg::BusInterface> = unimplemented!();
//! let client = SettingsClient::builder(bus).sender_id(0x88).build();
//!
//! // Own a setting; the daemon may hand back a persisted value.
//! client.register_setting("uart", "baudrate", SettingValue::Int32(115_200), None)?;
//!
//! // Query a setting owned by another process.
//! let rate = client.read_int("imu", "rate")?;
//! println!("imu.rate = {rate}");
//! # Ok(())
//! # }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! +--------------------------------------------------------------+
//! |                      SettingsClient API                      |
//! |  register / watch / read / write / read_by_index / value     |
//! +--------------------------------------------------------------+
//! |  Protocol engine: perform() request/reply over async frames  |
//! |  RequestTable (prefix correlation) | CallbackTable (demux)   |
//! +--------------------------------------------------------------+
//! |  SettingStore (update/revert)  |  TypeRegistry (codecs)      |
//! +--------------------------------------------------------------+
//! |            BusInterface (provided by the host)               |
//! +--------------------------------------------------------------+
//! ```
//!
//! The bus transport, message framing and the daemon itself are out of
//! scope: the host supplies a [`BusInterface`] and the crate supplies
//! everything above it.

/// Protocol constants (payload limits, retry budgets, daemon id).
pub mod config;
/// Bus-callback dispatcher (one subscription per message kind).
pub mod dispatch;
/// Error types.
pub mod error;
/// Host-facing bus and event interfaces.
pub mod iface;
/// Pending-request correlation table.
pub mod request;
/// In-memory store of registered and watched settings.
pub mod store;
/// Type codec registry and typed values.
pub mod types;
/// Wire formats: token payloads, message kinds, status codes.
pub mod wire;

mod client;

pub use client::{IndexEntry, SettingsClient, SettingsClientBuilder};
pub use error::{Error, Result};
pub use iface::{BusError, BusInterface, CallbackId, CondvarEvent, FrameHandler, WaitEvent};
pub use store::{Mode, NotifyFn};
pub use types::{Codec, EnumCodec, SettingValue, TypeId, TypeRegistry};
pub use wire::{MessageKind, RegisterResult, WriteResult};
