// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Host-facing bus interface.
//!
//! The client never touches a socket: the embedding process hands it a
//! [`BusInterface`] implementation that can send frames, subscribe
//! per-kind inbound callbacks and nothing else. Waiting is done through
//! [`WaitEvent`] objects; [`CondvarEvent`] is the default implementation
//! used when the caller does not bring its own.

use std::time::Duration;

use parking_lot::{Condvar, Mutex};
use thiserror::Error;

use crate::wire::MessageKind;

/// Inbound frame callback: `(sender_id, payload)`.
pub type FrameHandler = Box<dyn Fn(u16, &[u8]) + Send + Sync>;

/// Opaque handle for an installed bus callback.
///
/// The bus assigns the value; the client only stores it and hands it
/// back on unregistration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CallbackId(pub u64);

/// Errors reported by the host bus.
#[derive(Debug, Error)]
pub enum BusError {
    /// The frame could not be queued for transmission.
    #[error("send failed: {0}")]
    SendFailed(String),

    /// The bus refused the callback registration.
    #[error("callback registration failed for {0:?}")]
    RegisterFailed(MessageKind),

    /// The callback handle was unknown to the bus.
    #[error("callback handle {0:?} not registered")]
    UnknownCallback(CallbackId),
}

/// Capability record the host provides to reach the bus.
///
/// Implementations must be callable from any thread. Inbound handlers
/// installed through `register_cb` are invoked on the bus's delivery
/// thread in frame order; they must not be invoked after `unregister_cb`
/// returned for their handle.
pub trait BusInterface: Send + Sync {
    /// Send a frame with the bus's default sender id.
    fn send(&self, kind: MessageKind, payload: &[u8]) -> Result<(), BusError>;

    /// Send a frame with an explicit sender id.
    fn send_from(&self, kind: MessageKind, payload: &[u8], sender_id: u16)
        -> Result<(), BusError>;

    /// Install `handler` for inbound frames of `kind`.
    fn register_cb(&self, kind: MessageKind, handler: FrameHandler)
        -> Result<CallbackId, BusError>;

    /// Remove a previously installed handler.
    fn unregister_cb(&self, id: CallbackId) -> Result<(), BusError>;
}

/// Waitable event used to block a request until its response arrives.
///
/// One event backs every in-flight request: the context's shared event
/// in single-threaded use, or a caller-supplied per-request event when
/// multiple requests run in parallel.
pub trait WaitEvent: Send + Sync {
    /// Block until signaled or `timeout` elapses. Returns `true` when
    /// the event was signaled.
    fn wait(&self, timeout: Duration) -> bool;

    /// Wake the waiter. Signaling with no waiter present is remembered
    /// until the next `wait`.
    fn signal(&self);
}

/// Auto-reset event built on a parking_lot mutex + condvar.
#[derive(Default)]
pub struct CondvarEvent {
    signaled: Mutex<bool>,
    condvar: Condvar,
}

impl CondvarEvent {
    pub fn new() -> Self {
        Self::default()
    }
}

impl WaitEvent for CondvarEvent {
    fn wait(&self, timeout: Duration) -> bool {
        let mut signaled = self.signaled.lock();
        if !*signaled {
            self.condvar.wait_for(&mut signaled, timeout);
        }
        std::mem::take(&mut *signaled)
    }

    fn signal(&self) {
        let mut signaled = self.signaled.lock();
        *signaled = true;
        self.condvar.notify_all();
    }
}
