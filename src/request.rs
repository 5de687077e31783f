// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Pending-request correlation table.
//!
//! Each outbound exchange registers a descriptor carrying a correlation
//! prefix cut from the request payload. Inbound handlers locate the
//! descriptor whose prefix matches the response, capture the response
//! strings on the descriptor (never on the context) and wake the waiter
//! through the descriptor's event.

use std::sync::Arc;

use parking_lot::Mutex;

use crate::config::MAX_COMPARE_LEN;
use crate::iface::WaitEvent;
use crate::wire::{MessageKind, WriteResult};

/// Mutable state of one in-flight request.
pub struct RequestState {
    /// Still waiting for its response.
    pub pending: bool,
    /// A response was correlated.
    pub matched: bool,
    /// Kind of the request that was sent.
    pub msg_id: MessageKind,
    /// Payload prefix identifying the correlated response.
    pub compare: Vec<u8>,
    pub resp_section: String,
    pub resp_name: String,
    pub resp_value: String,
    pub resp_type: String,
    /// A value token was present in the response.
    pub resp_value_valid: bool,
    /// The enumeration-done broadcast covered this request.
    pub read_by_idx_done: bool,
    /// Daemon verdict for write exchanges.
    pub status: WriteResult,
}

/// One in-flight request: state plus the event that wakes its waiter.
pub struct PendingRequest {
    id: u64,
    pub state: Mutex<RequestState>,
    pub event: Arc<dyn WaitEvent>,
}

impl PendingRequest {
    /// Whether a response was correlated; the waiter's exit condition.
    #[must_use]
    pub fn matched(&self) -> bool {
        self.state.lock().matched
    }

    /// Capture response data and wake the waiter.
    ///
    /// `expected` names the request kind this response answers; a
    /// mismatch means the prefix collided with an unrelated request, in
    /// which case nothing is captured and nobody is woken.
    pub fn signal<F>(&self, expected: MessageKind, capture: F) -> bool
    where
        F: FnOnce(&mut RequestState),
    {
        let mut state = self.state.lock();
        if state.msg_id != expected {
            log::warn!(
                "response for {:?} matched a pending {:?} request, ignoring",
                expected,
                state.msg_id
            );
            return false;
        }
        capture(&mut state);
        state.matched = true;
        state.pending = false;
        drop(state);
        self.event.signal();
        true
    }
}

/// Table of in-flight requests, owned by the context.
///
/// Depth is bounded by the number of caller threads, so correlation is a
/// linear scan.
#[derive(Default)]
pub struct RequestTable {
    requests: Vec<Arc<PendingRequest>>,
    next_id: u64,
}

impl RequestTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create and enlist a descriptor for an outbound request.
    pub fn append(
        &mut self,
        msg_id: MessageKind,
        compare: &[u8],
        event: Arc<dyn WaitEvent>,
    ) -> Arc<PendingRequest> {
        debug_assert!(compare.len() <= MAX_COMPARE_LEN);

        let request = Arc::new(PendingRequest {
            id: self.next_id,
            state: Mutex::new(RequestState {
                pending: true,
                matched: false,
                msg_id,
                compare: compare.to_vec(),
                resp_section: String::new(),
                resp_name: String::new(),
                resp_value: String::new(),
                resp_type: String::new(),
                resp_value_valid: false,
                read_by_idx_done: false,
                status: WriteResult::Timeout,
            }),
            event,
        });
        self.next_id += 1;
        self.requests.push(Arc::clone(&request));
        request
    }

    /// Unlink a descriptor after its exchange finished.
    pub fn remove(&mut self, request: &PendingRequest) {
        self.requests.retain(|entry| entry.id != request.id);
    }

    /// Find the first pending descriptor whose prefix matches `payload`.
    ///
    /// Pure lookup: matching state changes only through
    /// [`PendingRequest::signal`].
    pub fn check(&self, payload: &[u8]) -> Option<Arc<PendingRequest>> {
        self.requests
            .iter()
            .find(|request| {
                let state = request.state.lock();
                state.pending
                    && payload.len() >= state.compare.len()
                    && payload[..state.compare.len()] == state.compare[..]
            })
            .cloned()
    }

    /// All pending descriptors of one request kind.
    pub fn pending_of_kind(&self, kind: MessageKind) -> Vec<Arc<PendingRequest>> {
        self.requests
            .iter()
            .filter(|request| {
                let state = request.state.lock();
                state.pending && state.msg_id == kind
            })
            .cloned()
            .collect()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.requests.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.requests.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::iface::CondvarEvent;
    use std::time::Duration;

    fn event() -> Arc<dyn WaitEvent> {
        Arc::new(CondvarEvent::new())
    }

    #[test]
    fn test_descriptor_defaults() {
        let mut table = RequestTable::new();
        let request = table.append(MessageKind::Write, b"imu\0rate\0", event());
        let state = request.state.lock();
        assert!(state.pending);
        assert!(!state.matched);
        assert_eq!(state.status, WriteResult::Timeout);
        assert!(!state.resp_value_valid);
    }

    #[test]
    fn test_prefix_correlation_selects_one_descriptor() {
        let mut table = RequestTable::new();
        let first = table.append(MessageKind::Write, b"imu\0rate\0", event());
        let second = table.append(MessageKind::Write, b"uart\0baud\0", event());

        let matched = table
            .check(b"uart\0baud\0115200\0")
            .expect("prefix should correlate");
        assert_eq!(matched.id, second.id);
        assert!(!first.matched());
        assert!(table.check(b"uart\0parity\0none\0").is_none());
    }

    #[test]
    fn test_signal_wakes_and_captures() {
        let mut table = RequestTable::new();
        let request = table.append(MessageKind::Write, b"imu\0rate\0", event());

        assert!(request.signal(MessageKind::Write, |state| {
            state.status = WriteResult::ValueRejected;
        }));
        assert!(request.matched());
        assert_eq!(request.state.lock().status, WriteResult::ValueRejected);
        assert!(request.event.wait(Duration::from_millis(0)));
    }

    #[test]
    fn test_signal_kind_mismatch_does_not_wake() {
        let mut table = RequestTable::new();
        let request = table.append(MessageKind::Write, b"imu\0rate\0", event());

        assert!(!request.signal(MessageKind::ReadReq, |state| {
            state.resp_value = "polluted".to_owned();
        }));
        let state = request.state.lock();
        assert!(state.pending);
        assert!(!state.matched);
        assert!(state.resp_value.is_empty());
        drop(state);
        assert!(!request.event.wait(Duration::from_millis(0)));
    }

    #[test]
    fn test_matched_descriptor_stops_correlating() {
        let mut table = RequestTable::new();
        let request = table.append(MessageKind::ReadReq, b"imu\0rate\0", event());
        assert!(request.signal(MessageKind::ReadReq, |_| {}));
        assert!(table.check(b"imu\0rate\0100\0").is_none());
    }

    #[test]
    fn test_remove_unlinks() {
        let mut table = RequestTable::new();
        let request = table.append(MessageKind::ReadReq, b"imu\0rate\0", event());
        assert_eq!(table.len(), 1);
        table.remove(&request);
        assert!(table.is_empty());
        assert!(table.check(b"imu\0rate\0100\0").is_none());
    }

    #[test]
    fn test_pending_of_kind_filters() {
        let mut table = RequestTable::new();
        let index_req = table.append(MessageKind::ReadByIndexReq, &[0, 0], event());
        table.append(MessageKind::Write, b"imu\0rate\0", event());

        let pending = table.pending_of_kind(MessageKind::ReadByIndexReq);
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].id, index_req.id);
    }
}
