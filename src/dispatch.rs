// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Bus-callback dispatcher.
//!
//! Tracks one bus-side subscription per inbound message kind. Features
//! request the kinds they need; installation is idempotent, so exactly
//! one bus handle exists per kind while anything needs it. The table
//! owns the handles; callers only ever name the kind.

use std::collections::HashMap;

use crate::iface::{BusError, BusInterface, CallbackId, FrameHandler};
use crate::wire::MessageKind;

/// Result of an [`CallbackTable::ensure`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InstallOutcome {
    /// A new bus-side subscription was created.
    Installed,
    /// The kind was already subscribed; nothing was done.
    AlreadyInstalled,
}

/// Result of a [`CallbackTable::remove`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemoveOutcome {
    Removed,
    NotInstalled,
}

/// Kind-keyed table of installed bus callbacks.
#[derive(Default)]
pub struct CallbackTable {
    entries: HashMap<MessageKind, CallbackId>,
}

impl CallbackTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Subscribe `kind` if it is not subscribed yet.
    pub fn ensure(
        &mut self,
        iface: &dyn BusInterface,
        kind: MessageKind,
        handler: FrameHandler,
    ) -> Result<InstallOutcome, BusError> {
        if self.entries.contains_key(&kind) {
            return Ok(InstallOutcome::AlreadyInstalled);
        }
        let id = iface.register_cb(kind, handler)?;
        self.entries.insert(kind, id);
        Ok(InstallOutcome::Installed)
    }

    /// Drop the subscription for `kind`, if any.
    pub fn remove(
        &mut self,
        iface: &dyn BusInterface,
        kind: MessageKind,
    ) -> Result<RemoveOutcome, BusError> {
        match self.entries.remove(&kind) {
            Some(id) => {
                iface.unregister_cb(id)?;
                Ok(RemoveOutcome::Removed)
            }
            None => Ok(RemoveOutcome::NotInstalled),
        }
    }

    /// Drop every subscription; context teardown.
    pub fn clear(&mut self, iface: &dyn BusInterface) {
        for (kind, id) in self.entries.drain() {
            if let Err(err) = iface.unregister_cb(id) {
                log::error!("unregistering callback for {kind:?} failed: {err}");
            }
        }
    }

    #[must_use]
    pub fn contains(&self, kind: MessageKind) -> bool {
        self.entries.contains_key(&kind)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;

    /// Counting stand-in for the host bus.
    #[derive(Default)]
    struct FakeBus {
        registered: Mutex<Vec<(u64, MessageKind)>>,
        next_id: Mutex<u64>,
    }

    impl BusInterface for FakeBus {
        fn send(&self, _kind: MessageKind, _payload: &[u8]) -> Result<(), BusError> {
            Ok(())
        }

        fn send_from(
            &self,
            _kind: MessageKind,
            _payload: &[u8],
            _sender_id: u16,
        ) -> Result<(), BusError> {
            Ok(())
        }

        fn register_cb(
            &self,
            kind: MessageKind,
            _handler: FrameHandler,
        ) -> Result<CallbackId, BusError> {
            let mut next = self.next_id.lock();
            *next += 1;
            self.registered.lock().push((*next, kind));
            Ok(CallbackId(*next))
        }

        fn unregister_cb(&self, id: CallbackId) -> Result<(), BusError> {
            self.registered.lock().retain(|(node, _)| *node != id.0);
            Ok(())
        }
    }

    fn noop() -> FrameHandler {
        Box::new(|_, _| {})
    }

    #[test]
    fn test_ensure_is_idempotent() {
        let bus = FakeBus::default();
        let mut table = CallbackTable::new();

        let first = table
            .ensure(&bus, MessageKind::RegisterResp, noop())
            .expect("install failed");
        let second = table
            .ensure(&bus, MessageKind::RegisterResp, noop())
            .expect("install failed");

        assert_eq!(first, InstallOutcome::Installed);
        assert_eq!(second, InstallOutcome::AlreadyInstalled);
        assert_eq!(bus.registered.lock().len(), 1);
    }

    #[test]
    fn test_unregister_leaves_other_kinds() {
        let bus = FakeBus::default();
        let mut table = CallbackTable::new();

        table
            .ensure(&bus, MessageKind::RegisterResp, noop())
            .expect("install failed");
        table
            .ensure(&bus, MessageKind::Write, noop())
            .expect("install failed");

        let outcome = table
            .remove(&bus, MessageKind::RegisterResp)
            .expect("remove failed");
        assert_eq!(outcome, RemoveOutcome::Removed);
        assert_eq!(table.len(), 1);
        assert!(table.contains(MessageKind::Write));

        let outcome = table
            .remove(&bus, MessageKind::RegisterResp)
            .expect("remove failed");
        assert_eq!(outcome, RemoveOutcome::NotInstalled);
    }

    #[test]
    fn test_clear_drops_everything() {
        let bus = FakeBus::default();
        let mut table = CallbackTable::new();
        table
            .ensure(&bus, MessageKind::Write, noop())
            .expect("install failed");
        table
            .ensure(&bus, MessageKind::WriteResp, noop())
            .expect("install failed");

        table.clear(&bus);
        assert!(table.is_empty());
    }
}
