// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Inbound frame handlers.
//!
//! One handler per subscribed message kind, installed through the
//! dispatcher with a weak back-reference to the context. Handlers run on
//! the bus delivery thread: they correlate responses, capture response
//! strings on the matching descriptor, keep owned settings and watches
//! coherent, and never block beyond brief list mutation.

use std::sync::Weak;

use crate::config::{DAEMON_SENDER_ID, MAX_PAYLOAD_LEN, MAX_WRITE_LEN};
use crate::iface::FrameHandler;
use crate::store::{Mode, Setting};
use crate::types::TypeRegistry;
use crate::wire::{self, MessageKind, RegisterResult, Tokens, WriteResult};

use super::ClientInner;

/// Which settings an inbound update applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum UpdateScope {
    /// Daemon-forwarded write: owned settings only. Watches react to
    /// the write-response broadcast instead, avoiding double updates.
    OwnedOnly,
    /// Registration response: apply the daemon's returned value, but
    /// readonly settings keep their locally initialized value.
    SkipReadonly,
    /// Write-response broadcast: local mirrors only.
    WatchesOnly,
}

impl UpdateScope {
    fn applies(self, mode: Mode) -> bool {
        match self {
            Self::OwnedOnly => mode != Mode::Watch,
            Self::SkipReadonly => mode != Mode::OwnedRo,
            Self::WatchesOnly => mode == Mode::Watch,
        }
    }
}

/// Build the dispatcher callback for `kind`.
///
/// The closure holds only a weak context reference; frames delivered
/// during teardown are dropped.
pub(super) fn make_handler(ctx: Weak<ClientInner>, kind: MessageKind) -> FrameHandler {
    Box::new(move |sender_id, payload| {
        let Some(ctx) = ctx.upgrade() else {
            return;
        };
        match kind {
            MessageKind::RegisterResp => on_register_resp(&ctx, sender_id, payload),
            MessageKind::Write => on_write(&ctx, sender_id, payload),
            MessageKind::WriteResp => on_write_resp(&ctx, payload),
            MessageKind::ReadResp => on_read_resp(&ctx, payload),
            MessageKind::ReadByIndexResp => on_read_by_index_resp(&ctx, payload),
            MessageKind::ReadByIndexDone => on_read_by_index_done(&ctx),
            other => log::error!("no inbound handler for {other:?}"),
        }
    })
}

/// Registration response: apply the daemon's returned value and release
/// the pending register request.
fn on_register_resp(ctx: &ClientInner, sender_id: u16, payload: &[u8]) {
    if sender_id != DAEMON_SENDER_ID {
        log::warn!("invalid sender {sender_id:#06x} != {DAEMON_SENDER_ID:#06x}");
        return;
    }

    let Some((status, setting_payload)) = wire::split_status(payload) else {
        log::warn!("register response without status byte");
        return;
    };

    match RegisterResult::from_wire(status) {
        // The request was corrupted in transit; stay pending so the
        // retry loop resends it.
        Some(RegisterResult::ParseFailed) => return,
        Some(_) => {}
        None => {
            log::error!("invalid registration status {status}");
            return;
        }
    }

    let request = ctx.requests.lock().check(setting_payload);
    let Some(request) = request else {
        // No pending registration with this identity; most likely the
        // response was meant for another client registering in
        // parallel.
        return;
    };

    apply_update(ctx, setting_payload, UpdateScope::SkipReadonly);
    request.signal(MessageKind::Register, |_| {});
}

/// Daemon-forwarded write request for a setting this client owns.
fn on_write(ctx: &ClientInner, sender_id: u16, payload: &[u8]) {
    if sender_id != DAEMON_SENDER_ID {
        log::warn!("invalid sender {sender_id:#06x} != {DAEMON_SENDER_ID:#06x}");
        return;
    }

    apply_update(ctx, payload, UpdateScope::OwnedOnly);
}

/// Write-response broadcast: sync watches, then release the pending
/// write request with the daemon's verdict.
fn on_write_resp(ctx: &ClientInner, payload: &[u8]) {
    let Some((status_byte, setting_payload)) = wire::split_status(payload) else {
        log::warn!("write response without status byte");
        return;
    };
    let Some(status) = WriteResult::from_wire(status_byte) else {
        log::warn!("invalid write response status {status_byte}");
        return;
    };

    if status == WriteResult::Ok {
        // The owner already applied the value when it answered the
        // write; only mirrors need to follow.
        apply_update(ctx, setting_payload, UpdateScope::WatchesOnly);
    }

    let request = ctx.requests.lock().check(setting_payload);
    if let Some(request) = request {
        request.signal(MessageKind::Write, |state| state.status = status);
    }
}

/// Read response: capture value and type on the descriptor, then drive
/// any matching local watch.
fn on_read_resp(ctx: &ClientInner, payload: &[u8]) {
    let request = ctx.requests.lock().check(payload);
    let Some(request) = request else {
        return;
    };

    let (tokens, fields) = wire::parse(payload);

    request.signal(MessageKind::ReadReq, |state| {
        state.resp_value_valid = false;
        state.resp_value.clear();
        state.resp_type.clear();

        if tokens >= Tokens::Value {
            if let Some(value) = fields.value {
                state.resp_value.push_str(value);
                state.resp_value_valid = true;
            }
            if let Some(tag) = fields.type_tag {
                state.resp_type.push_str(tag);
            }
        } else if tokens == Tokens::Name {
            log::debug!(
                "setting {}.{} not found",
                fields.section.unwrap_or(""),
                fields.name.unwrap_or("")
            );
        } else {
            log::warn!("read response parsing failed");
        }
    });

    if tokens >= Tokens::Value {
        apply_update(ctx, payload, UpdateScope::WatchesOnly);
    }
}

/// One entry of the index enumeration, keyed by the 2-byte index.
fn on_read_by_index_resp(ctx: &ClientInner, payload: &[u8]) {
    let Some((_, setting_payload)) = wire::split_index(payload) else {
        log::warn!("read by index response shorter than its index");
        return;
    };

    let request = ctx.requests.lock().check(payload);
    let Some(request) = request else {
        return;
    };

    let (tokens, fields) = wire::parse(setting_payload);

    request.signal(MessageKind::ReadByIndexReq, |state| {
        state.resp_value_valid = false;
        state.resp_section.clear();
        state.resp_name.clear();
        state.resp_value.clear();
        state.resp_type.clear();

        if tokens >= Tokens::Section {
            if let Some(section) = fields.section {
                state.resp_section.push_str(section);
            }
            if let Some(name) = fields.name {
                state.resp_name.push_str(name);
            }
            if let Some(value) = fields.value {
                state.resp_value.push_str(value);
                state.resp_value_valid = true;
            }
            if let Some(tag) = fields.type_tag {
                state.resp_type.push_str(tag);
            }
        }
    });
}

/// End of the index enumeration: one broadcast releases every in-flight
/// iterator.
fn on_read_by_index_done(ctx: &ClientInner) {
    let pending = ctx
        .requests
        .lock()
        .pending_of_kind(MessageKind::ReadByIndexReq);
    for request in pending {
        request.signal(MessageKind::ReadByIndexReq, |state| {
            state.read_by_idx_done = true;
        });
    }
}

/// Shared inbound update path.
///
/// Parses the token payload, locates the target setting, enforces the
/// uniform write-length ceiling, applies the update with revert
/// semantics, and answers with a write-response when an owned setting
/// was addressed by a write.
fn apply_update(ctx: &ClientInner, payload: &[u8], scope: UpdateScope) {
    let (tokens, fields) = wire::parse(payload);
    if tokens == Tokens::ExtraNull {
        log::debug!("setting payload carries legacy extra terminator");
    }
    if tokens < Tokens::Value {
        log::warn!("setting update skipped, error parsing payload");
        return;
    }
    let (Some(section), Some(name), Some(value)) = (fields.section, fields.name, fields.value)
    else {
        return;
    };

    let registry = ctx.registry.lock();
    let mut store = ctx.store.lock();
    let Some(setting) = store.lookup_mut(section, name) else {
        // Not ours; the daemon owns the setting-rejected verdict.
        return;
    };
    if !scope.applies(setting.mode()) {
        return;
    }
    // Only a daemon-forwarded write is answered; broadcast and
    // registration updates are silent.
    let respond = scope == UpdateScope::OwnedOnly;

    if payload.len() > MAX_WRITE_LEN {
        log::warn!(
            "setting update rejected, length:{} limit:{}",
            payload.len(),
            MAX_WRITE_LEN
        );
        if respond {
            send_write_response(ctx, &registry, setting, WriteResult::ValueRejected);
        }
        return;
    }

    let Some(codec) = registry.lookup(setting.type_id()) else {
        log::error!("no codec for {section}.{name}");
        return;
    };

    let result = setting.update_value(codec.as_ref(), value);
    if result != WriteResult::Ok && scope == UpdateScope::WatchesOnly {
        log::warn!("watch {section}.{name} failed to apply broadcast value: {result:?}");
    }

    if respond {
        send_write_response(ctx, &registry, setting, result);
    }
}

/// Answer a daemon-forwarded write with the verdict and the setting's
/// current identity.
fn send_write_response(
    ctx: &ClientInner,
    registry: &TypeRegistry,
    setting: &Setting,
    status: WriteResult,
) {
    let Some(codec) = registry.lookup(setting.type_id()) else {
        log::error!(
            "no codec for {}.{} write response",
            setting.section(),
            setting.name()
        );
        return;
    };

    let formatted = match setting.format_payload(codec.as_ref(), false) {
        Ok((payload, _)) => payload,
        Err(err) => {
            log::error!("formatting settings write response failed: {err}");
            return;
        }
    };

    if formatted.len() + 1 > MAX_PAYLOAD_LEN {
        log::error!("settings write response does not fit a frame");
        return;
    }

    let mut response = Vec::with_capacity(formatted.len() + 1);
    response.push(status.to_wire());
    response.extend_from_slice(&formatted);

    if let Err(err) = ctx.iface.send(MessageKind::WriteResp, &response) {
        log::error!("sending settings write response failed: {err}");
    }
}
