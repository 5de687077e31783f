// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Settings client context and public API.
//!
//! The client turns the asynchronous bus into a synchronous settings
//! API. Outbound operations format a token payload, enlist a request
//! descriptor keyed by a payload prefix, send, and block on the
//! descriptor's event; inbound frames arrive on the bus thread and are
//! demultiplexed by the per-kind handlers.
//!
//! # Example
//!
//! ```rust,no_run
//! use buscfg::{SettingsClient, SettingValue};
//! # fn example(bus: std::sync::Arc<dyn buscfg::BusInterface>) -> buscfg::Result<()> {
//! let client = SettingsClient::builder(bus).sender_id(0x88).build();
//!
//! client.register_setting(
//!     "uart",
//!     "baudrate",
//!     SettingValue::Int32(115_200),
//!     None,
//! )?;
//!
//! let status = client.write_int("uart", "baudrate", 921_600)?;
//! println!("daemon said {status:?}");
//! # Ok(())
//! # }
//! ```

mod handlers;

use std::sync::Arc;

use parking_lot::Mutex;

use crate::config::{
    DAEMON_SENDER_ID, REGISTER_TIMEOUT, REGISTER_TRIES, WATCH_INIT_TIMEOUT, WATCH_INIT_TRIES,
};
use crate::dispatch::CallbackTable;
use crate::error::{Error, Result};
use crate::iface::{BusInterface, CondvarEvent, WaitEvent};
use crate::request::{PendingRequest, RequestTable};
use crate::store::{Mode, NotifyFn, Setting, SettingStore};
use crate::types::{SettingValue, TypeId, TypeRegistry, ENUM_TAG};
use crate::wire::{self, MessageKind, WriteResult};

use std::time::Duration;

/// One entry of the daemon's read-by-index enumeration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexEntry {
    pub section: String,
    pub name: String,
    pub value: String,
    pub type_tag: String,
}

/// Builder for [`SettingsClient`].
pub struct SettingsClientBuilder {
    iface: Arc<dyn BusInterface>,
    sender_id: u16,
}

impl SettingsClientBuilder {
    /// Sender id used for registrations (defaults to 0).
    #[must_use]
    pub fn sender_id(mut self, sender_id: u16) -> Self {
        self.sender_id = sender_id;
        self
    }

    pub fn build(self) -> SettingsClient {
        log::info!("building settings client (sender {:#06x})", self.sender_id);
        SettingsClient {
            inner: Arc::new(ClientInner {
                iface: self.iface,
                sender_id: self.sender_id,
                registry: Mutex::new(TypeRegistry::with_builtins()),
                store: Mutex::new(SettingStore::new()),
                requests: Mutex::new(RequestTable::new()),
                callbacks: Mutex::new(CallbackTable::new()),
                shared_event: Arc::new(CondvarEvent::new()),
            }),
        }
    }
}

/// Settings client context.
///
/// Owns the codec registry, the setting store, the pending-request
/// table and the dispatcher subscriptions. All methods are callable
/// from any thread; pass a per-call [`WaitEvent`] to the write/read
/// operations to keep several requests in flight concurrently.
pub struct SettingsClient {
    inner: Arc<ClientInner>,
}

pub(crate) struct ClientInner {
    pub(crate) iface: Arc<dyn BusInterface>,
    sender_id: u16,
    pub(crate) registry: Mutex<TypeRegistry>,
    pub(crate) store: Mutex<SettingStore>,
    pub(crate) requests: Mutex<RequestTable>,
    pub(crate) callbacks: Mutex<CallbackTable>,
    shared_event: Arc<CondvarEvent>,
}

impl SettingsClient {
    pub fn builder(iface: Arc<dyn BusInterface>) -> SettingsClientBuilder {
        SettingsClientBuilder {
            iface,
            sender_id: 0,
        }
    }

    /// Register a user enum type over `names`.
    pub fn register_enum(&self, names: &[&str]) -> TypeId {
        self.inner.registry.lock().register_enum(names)
    }

    /// Register an owned read-write setting and announce it to the
    /// daemon with `initial` as the default value.
    ///
    /// The notify predicate runs after every tentative update, including
    /// the one performed during initial registration when the daemon
    /// returns a persisted value.
    pub fn register_setting(
        &self,
        section: &str,
        name: &str,
        initial: SettingValue,
        notify: Option<NotifyFn>,
    ) -> Result<()> {
        ClientInner::add_setting(&self.inner, section, name, initial, Mode::OwnedRw, notify)
    }

    /// Register an owned read-only setting.
    pub fn register_readonly(
        &self,
        section: &str,
        name: &str,
        initial: SettingValue,
    ) -> Result<()> {
        ClientInner::add_setting(&self.inner, section, name, initial, Mode::OwnedRo, None)
    }

    /// Watch a setting owned elsewhere.
    ///
    /// The initial value is primed with a read; if the setting is not
    /// registered anywhere yet the watch stays valid and a later
    /// write-response broadcast populates it.
    pub fn register_watch(
        &self,
        section: &str,
        name: &str,
        initial: SettingValue,
        notify: Option<NotifyFn>,
    ) -> Result<()> {
        ClientInner::add_setting(&self.inner, section, name, initial, Mode::Watch, notify)
    }

    /// Write a setting through the daemon and return its verdict.
    ///
    /// Blocks until the write-response or the retry budget is spent
    /// (verdict [`WriteResult::Timeout`]). Supply `event` when calling
    /// from multiple threads concurrently.
    pub fn write_setting(
        &self,
        event: Option<Arc<dyn WaitEvent>>,
        section: &str,
        name: &str,
        value: &SettingValue,
    ) -> Result<WriteResult> {
        ClientInner::write_setting(&self.inner, event, section, name, value)
    }

    pub fn write_int(&self, section: &str, name: &str, value: i32) -> Result<WriteResult> {
        self.write_setting(None, section, name, &SettingValue::Int32(value))
    }

    pub fn write_float(&self, section: &str, name: &str, value: f32) -> Result<WriteResult> {
        self.write_setting(None, section, name, &SettingValue::Float(value))
    }

    pub fn write_str(&self, section: &str, name: &str, value: &str) -> Result<WriteResult> {
        self.write_setting(None, section, name, &SettingValue::Str(value.to_owned()))
    }

    pub fn write_bool(&self, section: &str, name: &str, value: bool) -> Result<WriteResult> {
        self.write_setting(None, section, name, &SettingValue::Bool(value))
    }

    /// Read a setting by name.
    ///
    /// `value_len` selects the storage width for numeric types (as the
    /// typed veneers do). The response type tag must agree with `ty`;
    /// enum-tagged responses are accepted against whatever type the
    /// caller indicates.
    pub fn read_setting(
        &self,
        event: Option<Arc<dyn WaitEvent>>,
        section: &str,
        name: &str,
        ty: TypeId,
        value_len: usize,
    ) -> Result<SettingValue> {
        ClientInner::read_setting(&self.inner, event, section, name, ty, value_len)
    }

    pub fn read_int(&self, section: &str, name: &str) -> Result<i32> {
        match self.read_setting(None, section, name, TypeId::INT, 4)? {
            SettingValue::Int32(value) => Ok(value),
            _ => Err(Error::TypeMismatch),
        }
    }

    pub fn read_float(&self, section: &str, name: &str) -> Result<f32> {
        match self.read_setting(None, section, name, TypeId::FLOAT, 4)? {
            SettingValue::Float(value) => Ok(value),
            _ => Err(Error::TypeMismatch),
        }
    }

    pub fn read_str(&self, section: &str, name: &str) -> Result<String> {
        match self.read_setting(
            None,
            section,
            name,
            TypeId::STRING,
            crate::config::STRING_CAPACITY,
        )? {
            SettingValue::Str(value) => Ok(value),
            _ => Err(Error::TypeMismatch),
        }
    }

    pub fn read_bool(&self, section: &str, name: &str) -> Result<bool> {
        match self.read_setting(None, section, name, TypeId::BOOL, 1)? {
            SettingValue::Bool(value) => Ok(value),
            _ => Err(Error::TypeMismatch),
        }
    }

    /// Read one entry of the daemon's setting enumeration.
    ///
    /// Returns `Ok(None)` when the daemon announced the end of the
    /// enumeration.
    pub fn read_by_index(
        &self,
        event: Option<Arc<dyn WaitEvent>>,
        index: u16,
    ) -> Result<Option<IndexEntry>> {
        ClientInner::read_by_index(&self.inner, event, index)
    }

    /// Snapshot of a locally registered or watched setting.
    pub fn value(&self, section: &str, name: &str) -> Option<SettingValue> {
        self.inner
            .store
            .lock()
            .lookup(section, name)
            .and_then(Setting::value)
    }
}

impl Drop for SettingsClient {
    fn drop(&mut self) {
        log::info!("releasing settings client");
        self.inner
            .callbacks
            .lock()
            .clear(self.inner.iface.as_ref());
    }
}

impl ClientInner {
    /// Install the inbound handler for `kind` if not yet installed.
    fn ensure_callback(this: &Arc<Self>, kind: MessageKind) -> Result<()> {
        let handler = handlers::make_handler(Arc::downgrade(this), kind);
        this.callbacks
            .lock()
            .ensure(this.iface.as_ref(), kind, handler)?;
        Ok(())
    }

    fn remove_callback(&self, kind: MessageKind) {
        if let Err(err) = self.callbacks.lock().remove(self.iface.as_ref(), kind) {
            log::error!("unregistering callback for {kind:?} failed: {err}");
        }
    }

    /// Synchronous request/reply over the asynchronous bus.
    ///
    /// Enlists a descriptor whose correlation prefix is the first
    /// `prefix_len` bytes of `payload`, then sends and waits, resending
    /// until the response arrives or `tries` attempts are spent. The
    /// descriptor is unlinked on every exit path; the returned flag is
    /// the success of the exchange.
    fn perform(
        &self,
        event: Option<Arc<dyn WaitEvent>>,
        kind: MessageKind,
        payload: &[u8],
        prefix_len: usize,
        timeout: Duration,
        tries: u8,
        sender_id: u16,
    ) -> (Arc<PendingRequest>, bool) {
        let event =
            event.unwrap_or_else(|| Arc::clone(&self.shared_event) as Arc<dyn WaitEvent>);
        let request = self
            .requests
            .lock()
            .append(kind, &payload[..prefix_len], event);

        let mut success = false;
        for attempt in 0..tries {
            if let Err(err) = self.iface.send_from(kind, payload, sender_id) {
                log::warn!(
                    "sending {kind:?} failed (attempt {}/{tries}): {err}",
                    attempt + 1
                );
            }
            request.event.wait(timeout);
            if request.matched() {
                success = true;
                break;
            }
        }

        self.requests.lock().remove(&request);
        (request, success)
    }

    fn add_setting(
        this: &Arc<Self>,
        section: &str,
        name: &str,
        initial: SettingValue,
        mode: Mode,
        notify: Option<NotifyFn>,
    ) -> Result<()> {
        if this.registry.lock().lookup(initial.type_id()).is_none() {
            return Err(Error::UnknownType(initial.type_id()));
        }

        let setting = Setting::new(section, name, &initial, mode, notify)?;
        this.store.lock().insert(setting)?;

        let result = if mode == Mode::Watch {
            Self::ensure_callback(this, MessageKind::WriteResp).and_then(|()| {
                if let Err(err) = Self::read_watched_value(this, section, name) {
                    log::warn!(
                        "unable to read initial value of watch {section}.{name}: {err}"
                    );
                }
                Ok(())
            })
        } else {
            Self::ensure_callback(this, MessageKind::RegisterResp)
                .and_then(|()| Self::ensure_callback(this, MessageKind::Write))
                .and_then(|()| this.register_exchange(section, name))
        };

        if let Err(err) = result {
            log::error!("registering {section}.{name} with settings daemon failed");
            this.store.lock().remove(section, name);
            return Err(err);
        }
        Ok(())
    }

    /// Announce an owned setting; the register-response handler applies
    /// the daemon's returned value before the exchange completes.
    fn register_exchange(&self, section: &str, name: &str) -> Result<()> {
        let (payload, header_len) = {
            let registry = self.registry.lock();
            let store = self.store.lock();
            let setting = store
                .lookup(section, name)
                .expect("setting inserted by caller");
            let codec = registry
                .lookup(setting.type_id())
                .ok_or(Error::UnknownType(setting.type_id()))?;
            setting.format_payload(codec.as_ref(), true)?
        };

        let (_, matched) = self.perform(
            None,
            MessageKind::Register,
            &payload,
            header_len,
            REGISTER_TIMEOUT,
            REGISTER_TRIES,
            self.sender_id,
        );

        if matched {
            Ok(())
        } else {
            Err(Error::Timeout)
        }
    }

    /// Prime a watch with the daemon's current value.
    ///
    /// Returns `Ok(false)` when the daemon answered without a value
    /// token: the setting is not registered anywhere yet, which leaves
    /// the watch valid and waiting for write-response broadcasts.
    fn read_watched_value(this: &Arc<Self>, section: &str, name: &str) -> Result<bool> {
        let mut payload = Vec::new();
        wire::format(&mut payload, Some(section), Some(name), None, None)?;

        Self::ensure_callback(this, MessageKind::ReadResp)?;
        let prefix_len = payload.len();
        let (request, matched) = this.perform(
            None,
            MessageKind::ReadReq,
            &payload,
            prefix_len,
            WATCH_INIT_TIMEOUT,
            WATCH_INIT_TRIES,
            DAEMON_SENDER_ID,
        );
        this.remove_callback(MessageKind::ReadResp);

        if !matched {
            return Err(Error::Timeout);
        }
        let resp_value_valid = request.state.lock().resp_value_valid;
        Ok(resp_value_valid)
    }

    fn write_setting(
        this: &Arc<Self>,
        event: Option<Arc<dyn WaitEvent>>,
        section: &str,
        name: &str,
        value: &SettingValue,
    ) -> Result<WriteResult> {
        Self::ensure_callback(this, MessageKind::WriteResp)?;

        // Ephemeral setting: exists only to format the payload.
        let (payload, header_len) = {
            let registry = this.registry.lock();
            let codec = registry
                .lookup(value.type_id())
                .ok_or(Error::UnknownType(value.type_id()))?;
            let ephemeral = Setting::new(section, name, value, Mode::OwnedRw, None)?;
            ephemeral.format_payload(codec.as_ref(), false)?
        };

        let (request, _) = this.perform(
            event,
            MessageKind::Write,
            &payload,
            header_len,
            REGISTER_TIMEOUT,
            REGISTER_TRIES,
            DAEMON_SENDER_ID,
        );

        let status = request.state.lock().status;
        Ok(status)
    }

    fn read_setting(
        this: &Arc<Self>,
        event: Option<Arc<dyn WaitEvent>>,
        section: &str,
        name: &str,
        ty: TypeId,
        value_len: usize,
    ) -> Result<SettingValue> {
        let mut payload = Vec::new();
        wire::format(&mut payload, Some(section), Some(name), None, None)?;

        Self::ensure_callback(this, MessageKind::ReadResp)?;
        let prefix_len = payload.len();
        let (request, matched) = this.perform(
            event,
            MessageKind::ReadReq,
            &payload,
            prefix_len,
            WATCH_INIT_TIMEOUT,
            WATCH_INIT_TRIES,
            DAEMON_SENDER_ID,
        );
        this.remove_callback(MessageKind::ReadResp);

        if !matched {
            return Err(Error::Timeout);
        }

        let state = request.state.lock();

        // The daemon echoes either nothing (untyped settings), an
        // `enum:` tag, or the numeric type id. Enum tags are accepted
        // against whatever type the caller indicated.
        if !state.resp_type.is_empty() && !state.resp_type.starts_with(ENUM_TAG) {
            let parsed = state
                .resp_type
                .parse::<usize>()
                .map_err(|_| Error::TypeMismatch)?;
            if TypeId(parsed) != ty {
                log::error!(
                    "setting types don't match: requested {ty:?}, daemon says {parsed}"
                );
                return Err(Error::TypeMismatch);
            }
        }

        let registry = this.registry.lock();
        let codec = registry.lookup(ty).ok_or(Error::UnknownType(ty))?;
        let mut buf = vec![0u8; value_len];
        if !codec.from_text(&state.resp_value, &mut buf) {
            log::error!("value parsing failed for {section}.{name}");
            return Err(Error::ValueParse);
        }
        SettingValue::decode(ty, &buf).ok_or(Error::ValueParse)
    }

    fn read_by_index(
        this: &Arc<Self>,
        event: Option<Arc<dyn WaitEvent>>,
        index: u16,
    ) -> Result<Option<IndexEntry>> {
        Self::ensure_callback(this, MessageKind::ReadByIndexResp)?;
        if let Err(err) = Self::ensure_callback(this, MessageKind::ReadByIndexDone) {
            this.remove_callback(MessageKind::ReadByIndexResp);
            return Err(err);
        }

        let payload = wire::index_request(index);
        let (request, matched) = this.perform(
            event,
            MessageKind::ReadByIndexReq,
            &payload,
            payload.len(),
            WATCH_INIT_TIMEOUT,
            WATCH_INIT_TRIES,
            DAEMON_SENDER_ID,
        );

        if !matched {
            return Err(Error::Timeout);
        }

        let state = request.state.lock();
        if state.read_by_idx_done {
            drop(state);
            this.remove_callback(MessageKind::ReadByIndexResp);
            this.remove_callback(MessageKind::ReadByIndexDone);
            return Ok(None);
        }

        Ok(Some(IndexEntry {
            section: state.resp_section.clone(),
            name: state.resp_name.clone(),
            value: state.resp_value.clone(),
            type_tag: state.resp_type.clone(),
        }))
    }
}
