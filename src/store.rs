// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! In-memory store of registered and watched settings.
//!
//! Each entry owns its value buffer plus a same-sized shadow buffer used
//! to revert failed updates. Iteration order groups settings by section:
//! a new setting lands after the last existing setting of its section,
//! sections themselves in first-insertion order.

use crate::error::{Error, Result};
use crate::types::{Codec, SettingValue, TypeId, TypeRegistry};
use crate::wire::{push_token, WriteResult};

/// How a setting participates in the protocol.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Owned by this client; answers daemon-forwarded writes.
    OwnedRw,
    /// Owned by this client; writes are refused locally.
    OwnedRo,
    /// Local mirror of a setting owned elsewhere.
    Watch,
}

/// Notify predicate invoked after a tentative update.
///
/// The closure environment replaces the opaque context pointer of
/// callback-table APIs. A non-[`WriteResult::Ok`] return reverts owned
/// settings; watches apply the update regardless.
pub type NotifyFn = Box<dyn FnMut(&SettingValue) -> WriteResult + Send>;

/// One registered or watched setting.
pub struct Setting {
    section: String,
    name: String,
    value: Vec<u8>,
    shadow: Vec<u8>,
    type_id: TypeId,
    mode: Mode,
    notify: Option<NotifyFn>,
}

impl Setting {
    pub fn new(
        section: &str,
        name: &str,
        initial: &SettingValue,
        mode: Mode,
        notify: Option<NotifyFn>,
    ) -> Result<Self> {
        let value = initial.encode()?;
        let shadow = vec![0u8; value.len()];
        Ok(Self {
            section: section.to_owned(),
            name: name.to_owned(),
            value,
            shadow,
            type_id: initial.type_id(),
            mode,
            notify,
        })
    }

    #[must_use]
    pub fn section(&self) -> &str {
        &self.section
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn mode(&self) -> Mode {
        self.mode
    }

    #[must_use]
    pub fn type_id(&self) -> TypeId {
        self.type_id
    }

    /// Snapshot of the current value.
    #[must_use]
    pub fn value(&self) -> Option<SettingValue> {
        SettingValue::decode(self.type_id, &self.value)
    }

    /// Apply `text` to the value buffer with revert-on-failure.
    ///
    /// The shadow copy is taken before the coercion is attempted; a
    /// codec refusal or (for owned settings) a rejecting notify
    /// predicate restores the previous bytes exactly.
    pub fn update_value(&mut self, codec: &dyn Codec, text: &str) -> WriteResult {
        if self.mode == Mode::OwnedRo {
            return WriteResult::ReadOnly;
        }

        self.shadow.copy_from_slice(&self.value);
        if !codec.from_text(text, &mut self.value) {
            self.value.copy_from_slice(&self.shadow);
            return WriteResult::ParseFailed;
        }

        let Some(notify) = self.notify.as_mut() else {
            return WriteResult::Ok;
        };

        let result = match SettingValue::decode(self.type_id, &self.value) {
            Some(value) => notify(&value),
            None => WriteResult::Ok,
        };

        if self.mode == Mode::Watch {
            // Watches mirror the owner's accepted value; the predicate
            // is informational only.
            return WriteResult::Ok;
        }

        if result != WriteResult::Ok {
            self.value.copy_from_slice(&self.shadow);
        }

        result
    }

    /// Format `section \0 name \0 value \0 [type \0]` for this setting.
    ///
    /// Returns the payload and the header length (the section + name
    /// prefix used for response correlation).
    pub fn format_payload(
        &self,
        codec: &dyn Codec,
        with_type: bool,
    ) -> Result<(Vec<u8>, usize)> {
        let mut out = Vec::new();
        push_token(&mut out, &self.section)?;
        push_token(&mut out, &self.name)?;
        let header_len = out.len();

        let value = codec.to_text(&self.value).ok_or(Error::ValueParse)?;
        push_token(&mut out, &value)?;

        if with_type {
            if let Some(tag) = codec.describe_type() {
                push_token(&mut out, &tag)?;
            }
        }

        Ok((out, header_len))
    }
}

/// Ordered collection of settings keyed by (section, name).
#[derive(Default)]
pub struct SettingStore {
    settings: Vec<Setting>,
}

impl SettingStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert grouped by section; duplicates are refused.
    pub fn insert(&mut self, setting: Setting) -> Result<()> {
        if self.lookup(setting.section(), setting.name()).is_some() {
            return Err(Error::DuplicateSetting {
                section: setting.section().to_owned(),
                name: setting.name().to_owned(),
            });
        }

        let position = self
            .settings
            .iter()
            .rposition(|existing| existing.section == setting.section)
            .map(|index| index + 1);

        match position {
            Some(index) => self.settings.insert(index, setting),
            None => self.settings.push(setting),
        }
        Ok(())
    }

    pub fn lookup(&self, section: &str, name: &str) -> Option<&Setting> {
        self.settings
            .iter()
            .find(|s| s.section == section && s.name == name)
    }

    pub fn lookup_mut(&mut self, section: &str, name: &str) -> Option<&mut Setting> {
        self.settings
            .iter_mut()
            .find(|s| s.section == section && s.name == name)
    }

    /// Unlink a setting; used to roll back a failed registration.
    pub fn remove(&mut self, section: &str, name: &str) -> Option<Setting> {
        let index = self
            .settings
            .iter()
            .position(|s| s.section == section && s.name == name)?;
        Some(self.settings.remove(index))
    }

    pub fn iter(&self) -> impl Iterator<Item = &Setting> {
        self.settings.iter()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.settings.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.settings.is_empty()
    }

    /// Convenience over lookup + codec resolution + update.
    pub fn update_value(
        &mut self,
        registry: &TypeRegistry,
        section: &str,
        name: &str,
        text: &str,
    ) -> WriteResult {
        let Some(setting) = self.lookup_mut(section, name) else {
            return WriteResult::SettingRejected;
        };
        let Some(codec) = registry.lookup(setting.type_id()) else {
            return WriteResult::ServiceFailed;
        };
        setting.update_value(codec.as_ref(), text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registry() -> TypeRegistry {
        TypeRegistry::with_builtins()
    }

    fn setting(section: &str, name: &str, value: SettingValue) -> Setting {
        Setting::new(section, name, &value, Mode::OwnedRw, None).expect("setting")
    }

    #[test]
    fn test_insert_groups_by_section() {
        let mut store = SettingStore::new();
        store
            .insert(setting("imu", "rate", SettingValue::Int32(100)))
            .expect("insert");
        store
            .insert(setting("uart", "baud", SettingValue::Int32(115200)))
            .expect("insert");
        store
            .insert(setting("imu", "range", SettingValue::Int32(8)))
            .expect("insert");
        store
            .insert(setting("uart", "flow", SettingValue::Bool(false)))
            .expect("insert");

        let order: Vec<&str> = store.iter().map(Setting::name).collect();
        assert_eq!(order, ["rate", "range", "baud", "flow"]);
    }

    #[test]
    fn test_duplicate_insert_refused() {
        let mut store = SettingStore::new();
        store
            .insert(setting("imu", "rate", SettingValue::Int32(100)))
            .expect("insert");
        assert!(matches!(
            store.insert(setting("imu", "rate", SettingValue::Int32(1))),
            Err(Error::DuplicateSetting { .. })
        ));
    }

    #[test]
    fn test_update_idempotence() {
        let registry = registry();
        let mut store = SettingStore::new();
        store
            .insert(setting("imu", "rate", SettingValue::Int32(100)))
            .expect("insert");

        let codec = registry.lookup(TypeId::INT).expect("codec");
        let text = {
            let entry = store.lookup("imu", "rate").expect("setting");
            codec.to_text(&entry.value).expect("to_text")
        };
        assert_eq!(
            store.update_value(&registry, "imu", "rate", &text),
            WriteResult::Ok
        );
        assert_eq!(
            store.lookup("imu", "rate").expect("setting").value(),
            Some(SettingValue::Int32(100))
        );
    }

    #[test]
    fn test_revert_on_parse_failure() {
        let registry = registry();
        let mut store = SettingStore::new();
        store
            .insert(setting("imu", "rate", SettingValue::Int32(100)))
            .expect("insert");

        assert_eq!(
            store.update_value(&registry, "imu", "rate", "fast"),
            WriteResult::ParseFailed
        );
        assert_eq!(
            store.lookup("imu", "rate").expect("setting").value(),
            Some(SettingValue::Int32(100))
        );
    }

    #[test]
    fn test_revert_on_notify_rejection() {
        let registry = registry();
        let mut store = SettingStore::new();
        let notify: NotifyFn = Box::new(|value| {
            if matches!(value, SettingValue::Int32(v) if *v > 200) {
                WriteResult::ValueRejected
            } else {
                WriteResult::Ok
            }
        });
        store
            .insert(
                Setting::new(
                    "imu",
                    "rate",
                    &SettingValue::Int32(100),
                    Mode::OwnedRw,
                    Some(notify),
                )
                .expect("setting"),
            )
            .expect("insert");

        assert_eq!(
            store.update_value(&registry, "imu", "rate", "500"),
            WriteResult::ValueRejected
        );
        assert_eq!(
            store.lookup("imu", "rate").expect("setting").value(),
            Some(SettingValue::Int32(100))
        );

        assert_eq!(
            store.update_value(&registry, "imu", "rate", "200"),
            WriteResult::Ok
        );
        assert_eq!(
            store.lookup("imu", "rate").expect("setting").value(),
            Some(SettingValue::Int32(200))
        );
    }

    #[test]
    fn test_watch_ignores_notify_verdict() {
        let registry = registry();
        let mut store = SettingStore::new();
        let notify: NotifyFn = Box::new(|_| WriteResult::ValueRejected);
        store
            .insert(
                Setting::new(
                    "imu",
                    "rate",
                    &SettingValue::Int32(100),
                    Mode::Watch,
                    Some(notify),
                )
                .expect("setting"),
            )
            .expect("insert");

        assert_eq!(
            store.update_value(&registry, "imu", "rate", "500"),
            WriteResult::Ok
        );
        assert_eq!(
            store.lookup("imu", "rate").expect("setting").value(),
            Some(SettingValue::Int32(500))
        );
    }

    #[test]
    fn test_readonly_refuses_update() {
        let registry = registry();
        let mut store = SettingStore::new();
        store
            .insert(
                Setting::new(
                    "system",
                    "serial",
                    &SettingValue::Int32(42),
                    Mode::OwnedRo,
                    None,
                )
                .expect("setting"),
            )
            .expect("insert");

        assert_eq!(
            store.update_value(&registry, "system", "serial", "7"),
            WriteResult::ReadOnly
        );
        assert_eq!(
            store.lookup("system", "serial").expect("setting").value(),
            Some(SettingValue::Int32(42))
        );
    }

    #[test]
    fn test_unknown_setting_is_rejected() {
        let registry = registry();
        let mut store = SettingStore::new();
        assert_eq!(
            store.update_value(&registry, "ghost", "entry", "1"),
            WriteResult::SettingRejected
        );
    }

    #[test]
    fn test_enum_registration_payload_bytes() {
        let mut registry = registry();
        let ty = registry.register_enum(&["Test1", "Test2"]);
        let entry = Setting::new(
            "section",
            "name",
            &SettingValue::Enum(ty, 0),
            Mode::OwnedRo,
            None,
        )
        .expect("setting");

        let codec = registry.lookup(ty).expect("codec");
        let (payload, header_len) =
            entry.format_payload(codec.as_ref(), true).expect("format");

        assert_eq!(
            payload,
            b"section\0name\0Test1\0enum:Test1,Test2\0".to_vec()
        );
        assert_eq!(header_len, 13);
    }
}
