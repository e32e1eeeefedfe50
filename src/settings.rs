//! # Settings
//!
//! The persisted settings schema, the [`SettingsStore`] seam the host provides,
//! and the in-memory [`GatewayConfig`] snapshot the bridge operates on.
//!
//! ## Schema (version 1)
//!
//! | Key            | Type   | Default  |
//! |----------------|--------|----------|
//! | `ip`           | string | `"None"` |
//! | `onCommand`    | string | `"None"` |
//! | `offCommand`   | string | `"None"` |
//! | `senseCommand` | string | `"None"` |
//!
//! The literal `"None"` is the "unset" sentinel. It never reaches the HTTP
//! layer: [`GatewayConfig`] stores it as `Option::None`.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::SettingsError;

/// Persisted placeholder meaning "not configured".
pub const UNSET: &str = "None";

/// Schema version reported to the host.
pub const SETTINGS_VERSION: u32 = 1;

pub const KEY_IP: &str = "ip";
pub const KEY_ON_COMMAND: &str = "onCommand";
pub const KEY_OFF_COMMAND: &str = "offCommand";
pub const KEY_SENSE_COMMAND: &str = "senseCommand";

/// One entry of the settings schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SettingField {
    pub key: &'static str,
    pub default: &'static str,
}

/// All persisted settings, in reload order.
pub static SETTINGS_SCHEMA: [SettingField; 4] = [
    SettingField { key: KEY_IP, default: UNSET },
    SettingField { key: KEY_ON_COMMAND, default: UNSET },
    SettingField { key: KEY_OFF_COMMAND, default: UNSET },
    SettingField { key: KEY_SENSE_COMMAND, default: UNSET },
];

/// Look up a schema entry by its persisted key.
pub fn schema_field(key: &str) -> Option<&'static SettingField> {
    SETTINGS_SCHEMA.iter().find(|f| f.key == key)
}

/// Host-side settings persistence.
///
/// `get` returns `None` for keys the store has never seen; callers fall back
/// to the schema default.
pub trait SettingsStore: Send {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&mut self, key: &str, value: &str);

    /// Flush pending changes. Stores without a backing medium keep the default.
    fn save(&mut self) -> Result<(), SettingsError> {
        Ok(())
    }
}

/// Process-local settings, used by embedding hosts and tests.
#[derive(Debug, Clone, Default)]
pub struct MemorySettings {
    values: HashMap<String, String>,
}

impl MemorySettings {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style setter.
    pub fn with(mut self, key: &str, value: &str) -> Self {
        self.values.insert(key.to_string(), value.to_string());
        self
    }
}

impl SettingsStore for MemorySettings {
    fn get(&self, key: &str) -> Option<String> {
        self.values.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: &str) {
        self.values.insert(key.to_string(), value.to_string());
    }
}

/// Settings persisted as a flat TOML table:
///
/// ```toml
/// ip = "http://192.168.1.20"
/// onCommand = "/config/xmlapi/statechange.cgi?ise_id=1234&new_value=true"
/// offCommand = "/config/xmlapi/statechange.cgi?ise_id=1234&new_value=false"
/// senseCommand = "/config/xmlapi/state.cgi?datapoint_id=1235"
/// ```
#[derive(Debug, Clone)]
pub struct TomlSettings {
    path: PathBuf,
    table: toml::Table,
}

impl TomlSettings {
    /// Load `path`. A missing file behaves as an empty table and is created on
    /// the first [`save`](SettingsStore::save).
    pub fn load(path: impl Into<PathBuf>) -> Result<Self, SettingsError> {
        let path = path.into();
        let table = match std::fs::read_to_string(&path) {
            Ok(content) => content.parse::<toml::Table>().map_err(|source| SettingsError::Parse {
                path: path.display().to_string(),
                source,
            })?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "settings file not found, starting empty");
                toml::Table::new()
            }
            Err(source) => {
                return Err(SettingsError::Io {
                    path: path.display().to_string(),
                    source,
                })
            }
        };
        Ok(Self { path, table })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SettingsStore for TomlSettings {
    fn get(&self, key: &str) -> Option<String> {
        self.table.get(key).and_then(|v| v.as_str()).map(str::to_string)
    }

    fn set(&mut self, key: &str, value: &str) {
        self.table
            .insert(key.to_string(), toml::Value::String(value.to_string()));
    }

    fn save(&mut self) -> Result<(), SettingsError> {
        let content = toml::to_string_pretty(&self.table)?;
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|source| SettingsError::Io {
                path: parent.display().to_string(),
                source,
            })?;
        }
        std::fs::write(&self.path, content).map_err(|source| SettingsError::Io {
            path: self.path.display().to_string(),
            source,
        })
    }
}

/// Write the known keys of a settings-save payload into `store`.
///
/// Strings are stored verbatim, `null` resets a key to the sentinel, numbers
/// and booleans are stored in their JSON text form. Returns the number of keys
/// written.
pub fn apply_settings_data(store: &mut dyn SettingsStore, data: &serde_json::Value) -> usize {
    let Some(object) = data.as_object() else {
        debug!("settings payload is not an object, ignoring");
        return 0;
    };

    let mut written = 0;
    for (key, value) in object {
        if schema_field(key).is_none() {
            debug!(key = %key, "ignoring unknown settings key");
            continue;
        }
        let text = match value {
            serde_json::Value::String(s) => s.clone(),
            serde_json::Value::Null => UNSET.to_string(),
            serde_json::Value::Bool(_) | serde_json::Value::Number(_) => value.to_string(),
            _ => {
                debug!(key = %key, "ignoring non-scalar settings value");
                continue;
            }
        };
        store.set(key, &text);
        written += 1;
    }
    written
}

/// Immutable snapshot of the gateway configuration.
///
/// `None` means the field is unset. A reload builds a fresh snapshot instead
/// of mutating this one.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GatewayConfig {
    pub gateway_url: Option<String>,
    pub on_path: Option<String>,
    pub off_path: Option<String>,
    pub sense_path: Option<String>,
}

impl GatewayConfig {
    /// Read every schema field from `store`, falling back to the defaults.
    pub fn from_store(store: &dyn SettingsStore) -> Self {
        let read = |field: &SettingField| {
            let raw = store.get(field.key).unwrap_or_else(|| field.default.to_string());
            debug!("{}: {}", field.key, raw);
            if raw == UNSET {
                None
            } else {
                Some(raw)
            }
        };

        let [ip, on, off, sense] = &SETTINGS_SCHEMA;
        Self {
            gateway_url: read(ip),
            on_path: read(on),
            off_path: read(off),
            sense_path: read(sense),
        }
    }

    /// On and off share one gate: both need the gateway, the on path and the
    /// off path.
    pub fn switching_enabled(&self) -> bool {
        self.gateway_url.is_some() && self.on_path.is_some() && self.off_path.is_some()
    }

    pub fn sensing_enabled(&self) -> bool {
        self.gateway_url.is_some() && self.sense_path.is_some()
    }

    pub fn on_url(&self) -> Option<String> {
        self.switch_url(self.on_path.as_deref())
    }

    pub fn off_url(&self) -> Option<String> {
        self.switch_url(self.off_path.as_deref())
    }

    pub fn sense_url(&self) -> Option<String> {
        match (&self.gateway_url, &self.sense_path) {
            (Some(base), Some(path)) => Some(format!("{base}{path}")),
            _ => None,
        }
    }

    fn switch_url(&self, path: Option<&str>) -> Option<String> {
        if !self.switching_enabled() {
            return None;
        }
        Some(format!("{}{}", self.gateway_url.as_deref()?, path?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn full_store() -> MemorySettings {
        MemorySettings::new()
            .with(KEY_IP, "http://host")
            .with(KEY_ON_COMMAND, "/on")
            .with(KEY_OFF_COMMAND, "/off")
            .with(KEY_SENSE_COMMAND, "/sense")
    }

    #[test]
    fn empty_store_yields_all_unset() {
        let cfg = GatewayConfig::from_store(&MemorySettings::new());
        assert_eq!(cfg, GatewayConfig::default());
        assert!(!cfg.switching_enabled());
        assert!(!cfg.sensing_enabled());
    }

    #[test]
    fn sentinel_value_is_unset() {
        let store = full_store().with(KEY_ON_COMMAND, UNSET);
        let cfg = GatewayConfig::from_store(&store);
        assert!(cfg.on_path.is_none());
        assert_eq!(cfg.off_path.as_deref(), Some("/off"));
    }

    #[test]
    fn urls_are_plain_concatenation() {
        let cfg = GatewayConfig::from_store(&full_store());
        assert_eq!(cfg.on_url().as_deref(), Some("http://host/on"));
        assert_eq!(cfg.off_url().as_deref(), Some("http://host/off"));
        assert_eq!(cfg.sense_url().as_deref(), Some("http://host/sense"));
    }

    #[test]
    fn off_url_requires_on_path_too() {
        let cfg = GatewayConfig::from_store(&full_store().with(KEY_ON_COMMAND, UNSET));
        assert!(!cfg.switching_enabled());
        assert!(cfg.off_url().is_none());
    }

    #[test]
    fn gates_are_independent() {
        let switch_only = MemorySettings::new()
            .with(KEY_IP, "http://host")
            .with(KEY_ON_COMMAND, "/on")
            .with(KEY_OFF_COMMAND, "/off");
        let cfg = GatewayConfig::from_store(&switch_only);
        assert!(cfg.switching_enabled());
        assert!(!cfg.sensing_enabled());

        let sense_only = MemorySettings::new()
            .with(KEY_IP, "http://host")
            .with(KEY_SENSE_COMMAND, "/sense");
        let cfg = GatewayConfig::from_store(&sense_only);
        assert!(!cfg.switching_enabled());
        assert!(cfg.sensing_enabled());
    }

    #[test]
    fn schema_has_four_string_fields_defaulting_to_sentinel() {
        assert_eq!(SETTINGS_SCHEMA.len(), 4);
        assert!(SETTINGS_SCHEMA.iter().all(|f| f.default == UNSET));
        assert!(schema_field("senseCommand").is_some());
        assert!(schema_field("gpio").is_none());
    }

    #[test]
    fn apply_settings_data_writes_known_keys_only() {
        let mut store = MemorySettings::new();
        let data = serde_json::json!({
            "ip": "http://ccu",
            "onCommand": null,
            "unknown": "x",
            "offCommand": ["not", "scalar"],
        });
        let written = apply_settings_data(&mut store, &data);
        assert_eq!(written, 2);
        assert_eq!(store.get(KEY_IP).as_deref(), Some("http://ccu"));
        assert_eq!(store.get(KEY_ON_COMMAND).as_deref(), Some(UNSET));
        assert!(store.get("unknown").is_none());
        assert!(store.get(KEY_OFF_COMMAND).is_none());
    }

    #[test]
    fn apply_settings_data_ignores_non_object() {
        let mut store = MemorySettings::new();
        assert_eq!(apply_settings_data(&mut store, &serde_json::json!("ip")), 0);
    }

    #[test]
    fn toml_settings_missing_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = TomlSettings::load(dir.path().join("absent.toml")).unwrap();
        assert!(store.get(KEY_IP).is_none());
    }

    #[test]
    fn toml_settings_save_and_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("psu.toml");
        let mut store = TomlSettings::load(&path).unwrap();
        store.set(KEY_IP, "http://ccu");
        store.set(KEY_SENSE_COMMAND, "/config/xmlapi/state.cgi?datapoint_id=1");
        store.save().unwrap();

        let reloaded = TomlSettings::load(&path).unwrap();
        assert_eq!(reloaded.get(KEY_IP).as_deref(), Some("http://ccu"));
        assert_eq!(
            reloaded.get(KEY_SENSE_COMMAND).as_deref(),
            Some("/config/xmlapi/state.cgi?datapoint_id=1")
        );
    }

    #[test]
    fn toml_settings_rejects_malformed_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.toml");
        std::fs::write(&path, "ip = [unterminated").unwrap();
        let err = TomlSettings::load(&path).unwrap_err();
        assert!(matches!(err, SettingsError::Parse { .. }));
    }

    #[test]
    fn toml_settings_non_string_value_reads_as_missing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("psu.toml");
        std::fs::write(&path, "ip = 42\n").unwrap();
        let store = TomlSettings::load(&path).unwrap();
        assert!(store.get(KEY_IP).is_none());
    }
}
