//! # PSU bridge
//!
//! ## Responsibility
//! Switch the PSU relay and read its state back through the CCU, using the
//! four persisted settings described in [`crate::settings`].
//!
//! ## Guarantees
//! - Non-propagating: the coordinator-facing operations never return an error
//!   and never panic. Failures are logged and turned into "no-op" / `false`.
//! - One request per call: no retries.
//! - Consistent: every operation reads a single [`GatewayConfig`] snapshot;
//!   a reload swaps in a complete new snapshot.
//!
//! ## NOT Responsible For
//! - Persisting settings beyond handing them to the [`SettingsStore`]
//! - Scheduling or polling; the coordinator decides when to call

use std::sync::{Arc, Mutex, PoisonError, RwLock};
use std::time::Duration;

use tracing::{debug, error, warn};

use crate::error::BridgeError;
use crate::gateway::{GatewayTransport, HttpTransport, TransportConfig};
use crate::host::{
    PluginManager, PsuControlSubPlugin, SettingsPlugin, StartupPlugin, PSUCONTROL_PLUGIN,
    REGISTER_PLUGIN_HELPER,
};
use crate::settings::{
    apply_settings_data, GatewayConfig, MemorySettings, SettingsStore, SETTINGS_VERSION,
};
use crate::state::{datapoint_value, StateCoercion};

/// The PSU Control sub-plugin.
///
/// Build one with [`PsuBridge::builder`]. It starts with every field unset;
/// call [`reload_settings`](Self::reload_settings) (or let the host fire
/// `on_settings_initialized`) to read the store.
pub struct PsuBridge {
    settings: Mutex<Box<dyn SettingsStore>>,
    config: RwLock<Arc<GatewayConfig>>,
    transport: Box<dyn GatewayTransport>,
    coercion: StateCoercion,
}

impl PsuBridge {
    pub fn builder() -> PsuBridgeBuilder {
        PsuBridgeBuilder::new()
    }

    /// Current configuration snapshot.
    pub fn config(&self) -> Arc<GatewayConfig> {
        let guard = self.config.read().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(&guard)
    }

    /// Re-read all four fields from the settings store and replace the
    /// configuration as a whole.
    pub fn reload_settings(&self) {
        let fresh = {
            let store = self.settings.lock().unwrap_or_else(PoisonError::into_inner);
            GatewayConfig::from_store(&**store)
        };
        let mut guard = self.config.write().unwrap_or_else(PoisonError::into_inner);
        *guard = Arc::new(fresh);
    }

    /// Switch the relay on.
    ///
    /// # Errors
    /// - [`BridgeError::SwitchingDisabled`] when the gateway, on or off path is unset.
    /// - Transport errors from the single GET request.
    pub fn try_turn_on(&self) -> Result<(), BridgeError> {
        let url = self.config().on_url().ok_or(BridgeError::SwitchingDisabled)?;
        self.transport.get(&url).map(|_| ())
    }

    /// Switch the relay off. Shares the on/off gate with [`try_turn_on`](Self::try_turn_on).
    pub fn try_turn_off(&self) -> Result<(), BridgeError> {
        let url = self.config().off_url().ok_or(BridgeError::SwitchingDisabled)?;
        self.transport.get(&url).map(|_| ())
    }

    /// Query the relay state.
    ///
    /// # Errors
    /// - [`BridgeError::SensingDisabled`] when the gateway or sense path is unset.
    /// - Transport, XML and [`BridgeError::MissingDatapoint`] errors.
    pub fn try_get_state(&self) -> Result<bool, BridgeError> {
        let url = self.config().sense_url().ok_or(BridgeError::SensingDisabled)?;
        let body = self.transport.get(&url)?;
        let raw = datapoint_value(&body)?;
        debug!("Result: {}", raw.as_deref().unwrap_or("<no value>"));
        Ok(self.coercion.coerce(raw.as_deref()))
    }

    /// Register with the power-control coordinator, if it supports sub-plugins.
    ///
    /// Returns whether registration happened.
    pub fn register_with(self: &Arc<Self>, plugins: &dyn PluginManager) -> bool {
        let register = plugins
            .get_helpers(PSUCONTROL_PLUGIN)
            .and_then(|helpers| helpers.get(REGISTER_PLUGIN_HELPER).cloned());

        let Some(register) = register else {
            warn!("The version of PSUControl that is installed does not support plugin registration.");
            return false;
        };

        debug!("Registering plugin with PSUControl");
        register(Arc::clone(self) as Arc<dyn PsuControlSubPlugin>);
        true
    }

    fn switch(&self, result: Result<(), BridgeError>) {
        match result {
            Ok(()) => {}
            Err(e) if e.is_disabled() => warn!("Switching is not enabled"),
            Err(e) => error!(error = %e, "Exception while Switching"),
        }
    }
}

impl PsuControlSubPlugin for PsuBridge {
    fn turn_psu_on(&self) {
        self.switch(self.try_turn_on());
    }

    fn turn_psu_off(&self) {
        self.switch(self.try_turn_off());
    }

    fn get_psu_state(&self) -> bool {
        match self.try_get_state() {
            Ok(on) => on,
            Err(e) if e.is_disabled() => {
                warn!("Sensing is not enabled");
                false
            }
            Err(e) => {
                error!(error = %e, "Exception while reading State");
                false
            }
        }
    }
}

impl StartupPlugin for PsuBridge {
    fn on_startup(self: Arc<Self>, host: &str, port: u16, plugins: &dyn PluginManager) {
        debug!(host, port, "startup");
        self.register_with(plugins);
    }
}

impl SettingsPlugin for PsuBridge {
    fn on_settings_initialized(&self) {
        self.reload_settings();
    }

    fn on_settings_save(&self, data: &serde_json::Value) {
        {
            let mut store = self.settings.lock().unwrap_or_else(PoisonError::into_inner);
            apply_settings_data(&mut **store, data);
            if let Err(e) = store.save() {
                error!(error = %e, "failed to persist settings");
            }
        }
        self.reload_settings();
    }

    fn get_settings_version(&self) -> u32 {
        SETTINGS_VERSION
    }

    fn on_settings_migrate(&self, _target: u32, _current: Option<u32>) {}
}

/// Builder for [`PsuBridge`].
///
/// # Example
/// ```rust,ignore
/// let bridge = PsuBridge::builder()
///     .settings(TomlSettings::load("psu.toml")?)
///     .request_timeout(Duration::from_secs(10))
///     .build();
/// bridge.reload_settings();
/// ```
pub struct PsuBridgeBuilder {
    settings: Option<Box<dyn SettingsStore>>,
    transport: Option<Box<dyn GatewayTransport>>,
    transport_config: TransportConfig,
    coercion: StateCoercion,
}

impl PsuBridgeBuilder {
    pub fn new() -> Self {
        Self {
            settings: None,
            transport: None,
            transport_config: TransportConfig::default(),
            coercion: StateCoercion::default(),
        }
    }

    /// Settings store to read from and save into (default: empty in-memory store).
    pub fn settings(mut self, store: impl SettingsStore + 'static) -> Self {
        self.settings = Some(Box::new(store));
        self
    }

    /// Replace the HTTP transport. Timeouts set on the builder are ignored.
    pub fn transport(mut self, transport: impl GatewayTransport + 'static) -> Self {
        self.transport = Some(Box::new(transport));
        self
    }

    pub fn coercion(mut self, coercion: StateCoercion) -> Self {
        self.coercion = coercion;
        self
    }

    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.transport_config.connect_timeout = Some(timeout);
        self
    }

    pub fn request_timeout(mut self, timeout: Duration) -> Self {
        self.transport_config.request_timeout = Some(timeout);
        self
    }

    /// Bypass any proxy configured in the environment.
    pub fn no_proxy(mut self) -> Self {
        self.transport_config.no_proxy = true;
        self
    }

    /// Consume the builder. The configuration starts fully unset.
    pub fn build(self) -> PsuBridge {
        let transport = self
            .transport
            .unwrap_or_else(|| Box::new(HttpTransport::new(self.transport_config)));
        PsuBridge {
            settings: Mutex::new(
                self.settings
                    .unwrap_or_else(|| Box::new(MemorySettings::new())),
            ),
            config: RwLock::new(Arc::new(GatewayConfig::default())),
            transport,
            coercion: self.coercion,
        }
    }
}

impl Default for PsuBridgeBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::{KEY_IP, KEY_OFF_COMMAND, KEY_SENSE_COMMAND};

    struct FixedBody(&'static str);

    impl GatewayTransport for FixedBody {
        fn get(&self, _url: &str) -> Result<String, BridgeError> {
            Ok(self.0.to_string())
        }
    }

    fn sensing_store() -> MemorySettings {
        MemorySettings::new()
            .with(KEY_IP, "http://ccu")
            .with(KEY_SENSE_COMMAND, "/state")
    }

    #[test]
    fn new_bridge_starts_unset_even_with_populated_store() {
        let bridge = PsuBridge::builder().settings(sensing_store()).build();
        assert_eq!(*bridge.config(), GatewayConfig::default());
        bridge.on_settings_initialized();
        assert!(bridge.config().sensing_enabled());
    }

    #[test]
    fn disabled_errors_are_reported_by_try_variants() {
        let bridge = PsuBridge::builder().transport(FixedBody("")).build();
        assert_eq!(bridge.try_turn_on(), Err(BridgeError::SwitchingDisabled));
        assert_eq!(bridge.try_turn_off(), Err(BridgeError::SwitchingDisabled));
        assert_eq!(bridge.try_get_state(), Err(BridgeError::SensingDisabled));
    }

    #[test]
    fn legacy_coercion_treats_false_text_as_on() {
        let bridge = PsuBridge::builder()
            .settings(sensing_store())
            .transport(FixedBody(r#"<state><datapoint value="false"/></state>"#))
            .coercion(StateCoercion::NonEmpty)
            .build();
        bridge.reload_settings();
        assert!(bridge.get_psu_state());
    }

    #[test]
    fn strict_coercion_reads_false_text_as_off() {
        let bridge = PsuBridge::builder()
            .settings(sensing_store())
            .transport(FixedBody(r#"<state><datapoint value="false"/></state>"#))
            .build();
        bridge.reload_settings();
        assert!(!bridge.get_psu_state());
        assert_eq!(bridge.try_get_state(), Ok(false));
    }

    #[test]
    fn settings_save_persists_and_reloads() {
        let bridge = PsuBridge::builder().transport(FixedBody("")).build();
        bridge.on_settings_save(&serde_json::json!({
            "ip": "http://ccu",
            "onCommand": "/on",
            "offCommand": "/off",
        }));
        let cfg = bridge.config();
        assert!(cfg.switching_enabled());
        assert_eq!(cfg.on_url().as_deref(), Some("http://ccu/on"));
        assert_eq!(bridge.try_turn_on(), Ok(()));
    }

    #[test]
    fn settings_version_is_one_and_migrate_is_noop() {
        let bridge = PsuBridge::builder().settings(sensing_store()).build();
        assert_eq!(bridge.get_settings_version(), 1);
        bridge.on_settings_migrate(1, None);
        assert_eq!(*bridge.config(), GatewayConfig::default());
    }

    #[test]
    fn builder_timeouts_are_recorded() {
        let builder = PsuBridge::builder()
            .connect_timeout(Duration::from_secs(3))
            .request_timeout(Duration::from_secs(10));
        assert_eq!(builder.transport_config.connect_timeout, Some(Duration::from_secs(3)));
        assert_eq!(builder.transport_config.request_timeout, Some(Duration::from_secs(10)));
        let _ = builder.build();
    }

    #[test]
    fn off_switch_needs_on_path() {
        let store = MemorySettings::new()
            .with(KEY_IP, "http://ccu")
            .with(KEY_OFF_COMMAND, "/off");
        let bridge = PsuBridge::builder().settings(store).transport(FixedBody("")).build();
        bridge.reload_settings();
        assert_eq!(bridge.try_turn_off(), Err(BridgeError::SwitchingDisabled));

        bridge.on_settings_save(&serde_json::json!({ "onCommand": "/on" }));
        assert_eq!(bridge.try_turn_off(), Ok(()));
    }
}
