//! Contracts between the bridge and the host application.
//!
//! The host owns lifecycle dispatch, settings persistence and the power-control
//! coordinator ("psucontrol"). None of that lives in this crate; these traits
//! are the seams the host drives the bridge through.

use std::collections::HashMap;
use std::sync::Arc;

/// Name of the power-control coordinator plugin.
pub const PSUCONTROL_PLUGIN: &str = "psucontrol";

/// Helper the coordinator exposes for sub-plugin registration.
pub const REGISTER_PLUGIN_HELPER: &str = "register_plugin";

/// Operations the power-control coordinator calls on a registered sub-plugin.
///
/// None of them may fail: a sub-plugin degrades to "does nothing" / "off"
/// rather than destabilising the host.
pub trait PsuControlSubPlugin: Send + Sync {
    fn turn_psu_on(&self);
    fn turn_psu_off(&self);
    fn get_psu_state(&self) -> bool;
}

/// A registration entry point handed out by the coordinator.
pub type RegisterPluginFn = Arc<dyn Fn(Arc<dyn PsuControlSubPlugin>) + Send + Sync>;

/// Named helpers one plugin exposes to others.
pub type PluginHelpers = HashMap<String, RegisterPluginFn>;

/// The host's plugin registry.
pub trait PluginManager {
    /// Helpers exported by `plugin`, or `None` when it is not installed.
    fn get_helpers(&self, plugin: &str) -> Option<PluginHelpers>;
}

/// Startup notification, fired once the host is serving.
pub trait StartupPlugin {
    fn on_startup(self: Arc<Self>, host: &str, port: u16, plugins: &dyn PluginManager);
}

/// Settings lifecycle hooks.
pub trait SettingsPlugin {
    /// Settings store is ready to be read.
    fn on_settings_initialized(&self);

    /// The user saved settings; `data` holds the submitted key/value pairs.
    fn on_settings_save(&self, data: &serde_json::Value);

    fn get_settings_version(&self) -> u32;

    /// Upgrade persisted settings from `current` to `target`.
    fn on_settings_migrate(&self, target: u32, current: Option<u32>);
}
