//! # PSU Control – Raspberrymatic
//!
//! A PSU Control sub-plugin that switches a printer's power supply through a
//! Raspberrymatic/Homematic CCU and reads the relay state back from the CCU's
//! XML-API.
//!
//! ## What It Does
//!
//! 1. **Switching**: `GET <ip><onCommand>` / `GET <ip><offCommand>`.
//! 2. **Sensing**: `GET <ip><senseCommand>`, then the `value` attribute of the
//!    first `datapoint` element below the document root.
//!
//! Both are gated on configuration; an unconfigured bridge logs a warning and
//! does nothing. Gateway failures are logged and never reach the coordinator.
//!
//! ## Usage
//!
//! ```rust,ignore
//! let bridge = Arc::new(
//!     PsuBridge::builder()
//!         .settings(TomlSettings::load("psucontrol_raspberrymatic.toml")?)
//!         .build(),
//! );
//! bridge.on_settings_initialized();
//! Arc::clone(&bridge).on_startup("0.0.0.0", 5000, &plugin_manager);
//! ```

pub mod bridge;
pub mod cli;
pub mod error;
pub mod gateway;
pub mod host;
pub mod logging;
pub mod metadata;
pub mod settings;
pub mod state;

pub use bridge::{PsuBridge, PsuBridgeBuilder};
pub use error::{BridgeError, SettingsError};
pub use gateway::{GatewayTransport, HttpTransport, TransportConfig};
pub use host::{
    PluginHelpers, PluginManager, PsuControlSubPlugin, RegisterPluginFn, SettingsPlugin,
    StartupPlugin, PSUCONTROL_PLUGIN, REGISTER_PLUGIN_HELPER,
};
pub use settings::{
    GatewayConfig, MemorySettings, SettingsStore, TomlSettings, SETTINGS_VERSION, UNSET,
};
pub use state::StateCoercion;
