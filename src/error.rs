//! Crate-level error types.
//!
//! [`BridgeError`] covers everything that can go wrong between the bridge and
//! the gateway. [`SettingsError`] covers the file-backed settings store used by
//! the command-line host.

use thiserror::Error;

/// Errors that can occur while switching or sensing through the gateway.
///
/// Each variant carries enough context to diagnose the failure without
/// needing to inspect the originating error directly.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum BridgeError {
    /// `ip`, `onCommand` or `offCommand` is still unset.
    #[error("switching is not enabled")]
    SwitchingDisabled,
    /// `ip` or `senseCommand` is still unset.
    #[error("sensing is not enabled")]
    SensingDisabled,
    /// The request could not be sent or no response arrived.
    #[error("connection failed to {url}: {detail}")]
    Connect { url: String, detail: String },
    /// The gateway replied with a non-2xx HTTP status code.
    #[error("HTTP {status} from {url}")]
    Http { status: u16, url: String },
    /// The response body could not be read.
    #[error("failed to read response body from {url}: {detail}")]
    Body { url: String, detail: String },
    /// The response body is not well-formed XML.
    #[error("XML parse error: {detail}")]
    Xml { detail: String },
    /// The XML document has no `datapoint` element below its root.
    #[error("no datapoint element in state response")]
    MissingDatapoint,
}

impl BridgeError {
    /// True for the two configuration gates, which are warnings rather than
    /// failures.
    pub fn is_disabled(&self) -> bool {
        matches!(self, BridgeError::SwitchingDisabled | BridgeError::SensingDisabled)
    }
}

/// Errors from loading or persisting a settings file.
#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("settings I/O error on {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid settings file {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: toml::de::Error,
    },
    #[error("failed to serialize settings: {0}")]
    Serialize(#[from] toml::ser::Error),
}
