//! HTTP transport to the Raspberrymatic/Homematic CCU.
//!
//! The bridge only ever issues plain GET requests and reads the body back as
//! text, so the transport seam is a single method. [`HttpTransport`] is the
//! real implementation; tests plug in their own.

use std::time::Duration;

use crate::error::BridgeError;

/// Something that can perform one HTTP GET against the gateway.
pub trait GatewayTransport: Send + Sync {
    /// Issue a GET to `url` and return the response body.
    ///
    /// Implementations must not retry.
    fn get(&self, url: &str) -> Result<String, BridgeError>;
}

/// Client options for [`HttpTransport`]. `None` keeps the HTTP client's default.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TransportConfig {
    pub connect_timeout: Option<Duration>,
    pub request_timeout: Option<Duration>,
    /// Ignore `HTTP_PROXY`/`HTTPS_PROXY` and talk to the gateway directly.
    pub no_proxy: bool,
}

/// Blocking `reqwest` transport.
///
/// Each call blocks the calling thread until the gateway answers or the
/// client gives up.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::blocking::Client,
}

impl HttpTransport {
    pub fn new(config: TransportConfig) -> Self {
        let mut builder = reqwest::blocking::Client::builder();
        if let Some(timeout) = config.connect_timeout {
            builder = builder.connect_timeout(timeout);
        }
        // The blocking client applies a 30 s timeout unless told otherwise.
        if let Some(timeout) = config.request_timeout {
            builder = builder.timeout(timeout);
        }
        if config.no_proxy {
            builder = builder.no_proxy();
        }

        // Building only fails when the TLS backend cannot initialise. The
        // default client needs the same backend, so that failure still panics.
        let client = builder.build().unwrap_or_default();
        Self { client }
    }
}

impl Default for HttpTransport {
    fn default() -> Self {
        Self::new(TransportConfig::default())
    }
}

impl GatewayTransport for HttpTransport {
    fn get(&self, url: &str) -> Result<String, BridgeError> {
        let resp = self.client.get(url).send().map_err(|e| BridgeError::Connect {
            url: url.to_string(),
            detail: e.to_string(),
        })?;

        if !resp.status().is_success() {
            return Err(BridgeError::Http {
                status: resp.status().as_u16(),
                url: url.to_string(),
            });
        }

        resp.text().map_err(|e| BridgeError::Body {
            url: url.to_string(),
            detail: e.to_string(),
        })
    }
}
