//! Per-process request configuration.
//!
//! The values here are read once at startup and then handed to every
//! [`Request`](crate::http::request::Request) that is built. Nothing in this
//! module is a global: a host running several transactions at once shares a
//! `RequestConfig` by reference (or `Arc`) and never mutates it mid-flight.

use serde::Deserialize;
use std::path::Path;
use thiserror::Error;
use tracing::warn;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("fail to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("fail to deserialize config file: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Which proxy headers are believed when the peer is a trusted proxy.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct TrustedHeaders {
    pub forwarded: bool,
    pub x_forwarded_for: bool,
    pub x_forwarded_host: bool,
    pub x_forwarded_proto: bool,
    pub x_forwarded_port: bool,
}

impl Default for TrustedHeaders {
    fn default() -> Self {
        Self {
            forwarded: true,
            x_forwarded_for: true,
            x_forwarded_host: true,
            x_forwarded_proto: true,
            x_forwarded_port: true,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RequestConfig {
    /// Honor a `_method` body/query parameter on POST requests.
    pub http_method_parameter_override: bool,

    /// IPs or CIDR blocks. `REMOTE_ADDR` trusts whatever peer connected.
    pub trusted_proxies: Vec<String>,

    pub trusted_headers: TrustedHeaders,

    pub default_charset: String,
}

impl Default for RequestConfig {
    fn default() -> Self {
        Self {
            http_method_parameter_override: false,
            trusted_proxies: Vec::new(),
            trusted_headers: TrustedHeaders::default(),
            default_charset: "UTF-8".to_string(),
        }
    }
}

impl RequestConfig {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Ok(toml::from_str::<RequestConfig>(&content)?)
    }

    /// Like [`RequestConfig::load`] but falls back to the defaults.
    pub fn from_file(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        match Self::load(path) {
            Ok(config) => config,
            Err(err) => {
                warn!(path = %path.display(), error = %err, "fall back to default config");
                RequestConfig::default()
            }
        }
    }
}
