//! Plugin configuration
//!
//! Handles:
//! - Raw host-supplied settings (strings, with defaults)
//! - Parsing into typed [`Settings`] (URL + durations)
//! - Runner config file loading (TOML)

use crate::error::{ProxyError, Result};
use reqwest::Url;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

pub const DEFAULT_ADDRESS: &str = "http://127.0.0.1:5656/";
pub const DEFAULT_FINGERPRINT_PERIOD: &str = "1m";
pub const DEFAULT_REQUEST_TIMEOUT: &str = "10s";
pub const DEFAULT_STATS_INTERVAL: &str = "10s";

/// Plugin settings as supplied by the host, before parsing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PluginConfig {
    pub address: String,
    pub fingerprint_period: String,
    pub request_timeout: String,
}

impl Default for PluginConfig {
    fn default() -> Self {
        Self {
            address: DEFAULT_ADDRESS.to_string(),
            fingerprint_period: DEFAULT_FINGERPRINT_PERIOD.to_string(),
            request_timeout: DEFAULT_REQUEST_TIMEOUT.to_string(),
        }
    }
}

/// Parsed settings, immutable once a transport is built from them
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub address: Url,
    pub fingerprint_period: Duration,
    pub request_timeout: Duration,
}

impl PluginConfig {
    pub fn parse(&self) -> Result<Settings> {
        let address = Url::parse(&self.address)
            .map_err(|e| ProxyError::Config(format!("invalid address {:?}: {}", self.address, e)))?;
        if address.cannot_be_a_base() {
            return Err(ProxyError::Config(format!(
                "invalid address {:?}: not a base URL",
                self.address
            )));
        }

        Ok(Settings {
            address,
            fingerprint_period: parse_period("fingerprint_period", &self.fingerprint_period)?,
            request_timeout: parse_period("request_timeout", &self.request_timeout)?,
        })
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            address: Url::parse(DEFAULT_ADDRESS).expect("default address is a valid URL"),
            fingerprint_period: Duration::from_secs(60),
            request_timeout: Duration::from_secs(10),
        }
    }
}

/// Parse a human duration ("30s", "1m", "1h 30m") and reject zero
pub fn parse_period(name: &str, raw: &str) -> Result<Duration> {
    let period = humantime::parse_duration(raw.trim())
        .map_err(|e| ProxyError::Config(format!("invalid {} {:?}: {}", name, raw, e)))?;
    if period.is_zero() {
        return Err(ProxyError::Config(format!("{} must be greater than zero", name)));
    }
    Ok(period)
}

/// Runner binary configuration (`restproxy.toml`)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunnerConfig {
    pub plugin: PluginConfig,
    pub runner: RunnerSection,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunnerSection {
    /// Interval requested for the stats stream
    pub stats_interval: String,
    /// Devices to reserve once at start-up
    pub reserve: Vec<String>,
}

impl Default for RunnerSection {
    fn default() -> Self {
        Self {
            stats_interval: DEFAULT_STATS_INTERVAL.to_string(),
            reserve: Vec::new(),
        }
    }
}

impl RunnerConfig {
    /// Load from `RESTPROXY_CONFIG` (default `restproxy.toml`), defaults if absent
    pub async fn load() -> anyhow::Result<Self> {
        let path = std::env::var("RESTPROXY_CONFIG").unwrap_or_else(|_| "restproxy.toml".into());
        Self::load_from(&path).await
    }

    pub async fn load_from<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            tracing::info!(path = %path.display(), "no config file, using defaults");
            return Ok(Self::default());
        }

        let content = tokio::fs::read_to_string(path).await?;
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        let config: RunnerConfig = toml::from_str(&content)?;
        Ok(config)
    }
}
