//! Device plugin contract and its REST-backed implementation
//!
//! The host orchestrator drives a plugin through [`DevicePlugin`]:
//! - discovery (`plugin_info`, `config_schema`)
//! - configuration (`set_config`)
//! - two long-running streams (`fingerprint`, `stats`)
//! - one synchronous action (`reserve`)

use crate::cancel::CancelToken;
use crate::config::{
    PluginConfig, Settings, DEFAULT_ADDRESS, DEFAULT_FINGERPRINT_PERIOD, DEFAULT_REQUEST_TIMEOUT,
};
use crate::error::{ProxyError, Result};
use crate::poller::{Poller, SnapshotStream};
use crate::transport::HttpTransport;
use crate::types::{ContainerReservation, FingerprintResponse, StatsResponse};
use async_trait::async_trait;
use reqwest::Method;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

pub const PLUGIN_NAME: &str = "rest-proxy-device";
pub const PLUGIN_VERSION: &str = "v0.1.0";
pub const DEVICE_API_VERSION: &str = "0.1.0";

pub const FINGERPRINT_ENDPOINT: &str = "/fingerprint";
pub const STATS_ENDPOINT: &str = "/stats";
pub const RESERVE_ENDPOINT: &str = "/reserve";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PluginType {
    Device,
}

/// Identity reported to the host while it discovers plugins
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PluginInfo {
    pub plugin_type: PluginType,
    pub api_versions: Vec<String>,
    pub version: String,
    pub name: String,
}

/// One entry of the configuration schema handed to the host
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConfigAttribute {
    pub name: &'static str,
    pub kind: &'static str,
    pub required: bool,
    pub default: &'static str,
}

/// Capability set a device plugin exposes to its host
#[async_trait]
pub trait DevicePlugin: Send + Sync {
    fn plugin_info(&self) -> PluginInfo;

    fn config_schema(&self) -> Vec<ConfigAttribute>;

    fn set_config(&mut self, config: PluginConfig) -> Result<()>;

    /// Stream device inventory/health. Returns immediately; the stream closes
    /// when `cancel` fires.
    fn fingerprint(&self, cancel: CancelToken) -> Result<SnapshotStream<FingerprintResponse>>;

    /// Stream per-device metrics every `interval`
    fn stats(&self, cancel: CancelToken, interval: Duration) -> Result<SnapshotStream<StatsResponse>>;

    /// Reserve `device_ids` ahead of a workload
    async fn reserve(&self, device_ids: &[String]) -> Result<ContainerReservation>;
}

/// Device plugin proxying every call to a REST backend
#[derive(Debug, Clone)]
pub struct RestProxyPlugin {
    settings: Settings,
    transport: Arc<HttpTransport>,
}

impl RestProxyPlugin {
    /// Plugin with default settings, before the host calls `set_config`
    pub fn new() -> Result<Self> {
        Self::from_settings(Settings::default())
    }

    pub fn from_settings(settings: Settings) -> Result<Self> {
        let transport = Arc::new(HttpTransport::new(&settings)?);
        Ok(Self {
            settings,
            transport,
        })
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn transport(&self) -> Arc<HttpTransport> {
        Arc::clone(&self.transport)
    }
}

#[async_trait]
impl DevicePlugin for RestProxyPlugin {
    fn plugin_info(&self) -> PluginInfo {
        PluginInfo {
            plugin_type: PluginType::Device,
            api_versions: vec![DEVICE_API_VERSION.to_string()],
            version: PLUGIN_VERSION.to_string(),
            name: PLUGIN_NAME.to_string(),
        }
    }

    fn config_schema(&self) -> Vec<ConfigAttribute> {
        vec![
            ConfigAttribute {
                name: "address",
                kind: "string",
                required: false,
                default: DEFAULT_ADDRESS,
            },
            ConfigAttribute {
                name: "fingerprint_period",
                kind: "string",
                required: false,
                default: DEFAULT_FINGERPRINT_PERIOD,
            },
            ConfigAttribute {
                name: "request_timeout",
                kind: "string",
                required: false,
                default: DEFAULT_REQUEST_TIMEOUT,
            },
        ]
    }

    fn set_config(&mut self, config: PluginConfig) -> Result<()> {
        let settings = config.parse()?;
        self.transport = Arc::new(HttpTransport::new(&settings)?);
        self.settings = settings;

        info!(
            address = %self.settings.address,
            fingerprint_period = ?self.settings.fingerprint_period,
            request_timeout = ?self.settings.request_timeout,
            "config set"
        );
        Ok(())
    }

    fn fingerprint(&self, cancel: CancelToken) -> Result<SnapshotStream<FingerprintResponse>> {
        let poller = Poller::new(
            self.transport(),
            "fingerprint",
            FINGERPRINT_ENDPOINT,
            self.settings.fingerprint_period,
        );
        Ok(poller.spawn(cancel))
    }

    fn stats(&self, cancel: CancelToken, interval: Duration) -> Result<SnapshotStream<StatsResponse>> {
        if interval.is_zero() {
            return Err(ProxyError::Config("stats interval must be greater than zero".into()));
        }
        let poller = Poller::new(self.transport(), "stats", STATS_ENDPOINT, interval);
        Ok(poller.spawn(cancel))
    }

    async fn reserve(&self, device_ids: &[String]) -> Result<ContainerReservation> {
        debug!(devices = ?device_ids, "reserving devices");
        self.transport
            .request(Method::POST, RESERVE_ENDPOINT, Some(device_ids), None)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cancel::cancel_pair;
    use crate::error::ErrorKind;

    #[test]
    fn test_plugin_info() {
        let plugin = RestProxyPlugin::new().unwrap();
        let info = plugin.plugin_info();
        assert_eq!(info.name, "rest-proxy-device");
        assert_eq!(info.plugin_type, PluginType::Device);
        assert_eq!(info.api_versions, vec!["0.1.0".to_string()]);
    }

    #[test]
    fn test_config_schema_lists_defaults() {
        let plugin = RestProxyPlugin::new().unwrap();
        let schema = plugin.config_schema();
        let names: Vec<_> = schema.iter().map(|a| a.name).collect();
        assert_eq!(names, vec!["address", "fingerprint_period", "request_timeout"]);
        assert!(schema.iter().all(|a| !a.required && a.kind == "string"));
        assert_eq!(schema[1].default, "1m");
    }

    #[test]
    fn test_set_config_replaces_settings() {
        let mut plugin = RestProxyPlugin::new().unwrap();
        plugin
            .set_config(PluginConfig {
                address: "http://10.1.2.3:9000/".into(),
                fingerprint_period: "5s".into(),
                request_timeout: "2s".into(),
            })
            .unwrap();
        assert_eq!(plugin.settings().fingerprint_period, Duration::from_secs(5));
        assert_eq!(plugin.transport().base().as_str(), "http://10.1.2.3:9000/");
    }

    #[test]
    fn test_set_config_keeps_previous_settings_on_error() {
        let mut plugin = RestProxyPlugin::new().unwrap();
        let err = plugin
            .set_config(PluginConfig { fingerprint_period: "often".into(), ..Default::default() })
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Config);
        assert_eq!(plugin.settings(), &Settings::default());
    }

    #[tokio::test]
    async fn test_stats_rejects_zero_interval() {
        let plugin = RestProxyPlugin::new().unwrap();
        let (_handle, token) = cancel_pair();
        let err = plugin.stats(token, Duration::ZERO).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Config);
    }
}
