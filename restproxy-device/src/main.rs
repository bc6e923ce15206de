//! RestProxy device runner
//!
//! Stands in for the host orchestrator so the plugin can run on its own:
//! - Loads `restproxy.toml` (or `RESTPROXY_CONFIG`) and applies it via `set_config`
//! - Starts one fingerprint stream and one stats stream
//! - Optionally reserves the configured devices once
//! - Logs every snapshot until Ctrl-C

use anyhow::{Context, Result};
use restproxy_device::config::parse_period;
use restproxy_device::{
    CancelHandle, DevicePlugin, FingerprintResponse, RestProxyPlugin, RunnerConfig, StatsResponse,
};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok(); // Ok si .env n'existe pas

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = RunnerConfig::load().await.context("Failed to load runner config")?;
    let stats_interval = parse_period("stats_interval", &config.runner.stats_interval)?;

    let mut plugin = RestProxyPlugin::new().context("Failed to create plugin")?;
    let plugin_info = plugin.plugin_info();
    info!(name = %plugin_info.name, version = %plugin_info.version, "starting device plugin");
    plugin
        .set_config(config.plugin.clone())
        .context("Invalid plugin configuration")?;

    if !config.runner.reserve.is_empty() {
        match plugin.reserve(&config.runner.reserve).await {
            Ok(reservation) => info!(
                devices = ?config.runner.reserve,
                envs = reservation.envs.len(),
                mounts = reservation.mounts.len(),
                device_specs = reservation.devices.len(),
                "reservation granted"
            ),
            Err(e) => error!(devices = ?config.runner.reserve, error = %e, "reservation failed"),
        }
    }

    let shutdown = CancelHandle::new();
    let mut fingerprints = plugin.fingerprint(shutdown.token())?;
    let mut stats = plugin.stats(shutdown.token(), stats_interval)?;

    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    let (mut fp_open, mut stats_open) = (true, true);
    while fp_open || stats_open {
        tokio::select! {
            res = &mut ctrl_c => {
                if let Err(e) = res {
                    warn!(error = %e, "failed to listen for Ctrl-C");
                }
                info!("shutting down streams");
                shutdown.cancel();
                break;
            }
            fp = fingerprints.next(), if fp_open => match fp {
                Some(fp) => log_fingerprint(&fp),
                None => fp_open = false,
            },
            st = stats.next(), if stats_open => match st {
                Some(st) => log_stats(&st),
                None => stats_open = false,
            },
        }
    }

    info!("device plugin stopped");
    Ok(())
}

fn log_fingerprint(fp: &FingerprintResponse) {
    if let Some(err) = &fp.error {
        warn!(error = %err, "backend reported fingerprint error");
    }
    for group in &fp.devices {
        let healthy = group.devices.iter().filter(|d| d.healthy).count();
        info!(
            vendor = %group.vendor,
            device_type = %group.r#type,
            name = %group.name,
            devices = group.devices.len(),
            healthy,
            "fingerprint"
        );
    }
}

fn log_stats(stats: &StatsResponse) {
    if let Some(err) = &stats.error {
        warn!(error = %err, "backend reported stats error");
    }
    for group in &stats.groups {
        info!(
            vendor = %group.vendor,
            device_type = %group.r#type,
            name = %group.name,
            instances = group.instance_stats.len(),
            "stats"
        );
    }
}
