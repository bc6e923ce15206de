/**
 * RESTPROXY BACKEND DEMO - Point d'entrée du backend de référence
 *
 * RÔLE : Sert /fingerprint, /stats et /reserve pour la machine locale afin de
 * faire tourner le plugin de bout en bout sans matériel dédié.
 *
 * CONFIG : RESTPROXY_DEMO_ADDR (défaut 127.0.0.1:5656), RUST_LOG.
 */

mod devices;
mod http;

use anyhow::{Context, Result};
use std::net::SocketAddr;
use sysinfo::System;
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok(); // Ok si .env n'existe pas

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let addr: SocketAddr = std::env::var("RESTPROXY_DEMO_ADDR")
        .unwrap_or_else(|_| "127.0.0.1:5656".into())
        .parse()
        .context("Invalid RESTPROXY_DEMO_ADDR")?;

    let mut sys = System::new_all();
    sys.refresh_all();
    let app_state = http::AppState::new(sys);
    info!(device = %app_state.device.id, model = %app_state.device.model, "local device discovered");

    let app = http::build_router(app_state);

    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    info!("listening on http://{addr}");
    axum::serve(listener, app).await.context("HTTP server failed")?;
    Ok(())
}
