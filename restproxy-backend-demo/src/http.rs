/**
 * API REST DEMO - Backend de référence pour le plugin RestProxy
 *
 * RÔLE :
 * Expose la machine locale comme un device, selon le contrat attendu par le plugin.
 *
 * ROUTES :
 * - GET  /health       -> "ok"
 * - GET  /fingerprint  -> FingerprintResponse (inventaire + santé)
 * - GET  /stats        -> StatsResponse (CPU + mémoire, échantillonnés à chaque appel)
 * - POST /reserve      -> ContainerReservation (body = liste JSON d'IDs, 400 sinon)
 */

use crate::devices::{self, LocalDevice};
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use parking_lot::Mutex;
use restproxy_device::plugin::{FINGERPRINT_ENDPOINT, RESERVE_ENDPOINT, STATS_ENDPOINT};
use restproxy_device::types::{FingerprintResponse, StatsResponse};
use serde_json::Value;
use std::sync::Arc;
use sysinfo::System;
use tracing::{debug, info};

#[derive(Clone)]
pub struct AppState {
    pub device: Arc<LocalDevice>,
    pub sys: Arc<Mutex<System>>,
}

impl AppState {
    pub fn new(sys: System) -> Self {
        let device = LocalDevice::discover(&sys);
        Self {
            device: Arc::new(device),
            sys: Arc::new(Mutex::new(sys)),
        }
    }
}

pub fn build_router(app_state: AppState) -> Router {
    Router::new()
        .route("/health", get(|| async { "ok" }))
        .route(FINGERPRINT_ENDPOINT, get(fingerprint))
        .route(STATS_ENDPOINT, get(stats))
        .route(RESERVE_ENDPOINT, post(reserve))
        .with_state(app_state)
}

// GET /fingerprint
async fn fingerprint(State(app): State<AppState>) -> Json<FingerprintResponse> {
    debug!("fingerprint requested");
    Json(app.device.fingerprint())
}

// GET /stats
async fn stats(State(app): State<AppState>) -> Json<StatsResponse> {
    let mut sys = app.sys.lock();
    Json(app.device.stats(&mut sys))
}

// POST /reserve (body: ["id1", "id2", ...])
async fn reserve(State(_app): State<AppState>, Json(body): Json<Value>) -> Response {
    let Some(device_ids) = parse_device_ids(&body) else {
        return (
            StatusCode::BAD_REQUEST,
            Json(serde_json::json!({"error": "expected a JSON list of device IDs"})),
        )
            .into_response();
    };

    info!(devices = ?device_ids, "reservation granted");
    Json(devices::reservation(&device_ids)).into_response()
}

fn parse_device_ids(body: &Value) -> Option<Vec<String>> {
    body.as_array()?
        .iter()
        .map(|v| v.as_str().map(str::to_string))
        .collect()
}
