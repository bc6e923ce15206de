//! Fingerprint and stats streams against the devkit mock backend

use restproxy_device::{
    cancel_pair, CancelHandle, DevicePlugin, FingerprintResponse, PluginConfig, RestProxyPlugin,
    StatsResponse,
};
use restproxy_devkit::{init_tracing, unreachable_address, wait_until, BackendFixtures, MockBackend, MockReply};
use std::time::Duration;
use tokio::time::timeout;

const STEP: Duration = Duration::from_secs(2);

fn plugin_for(address: &str, period: &str) -> RestProxyPlugin {
    let mut plugin = RestProxyPlugin::new().unwrap();
    plugin
        .set_config(PluginConfig {
            address: address.to_string(),
            fingerprint_period: period.to_string(),
            request_timeout: "2s".to_string(),
        })
        .unwrap();
    plugin
}

async fn backend_with_fingerprint(ids: &[&str]) -> MockBackend {
    init_tracing();
    let backend = MockBackend::start().await.unwrap();
    backend.set_default("/fingerprint", MockReply::json(&BackendFixtures::fingerprint("acme", ids)));
    backend
}

#[tokio::test]
async fn test_fingerprint_emits_decoded_snapshot() {
    let backend = backend_with_fingerprint(&["gpu0", "gpu1"]).await;
    let plugin = plugin_for(&backend.url(), "1h");
    let (_handle, token) = cancel_pair();

    let mut stream = plugin.fingerprint(token).unwrap();
    let snapshot = timeout(STEP, stream.next()).await.unwrap().unwrap();

    let expected: FingerprintResponse =
        serde_json::from_value(BackendFixtures::fingerprint("acme", &["gpu0", "gpu1"])).unwrap();
    assert_eq!(snapshot, expected);
    assert_eq!(backend.hits("/fingerprint"), 1);
}

#[tokio::test]
async fn test_first_poll_does_not_wait_for_period() {
    let backend = backend_with_fingerprint(&["gpu0"]).await;
    let plugin = plugin_for(&backend.url(), "1h");
    let (_handle, token) = cancel_pair();

    let mut stream = plugin.fingerprint(token).unwrap();
    assert!(timeout(Duration::from_secs(1), stream.next()).await.unwrap().is_some());
}

#[tokio::test]
async fn test_failed_ticks_emit_nothing() {
    let backend = backend_with_fingerprint(&["gpu7"]).await;
    backend.push_reply("/fingerprint", MockReply::status(503, r#"{"error":"busy"}"#));
    backend.push_reply("/fingerprint", MockReply::raw("not json"));
    backend.push_reply("/fingerprint", MockReply::raw(r#"{"Devices":"nope"}"#));
    let plugin = plugin_for(&backend.url(), "30ms");
    let (_handle, token) = cancel_pair();

    let mut stream = plugin.fingerprint(token).unwrap();
    let first = timeout(STEP, stream.next()).await.unwrap().unwrap();

    // the three failing ticks were skipped, the first delivery is the fourth call
    assert_eq!(first.devices[0].devices[0].id, "gpu7");
    assert!(backend.hits("/fingerprint") >= 4);
}

#[tokio::test]
async fn test_network_failure_keeps_loop_alive() {
    init_tracing();
    let address = unreachable_address().await.unwrap();
    let plugin = plugin_for(&address, "20ms");
    let (handle, token) = cancel_pair();

    let mut stream = plugin.fingerprint(token).unwrap();
    tokio::time::sleep(Duration::from_millis(150)).await;
    assert!(stream.try_next().is_none());
    assert!(!stream.is_closed());

    handle.cancel();
    assert!(timeout(STEP, stream.next()).await.unwrap().is_none());
}

#[tokio::test]
async fn test_cancel_while_waiting_closes_stream() {
    let backend = backend_with_fingerprint(&["gpu0"]).await;
    let plugin = plugin_for(&backend.url(), "1h");
    let (handle, token) = cancel_pair();

    let mut stream = plugin.fingerprint(token).unwrap();
    assert!(timeout(STEP, stream.next()).await.unwrap().is_some());

    handle.cancel();
    assert!(timeout(STEP, stream.next()).await.unwrap().is_none());
    assert!(stream.is_closed());

    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(backend.hits("/fingerprint"), 1);
}

#[tokio::test]
async fn test_cancel_aborts_request_in_flight() {
    init_tracing();
    let backend = MockBackend::start().await.unwrap();
    backend.set_default(
        "/fingerprint",
        MockReply::json(&BackendFixtures::fingerprint("acme", &["gpu0"])).delayed(Duration::from_secs(5)),
    );
    let plugin = plugin_for(&backend.url(), "1h");
    let (handle, token) = cancel_pair();

    let mut stream = plugin.fingerprint(token).unwrap();
    assert!(wait_until(STEP, || backend.hits("/fingerprint") == 1).await);

    handle.cancel();
    let next = timeout(Duration::from_secs(1), stream.next()).await.unwrap();
    assert!(next.is_none());
}

#[tokio::test]
async fn test_cancel_while_consumer_not_ready() {
    let backend = backend_with_fingerprint(&["gpu0"]).await;
    let plugin = plugin_for(&backend.url(), "20ms");
    let (handle, token) = cancel_pair();

    let mut stream = plugin.fingerprint(token).unwrap();

    // one snapshot fills the slot, the next call blocks on delivery
    assert!(wait_until(STEP, || backend.hits("/fingerprint") >= 2).await);
    tokio::time::sleep(Duration::from_millis(150)).await;
    assert_eq!(backend.hits("/fingerprint"), 2);

    handle.cancel();
    assert!(timeout(STEP, stream.next()).await.unwrap().is_none());
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(backend.hits("/fingerprint"), 2);
}

#[tokio::test]
async fn test_dropping_consumer_stops_polling() {
    let backend = backend_with_fingerprint(&["gpu0"]).await;
    let plugin = plugin_for(&backend.url(), "20ms");
    let (_handle, token) = cancel_pair();

    let mut stream = plugin.fingerprint(token).unwrap();
    assert!(timeout(STEP, stream.next()).await.unwrap().is_some());
    drop(stream);

    tokio::time::sleep(Duration::from_millis(100)).await;
    let settled = backend.hits("/fingerprint");
    tokio::time::sleep(Duration::from_millis(150)).await;
    assert_eq!(backend.hits("/fingerprint"), settled);
}

#[tokio::test]
async fn test_dropping_cancel_handle_closes_stream() {
    let backend = backend_with_fingerprint(&["gpu0"]).await;
    let plugin = plugin_for(&backend.url(), "1h");
    let handle = CancelHandle::new();

    let mut stream = plugin.fingerprint(handle.token()).unwrap();
    assert!(timeout(STEP, stream.next()).await.unwrap().is_some());

    drop(handle);
    assert!(timeout(STEP, stream.next()).await.unwrap().is_none());
}

#[tokio::test]
async fn test_unchanged_backend_yields_identical_snapshots() {
    let backend = backend_with_fingerprint(&["gpu0", "gpu1"]).await;
    let plugin = plugin_for(&backend.url(), "20ms");
    let (_handle, token) = cancel_pair();

    let mut stream = plugin.fingerprint(token).unwrap();
    let first = timeout(STEP, stream.next()).await.unwrap().unwrap();
    let second = timeout(STEP, stream.next()).await.unwrap().unwrap();
    assert_eq!(first, second);
}

#[tokio::test]
async fn test_in_band_backend_error_is_passed_through() {
    init_tracing();
    let backend = MockBackend::start().await.unwrap();
    backend.set_default("/fingerprint", MockReply::json(&BackendFixtures::fingerprint_error("no driver")));
    let plugin = plugin_for(&backend.url(), "1h");
    let (_handle, token) = cancel_pair();

    let mut stream = plugin.fingerprint(token).unwrap();
    let snapshot = timeout(STEP, stream.next()).await.unwrap().unwrap();
    assert!(snapshot.devices.is_empty());
    assert_eq!(snapshot.error.as_deref(), Some("no driver"));
}

#[tokio::test]
async fn test_stats_stream_decodes_metrics() {
    init_tracing();
    let backend = MockBackend::start().await.unwrap();
    let body = BackendFixtures::stats("acme", &[("gpu0", 12.5), ("gpu1", 80.0)]);
    backend.set_default("/stats", MockReply::json(&body));
    let plugin = plugin_for(&backend.url(), "1h");
    let (_handle, token) = cancel_pair();

    let mut stream = plugin.stats(token, Duration::from_millis(50)).unwrap();
    let snapshot = timeout(STEP, stream.next()).await.unwrap().unwrap();

    let expected: StatsResponse = serde_json::from_value(body).unwrap();
    assert_eq!(snapshot, expected);
    let usage = snapshot.groups[0].instance_stats["gpu1"].summary.as_ref().unwrap();
    assert_eq!(usage.float_numerator_val, Some(80.0));
    assert_eq!(backend.hits("/fingerprint"), 0);
}

#[tokio::test]
async fn test_stats_streams_keep_their_own_interval() {
    init_tracing();
    let backend = MockBackend::start().await.unwrap();
    backend.set_default("/stats", MockReply::json(&BackendFixtures::stats("acme", &[("gpu0", 1.0)])));
    let plugin = plugin_for(&backend.url(), "1h");
    let (handle, token) = cancel_pair();

    let mut fast = plugin.stats(token.clone(), Duration::from_millis(50)).unwrap();
    let mut slow = plugin.stats(token, Duration::from_millis(400)).unwrap();

    let (mut fast_count, mut slow_count) = (0usize, 0usize);
    let window = tokio::time::sleep(Duration::from_millis(1000));
    tokio::pin!(window);
    loop {
        tokio::select! {
            _ = &mut window => break,
            Some(_) = fast.next() => fast_count += 1,
            Some(_) = slow.next() => slow_count += 1,
        }
    }
    handle.cancel();

    assert!(fast_count >= 8, "fast stream delivered {}", fast_count);
    assert!((2..=4).contains(&slow_count), "slow stream delivered {}", slow_count);
    assert!(timeout(STEP, fast.next()).await.unwrap().is_none());
    assert!(timeout(STEP, slow.next()).await.unwrap().is_none());
}

#[tokio::test]
async fn test_backend_recovery_resumes_deliveries() {
    init_tracing();
    let backend = MockBackend::start().await.unwrap();
    for _ in 0..3 {
        backend.push_reply("/stats", MockReply::status(500, "oops"));
    }
    backend.set_default("/stats", MockReply::json(&BackendFixtures::stats("acme", &[("gpu0", 3.0)])));
    let plugin = plugin_for(&backend.url(), "1h");
    let (_handle, token) = cancel_pair();

    let mut stream = plugin.stats(token, Duration::from_millis(20)).unwrap();
    let first = timeout(STEP, stream.next()).await.unwrap().unwrap();
    let second = timeout(STEP, stream.next()).await.unwrap().unwrap();
    assert_eq!(first, second);
    assert!(backend.hits("/stats") >= 5);
}
