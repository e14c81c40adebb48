//! End-to-end failover tests against mock upstreams.

mod common;

use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use market_proxy::config::ProxyConfig;
use market_proxy::http::HttpServer;
use market_proxy::lifecycle::Shutdown;
use market_proxy::proxy::RelayMode;
use market_proxy::upstream::Strategy;

fn base_config(bases: Vec<String>) -> ProxyConfig {
    let mut config = ProxyConfig::default();
    config.upstreams.bases = bases;
    config.timeouts.probe_secs = 1;
    config.timeouts.forward_secs = 2;
    config.timeouts.request_secs = 10;
    config.observability.metrics_enabled = false;
    config
}

async fn spawn_proxy(config: ProxyConfig) -> (SocketAddr, Shutdown) {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let shutdown = Shutdown::new();
    let rx = shutdown.subscribe();
    let server = HttpServer::new(config).unwrap();

    tokio::spawn(async move {
        let _ = server.run(listener, rx).await;
    });

    for _ in 0..50 {
        if tokio::net::TcpStream::connect(addr).await.is_ok() {
            return (addr, shutdown);
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    panic!("proxy did not come up on {addr}");
}

fn client() -> reqwest::Client {
    reqwest::Client::builder().no_proxy().build().unwrap()
}

fn http_base(addr: SocketAddr) -> String {
    format!("http://{addr}")
}

#[tokio::test]
async fn sticky_failover_skips_dead_upstream_and_caches() {
    let dead = common::refused_addr().await;

    let paths = Arc::new(Mutex::new(Vec::<String>::new()));
    let seen = paths.clone();
    let alive = common::start_programmable_upstream(move |path| {
        seen.lock().unwrap().push(path.to_string());
        (200, "application/json", r#"{"serverTime":1724567890}"#.to_string())
    })
    .await;

    let config = base_config(vec![http_base(dead), http_base(alive)]);
    let (proxy, shutdown) = spawn_proxy(config).await;

    let client = client();
    for _ in 0..2 {
        let res = client
            .get(format!("http://{proxy}/api/v3/time"))
            .send()
            .await
            .unwrap();
        assert_eq!(res.status(), 200);
        let body: serde_json::Value = res.json().await.unwrap();
        assert_eq!(body["serverTime"], 1724567890);
    }

    let paths = paths.lock().unwrap().clone();
    let pings = paths.iter().filter(|p| *p == "/api/v3/ping").count();
    let datas = paths.iter().filter(|p| *p == "/api/v3/time").count();
    assert_eq!(pings, 1, "sticky selection should probe once and cache");
    assert_eq!(datas, 2);

    shutdown.trigger();
}

#[tokio::test]
async fn all_upstreams_dead_returns_aggregate_error() {
    let a = common::refused_addr().await;
    let b = common::refused_addr().await;

    let config = base_config(vec![http_base(a), http_base(b)]);
    let (proxy, shutdown) = spawn_proxy(config).await;

    let res = client()
        .get(format!("http://{proxy}/api/v3/time"))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 500);

    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["error"], "All bases failed");
    let tried = body["tried"].as_array().unwrap();
    assert_eq!(tried.len(), 2, "both candidates should be named: {tried:?}");

    shutdown.trigger();
}

#[tokio::test]
async fn round_robin_alternates_between_upstreams() {
    let a = common::start_mock_upstream("application/json", r#"{"who":"a"}"#).await;
    let b = common::start_mock_upstream("application/json", r#"{"who":"b"}"#).await;

    let mut config = base_config(vec![http_base(a), http_base(b)]);
    config.selector.strategy = Strategy::RoundRobin;
    let (proxy, shutdown) = spawn_proxy(config).await;

    let client = client();
    let mut order = Vec::new();
    for _ in 0..4 {
        let body: serde_json::Value = client
            .get(format!("http://{proxy}/api/v3/time"))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        order.push(body["who"].as_str().unwrap().to_string());
    }
    assert_eq!(order, ["a", "b", "a", "b"]);

    shutdown.trigger();
}

#[tokio::test]
async fn passthrough_relays_non_json_body_verbatim() {
    let text = "plain text, definitely not json";
    let alive = common::start_mock_upstream("text/plain", text).await;

    let config = base_config(vec![http_base(alive)]);
    let (proxy, shutdown) = spawn_proxy(config).await;

    let res = client()
        .get(format!("http://{proxy}/api/v3/exchangeInfo"))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 200);
    assert_eq!(
        res.headers().get("content-type").unwrap().to_str().unwrap(),
        "text/plain"
    );
    assert_eq!(res.bytes().await.unwrap(), text.as_bytes());

    shutdown.trigger();
}

#[tokio::test]
async fn strict_mode_rotates_on_invalid_json() {
    let a_hits = Arc::new(AtomicUsize::new(0));
    let ah = a_hits.clone();
    let a = common::start_programmable_upstream(move |_path| {
        ah.fetch_add(1, Ordering::SeqCst);
        (200, "text/html", "<p>maintenance".to_string())
    })
    .await;
    let b = common::start_mock_upstream("application/json", r#"{"ok":true}"#).await;

    let mut config = base_config(vec![http_base(a), http_base(b)]);
    config.selector.strategy = Strategy::RoundRobin;
    config.relay.mode = RelayMode::Strict;
    let (proxy, shutdown) = spawn_proxy(config).await;

    let res = client()
        .get(format!("http://{proxy}/api/v3/depth"))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 200);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["ok"], true);
    assert_eq!(a_hits.load(Ordering::SeqCst), 1);

    shutdown.trigger();
}

#[tokio::test]
async fn retry_is_bounded_at_two_attempts() {
    let hits = Arc::new(AtomicUsize::new(0));
    let h = hits.clone();
    let garbage = common::start_programmable_upstream(move |_path| {
        h.fetch_add(1, Ordering::SeqCst);
        (200, "text/html", "<p>not json".to_string())
    })
    .await;

    let mut config = base_config(vec![http_base(garbage)]);
    config.selector.strategy = Strategy::RoundRobin;
    config.relay.mode = RelayMode::Strict;
    let (proxy, shutdown) = spawn_proxy(config).await;

    let res = client()
        .get(format!("http://{proxy}/api/v3/depth"))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 500);

    let body: serde_json::Value = res.json().await.unwrap();
    assert!(body["error"].as_str().unwrap().contains("invalid JSON"));
    assert_eq!(body["tried"].as_array().unwrap().len(), 1);
    assert_eq!(
        hits.load(Ordering::SeqCst),
        2,
        "exactly one retry, then give up"
    );

    shutdown.trigger();
}

#[tokio::test]
async fn path_bearing_base_keeps_its_prefix() {
    let paths = Arc::new(Mutex::new(Vec::<String>::new()));
    let seen = paths.clone();
    let alive = common::start_programmable_upstream(move |path| {
        seen.lock().unwrap().push(path.to_string());
        (200, "application/json", r#"{"ok":true}"#.to_string())
    })
    .await;

    let config = base_config(vec![format!("http://{alive}/gateway")]);
    let (proxy, shutdown) = spawn_proxy(config).await;

    let res = client()
        .get(format!("http://{proxy}/api/v3/time"))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 200);

    let paths = paths.lock().unwrap().clone();
    assert!(
        paths.contains(&"/gateway/api/v3/ping".to_string()),
        "probe lost the base path: {paths:?}"
    );
    assert!(
        paths.contains(&"/gateway/api/v3/time".to_string()),
        "forward lost the base path: {paths:?}"
    );

    shutdown.trigger();
}

#[tokio::test]
async fn prices_shortcut_summarises_and_forwards_query() {
    let paths = Arc::new(Mutex::new(Vec::<String>::new()));
    let seen = paths.clone();
    let alive = common::start_programmable_upstream(move |path| {
        seen.lock().unwrap().push(path.to_string());
        if path.starts_with("/api/v3/ticker/price") {
            (
                200,
                "application/json",
                r#"[{"symbol":"BTCUSDT","price":"97000.1"},{"symbol":"ETHUSDT","price":"3500.2"}]"#
                    .to_string(),
            )
        } else {
            (200, "application/json", "{}".to_string())
        }
    })
    .await;

    let config = base_config(vec![http_base(alive)]);
    let (proxy, shutdown) = spawn_proxy(config).await;

    let client = client();
    let res = client
        .get(format!("http://{proxy}/prices"))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 200);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["count"], 2);
    assert!(body["base"].as_str().unwrap().contains(&alive.to_string()));
    assert!(body["prices"].is_array());

    let res = client
        .get(format!(
            "http://{proxy}/prices?symbols=%5B%22BTCUSDT%22%5D"
        ))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 200);

    let paths = paths.lock().unwrap().clone();
    assert!(paths.iter().any(|p| p == "/api/v3/ticker/price"));
    assert!(paths
        .iter()
        .any(|p| p.starts_with("/api/v3/ticker/price?symbols=")));

    shutdown.trigger();
}
