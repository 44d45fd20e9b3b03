//! Failure injection tests for the dev proxy.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::{
    http::{header::LOCATION, StatusCode},
    response::IntoResponse,
    routing::{any, get},
    Router,
};
use dev_proxy::config::ProxyConfig;
use tokio::io::AsyncWriteExt;
use tokio::net::TcpStream;

mod common;

#[tokio::test]
async fn refused_upstream_maps_to_bad_gateway_and_router_keeps_serving() {
    let dead = common::closed_port().await;
    let live = common::start_echo_upstream().await;

    let mut config = ProxyConfig::default();
    config
        .rules
        .push(common::rule("dead", "/dead", format!("http://{}", dead)));
    config
        .rules
        .push(common::rule("live", "/live", format!("http://{}", live)));
    let (proxy, _shutdown) = common::start_proxy(config).await;
    let client = common::client();

    let res = client
        .post(format!("http://{}/dead/send", proxy))
        .send()
        .await
        .expect("Proxy unreachable");
    assert_eq!(res.status(), StatusCode::BAD_GATEWAY);

    let res = client
        .get(format!("http://{}/live/ping", proxy))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK, "Router should keep serving after a failure");
}

#[tokio::test]
async fn slow_upstream_maps_to_gateway_timeout() {
    let slow = common::start_upstream(Router::new().fallback(|| async {
        tokio::time::sleep(Duration::from_secs(10)).await;
        "late"
    }))
    .await;

    let mut config = ProxyConfig::default();
    config.timeouts.upstream_secs = Some(1);
    config
        .rules
        .push(common::rule("slow", "/slow", format!("http://{}", slow)));
    let (proxy, _shutdown) = common::start_proxy(config).await;

    let start = Instant::now();
    let res = common::client()
        .get(format!("http://{}/slow", proxy))
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::GATEWAY_TIMEOUT);
    assert!(start.elapsed() < Duration::from_secs(5), "Timeout should fire near the deadline");
}

#[tokio::test]
async fn upstream_error_status_passes_through() {
    let failing = common::start_upstream(Router::new().route(
        "/webhook",
        any(|| async {
            (
                StatusCode::SERVICE_UNAVAILABLE,
                [("x-upstream", "n8n")],
                "Workflow is not active",
            )
        }),
    ))
    .await;

    let mut config = ProxyConfig::default();
    let mut rule = common::rule("send-email", "/api/send-email", format!("http://{}", failing));
    rule.rewrite = common::rewrite("^/api/send-email", "/webhook");
    config.rules.push(rule);
    let (proxy, _shutdown) = common::start_proxy(config).await;

    let res = common::client()
        .post(format!("http://{}/api/send-email", proxy))
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(res.headers().get("x-upstream").unwrap(), "n8n");
    assert_eq!(res.text().await.unwrap(), "Workflow is not active");
}

#[tokio::test]
async fn redirects_are_relayed_not_followed() {
    let redirecting = common::start_upstream(Router::new().route(
        "/old",
        get(|| async { (StatusCode::FOUND, [(LOCATION, "/new")]).into_response() }),
    ))
    .await;

    let mut config = ProxyConfig::default();
    config
        .rules
        .push(common::rule("old", "/old", format!("http://{}", redirecting)));
    let (proxy, _shutdown) = common::start_proxy(config).await;

    let client = reqwest::Client::builder()
        .no_proxy()
        .redirect(reqwest::redirect::Policy::none())
        .build()
        .unwrap();
    let res = client.get(format!("http://{}/old", proxy)).send().await.unwrap();

    assert_eq!(res.status(), StatusCode::FOUND);
    assert_eq!(res.headers().get(LOCATION).unwrap(), "/new");
}

#[tokio::test]
async fn concurrent_requests_do_not_block_each_other() {
    let slow = common::start_upstream(Router::new().fallback(|| async {
        tokio::time::sleep(Duration::from_millis(1500)).await;
        "slow"
    }))
    .await;
    let fast = common::start_echo_upstream().await;

    let mut config = ProxyConfig::default();
    config
        .rules
        .push(common::rule("slow", "/slow", format!("http://{}", slow)));
    config
        .rules
        .push(common::rule("fast", "/fast", format!("http://{}", fast)));
    let (proxy, _shutdown) = common::start_proxy(config).await;
    let client = common::client();

    let slow_client = client.clone();
    let slow_url = format!("http://{}/slow", proxy);
    let slow_request = tokio::spawn(async move { slow_client.get(&slow_url).send().await });

    tokio::time::sleep(Duration::from_millis(100)).await;

    let res = client
        .get(format!("http://{}/fast", proxy))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    assert!(!slow_request.is_finished(), "Fast request should complete while slow is in flight");

    let slow_res = slow_request.await.unwrap().unwrap();
    assert_eq!(slow_res.status(), StatusCode::OK);
    assert_eq!(slow_res.text().await.unwrap(), "slow");
}

/// Sets its flag when the upstream handler future is dropped.
struct DropFlag(Arc<AtomicBool>);

impl Drop for DropFlag {
    fn drop(&mut self) {
        self.0.store(true, Ordering::SeqCst);
    }
}

#[tokio::test]
async fn caller_disconnect_cancels_upstream_call() {
    let dropped = Arc::new(AtomicBool::new(false));
    let flag = dropped.clone();
    let slow = common::start_upstream(Router::new().fallback(move || {
        let guard = DropFlag(flag.clone());
        async move {
            tokio::time::sleep(Duration::from_secs(30)).await;
            drop(guard);
            "late"
        }
    }))
    .await;

    let mut config = ProxyConfig::default();
    config
        .rules
        .push(common::rule("slow", "/slow", format!("http://{}", slow)));
    let (proxy, _shutdown) = common::start_proxy(config).await;

    let mut stream = TcpStream::connect(proxy).await.unwrap();
    stream
        .write_all(b"GET /slow HTTP/1.1\r\nHost: localhost\r\n\r\n")
        .await
        .unwrap();
    tokio::time::sleep(Duration::from_millis(300)).await;
    assert!(!dropped.load(Ordering::SeqCst), "Upstream call should still be in flight");
    drop(stream);

    let deadline = Instant::now() + Duration::from_secs(5);
    while !dropped.load(Ordering::SeqCst) && Instant::now() < deadline {
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
    assert!(
        dropped.load(Ordering::SeqCst),
        "Upstream handler should be dropped after the caller disconnects"
    );
}
