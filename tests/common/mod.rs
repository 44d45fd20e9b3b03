//! Shared utilities for integration tests.

#![allow(dead_code)]

use std::net::SocketAddr;

use axum::{body::Body, http::Request, Json, Router};
use dev_proxy::config::{ProxyConfig, RewriteConfig, RuleConfig};
use dev_proxy::{HttpServer, Shutdown};
use serde_json::{json, Value};
use tokio::net::TcpListener;

/// Serve `app` on an ephemeral local port.
pub async fn start_upstream(app: Router) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    addr
}

/// An upstream that answers every request with a JSON description of it.
pub async fn start_echo_upstream() -> SocketAddr {
    start_upstream(Router::new().fallback(echo)).await
}

async fn echo(request: Request<Body>) -> Json<Value> {
    let (parts, body) = request.into_parts();
    let bytes = axum::body::to_bytes(body, usize::MAX).await.unwrap_or_default();
    let header = |name: &str| {
        parts
            .headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
    };

    Json(json!({
        "method": parts.method.as_str(),
        "path": parts.uri.path(),
        "query": parts.uri.query(),
        "host": header("host"),
        "x_request_id": header("x-request-id"),
        "x_forwarded_for": header("x-forwarded-for"),
        "x_custom": header("x-custom"),
        "content_type": header("content-type"),
        "body": String::from_utf8_lossy(&bytes),
    }))
}

/// An address nothing listens on.
pub async fn closed_port() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    listener.local_addr().unwrap()
}

pub fn rule(name: &str, prefix: &str, target: String) -> RuleConfig {
    RuleConfig {
        name: name.into(),
        prefix: prefix.into(),
        target,
        rewrite: None,
        change_origin: true,
        forwarded_headers: false,
    }
}

pub fn rewrite(pattern: &str, replacement: &str) -> Option<RewriteConfig> {
    Some(RewriteConfig {
        pattern: pattern.into(),
        replacement: replacement.into(),
    })
}

/// Start the proxy on an ephemeral port. Keep the `Shutdown` alive for the test.
pub async fn start_proxy(config: ProxyConfig) -> (SocketAddr, Shutdown) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let server = HttpServer::new(config).unwrap();
    let shutdown = Shutdown::new();
    let server_shutdown = shutdown.subscribe();

    tokio::spawn(async move {
        let _ = server.run(listener, server_shutdown).await;
    });

    (addr, shutdown)
}

pub fn client() -> reqwest::Client {
    reqwest::Client::builder().no_proxy().build().unwrap()
}
