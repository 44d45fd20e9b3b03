//! Upstream dispatch.
//!
//! # Responsibilities
//! - Rewrite the path and build the upstream URL for a matched rule
//! - Copy method, headers and body to the outbound request
//! - Stream the upstream status, headers and body back to the caller
//!
//! # Design Decisions
//! - Request bodies are buffered up to the configured limit
//! - Response bodies are streamed, never buffered
//! - Redirects are relayed to the caller, not followed
//! - The outbound call lives inside the handler future, so a caller
//!   disconnect drops it and cancels the upstream request

use std::net::SocketAddr;
use std::time::Duration;

use axum::body::Body;
use axum::http::header::CONTENT_LENGTH;
use axum::http::{Request, Response};
use futures_util::StreamExt;

use crate::config::ProxyConfig;
use crate::http::headers::{outbound_headers, strip_hop_by_hop};
use crate::http::request::RequestIdExt;
use crate::http::response::ProxyError;
use crate::observability::metrics;
use crate::resilience::timeouts::{from_secs, with_deadline};
use crate::routing::{RewriteOutcome, Rule};

/// Sends matched requests to their rule's upstream.
#[derive(Debug, Clone)]
pub struct Forwarder {
    client: reqwest::Client,
    upstream_timeout: Option<Duration>,
    max_body_bytes: usize,
}

impl Forwarder {
    /// Build the upstream client from configuration.
    pub fn from_config(config: &ProxyConfig) -> Result<Self, reqwest::Error> {
        let mut builder = reqwest::Client::builder().redirect(reqwest::redirect::Policy::none());
        if let Some(connect) = from_secs(config.timeouts.connect_secs) {
            builder = builder.connect_timeout(connect);
        }
        if !config.upstream.use_env_proxy {
            builder = builder.no_proxy();
        }

        Ok(Self {
            client: builder.build()?,
            upstream_timeout: from_secs(config.timeouts.upstream_secs),
            max_body_bytes: config.limits.max_body_bytes,
        })
    }

    /// Forward `request` according to `rule` and relay the upstream response.
    pub async fn forward(
        &self,
        rule: &Rule,
        request: Request<Body>,
        client_addr: Option<SocketAddr>,
    ) -> Result<Response<Body>, ProxyError> {
        let request_id = request.request_id().to_owned();
        let (parts, body) = request.into_parts();

        let path = parts.uri.path();
        let (rewritten, outcome) = rule.rewrite_path(path);
        if outcome == RewriteOutcome::NoOp {
            tracing::warn!(
                request_id = %request_id,
                rule = %rule.name(),
                path = %path,
                pattern = rule.rewrite().map(|r| r.pattern()).unwrap_or_default(),
                "Rewrite pattern did not match; forwarding original path"
            );
            metrics::record_rewrite_noop(rule.name());
        }

        let url = rule
            .upstream_url(&rewritten, parts.uri.query())
            .map_err(|source| ProxyError::InvalidUpstreamUrl {
                rule: rule.name().to_string(),
                source,
            })?;

        if let Some(declared) = parts
            .headers
            .get(CONTENT_LENGTH)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.parse::<usize>().ok())
        {
            if declared > self.max_body_bytes {
                return Err(ProxyError::PayloadTooLarge {
                    limit: self.max_body_bytes,
                });
            }
        }
        let body = read_body(body, self.max_body_bytes).await?;

        tracing::debug!(
            request_id = %request_id,
            rule = %rule.name(),
            method = %parts.method,
            upstream = %url,
            "Forwarding to upstream"
        );

        let outbound = self
            .client
            .request(parts.method.clone(), url.clone())
            .headers(outbound_headers(&parts.headers, rule, client_addr))
            .body(body)
            .send();

        let upstream = match with_deadline(self.upstream_timeout, outbound).await {
            Ok(Ok(response)) => response,
            Ok(Err(e)) => return Err(ProxyError::from_upstream(url.as_str(), e)),
            Err(_) => {
                return Err(ProxyError::UpstreamTimeout {
                    url: url.to_string(),
                })
            }
        };

        let status = upstream.status();
        let mut headers = upstream.headers().clone();
        strip_hop_by_hop(&mut headers);

        let mut response = Response::new(Body::from_stream(upstream.bytes_stream()));
        *response.status_mut() = status;
        *response.headers_mut() = headers;
        Ok(response)
    }
}

/// Collect the request body, failing once it grows past `limit`.
async fn read_body(body: Body, limit: usize) -> Result<Vec<u8>, ProxyError> {
    let mut stream = body.into_data_stream();
    let mut buf = Vec::new();
    while let Some(chunk) = stream.next().await {
        let chunk = chunk.map_err(ProxyError::RequestBody)?;
        if buf.len() + chunk.len() > limit {
            return Err(ProxyError::PayloadTooLarge { limit });
        }
        buf.extend_from_slice(&chunk);
    }
    Ok(buf)
}
