//! Error responses for failed forwards.
//!
//! # Responsibilities
//! - Classify failures on the way to and from the upstream
//! - Map them to gateway status codes
//!
//! # Design Decisions
//! - Upstream error statuses are never translated; only transport failures map here
//! - Connection failures result in 502 Bad Gateway
//! - Upstream timeouts result in 504 Gateway Timeout

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;

/// Failure while forwarding a request.
#[derive(Debug, Error)]
pub enum ProxyError {
    /// Connecting to or talking with the upstream failed.
    #[error("upstream {url} unreachable: {source}")]
    UpstreamUnreachable {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// The upstream did not answer before the deadline.
    #[error("upstream {url} timed out")]
    UpstreamTimeout { url: String },

    /// The rewritten path did not produce a valid URL.
    #[error("rule '{rule}' produced an invalid upstream URL: {source}")]
    InvalidUpstreamUrl {
        rule: String,
        #[source]
        source: url::ParseError,
    },

    #[error("request body exceeds {limit} bytes")]
    PayloadTooLarge { limit: usize },

    #[error("failed to read request body: {0}")]
    RequestBody(#[source] axum::Error),
}

impl ProxyError {
    /// Classify a client error from the upstream call.
    pub fn from_upstream(url: &str, source: reqwest::Error) -> Self {
        if source.is_timeout() {
            ProxyError::UpstreamTimeout {
                url: url.to_string(),
            }
        } else {
            ProxyError::UpstreamUnreachable {
                url: url.to_string(),
                source,
            }
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ProxyError::UpstreamUnreachable { .. } | ProxyError::InvalidUpstreamUrl { .. } => {
                StatusCode::BAD_GATEWAY
            }
            ProxyError::UpstreamTimeout { .. } => StatusCode::GATEWAY_TIMEOUT,
            ProxyError::PayloadTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            ProxyError::RequestBody(_) => StatusCode::BAD_REQUEST,
        }
    }

    /// Short label for metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            ProxyError::UpstreamUnreachable { .. } => "unreachable",
            ProxyError::UpstreamTimeout { .. } => "timeout",
            ProxyError::InvalidUpstreamUrl { .. } => "invalid_url",
            ProxyError::PayloadTooLarge { .. } => "payload_too_large",
            ProxyError::RequestBody(_) => "request_body",
        }
    }
}

impl IntoResponse for ProxyError {
    fn into_response(self) -> Response {
        let message = match &self {
            ProxyError::UpstreamUnreachable { .. } | ProxyError::InvalidUpstreamUrl { .. } => {
                "Upstream request failed"
            }
            ProxyError::UpstreamTimeout { .. } => "Upstream timed out",
            ProxyError::PayloadTooLarge { .. } => "Request body too large",
            ProxyError::RequestBody(_) => "Failed to read request body",
        };
        (self.status(), message).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_errors_to_gateway_statuses() {
        let timeout = ProxyError::UpstreamTimeout {
            url: "http://127.0.0.1:1/".into(),
        };
        assert_eq!(timeout.status(), StatusCode::GATEWAY_TIMEOUT);
        assert_eq!(timeout.into_response().status(), StatusCode::GATEWAY_TIMEOUT);

        let invalid = ProxyError::InvalidUpstreamUrl {
            rule: "api".into(),
            source: url::ParseError::EmptyHost,
        };
        assert_eq!(invalid.status(), StatusCode::BAD_GATEWAY);
        assert_eq!(invalid.kind(), "invalid_url");

        let too_large = ProxyError::PayloadTooLarge { limit: 16 };
        assert_eq!(too_large.into_response().status(), StatusCode::PAYLOAD_TOO_LARGE);
    }
}
