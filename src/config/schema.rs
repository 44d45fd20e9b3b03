//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the proxy.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Root configuration for the dev proxy.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct ProxyConfig {
    /// Listener configuration (bind address).
    pub listener: ListenerConfig,

    /// Forwarding rules, evaluated in declaration order.
    pub rules: Vec<RuleConfig>,

    /// Upstream timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Upstream client settings.
    pub upstream: UpstreamConfig,

    /// Request limits.
    pub limits: LimitsConfig,

    /// Handling for requests no rule matches.
    pub fallback: FallbackConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,

    /// Read-only admin API.
    pub admin: AdminConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "127.0.0.1:5173").
    pub bind_address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "127.0.0.1:5173".to_string(),
        }
    }
}

/// One forwarding rule: requests whose path starts with `prefix` go to `target`.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RuleConfig {
    /// Rule identifier for logging/metrics.
    pub name: String,

    /// Literal path prefix that activates this rule.
    pub prefix: String,

    /// Upstream base URL (scheme + host, optionally a trailing `/`).
    pub target: String,

    /// Optional path rewrite applied before forwarding.
    #[serde(default)]
    pub rewrite: Option<RewriteConfig>,

    /// Override the outbound Host header with the upstream's host.
    #[serde(default = "default_change_origin")]
    pub change_origin: bool,

    /// Append X-Forwarded-For/Host/Proto to the outbound request.
    #[serde(default)]
    pub forwarded_headers: bool,
}

fn default_change_origin() -> bool {
    true
}

/// Regex search and replacement applied to the request path.
///
/// Only the first match is replaced. `$1` / `$name` in the replacement
/// expand to capture groups.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct RewriteConfig {
    pub pattern: String,
    pub replacement: String,
}

/// Timeout configuration for upstream calls.
///
/// Unset values leave the deadline to the network stack.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Connection establishment timeout in seconds.
    pub connect_secs: Option<u64>,

    /// Time allowed for the upstream to answer with response headers, in seconds.
    pub upstream_secs: Option<u64>,
}

/// Upstream HTTP client settings.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct UpstreamConfig {
    /// Route upstream calls through HTTP(S)_PROXY from the environment.
    pub use_env_proxy: bool,
}

/// Request limits.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LimitsConfig {
    /// Maximum inbound body size forwarded upstream, in bytes.
    pub max_body_bytes: usize,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_body_bytes: 2 * 1024 * 1024, // 2MB
        }
    }
}

/// Handling for requests that match no rule.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct FallbackConfig {
    /// Directory to serve static files from. Unmatched requests get 404 when unset.
    pub static_dir: Option<PathBuf>,
}

/// Log output format.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error). `RUST_LOG` takes precedence.
    pub log_level: String,

    /// Log output format.
    pub log_format: LogFormat,

    /// Enable the Prometheus metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
            metrics_enabled: false,
            metrics_address: "127.0.0.1:9090".to_string(),
        }
    }
}

/// Admin API configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AdminConfig {
    /// Enable the admin API.
    pub enabled: bool,

    /// API key for authentication (Bearer token). No auth when unset.
    pub api_key: Option<String>,

    /// Admin API bind address.
    pub bind_address: String,
}

impl Default for AdminConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            api_key: None,
            bind_address: "127.0.0.1:5174".to_string(),
        }
    }
}
