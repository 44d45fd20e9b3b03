//! Rule-based path-rewriting dev proxy.
//!
//! Requests whose path starts with a configured prefix are rewritten and
//! forwarded to that rule's upstream; everything else falls through to a
//! static directory or 404.

pub mod admin;
pub mod config;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod payload;
pub mod resilience;
pub mod routing;

pub use config::schema::ProxyConfig;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
