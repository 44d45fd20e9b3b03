//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, request ID, tracing)
//!     → routing::Router (first matching rule)
//!     → forward.rs (rewrite, headers.rs, send upstream)
//!     → response.rs (map transport failures to 502/504)
//!     → Send to client
//! ```

pub mod forward;
pub mod headers;
pub mod request;
pub mod response;
pub mod server;

pub use forward::Forwarder;
pub use request::{MakeRequestUuidV4, RequestIdExt, X_REQUEST_ID};
pub use response::ProxyError;
pub use server::{AppState, HttpServer, ServerError};
