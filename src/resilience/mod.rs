//! Resilience subsystem.
//!
//! # Data Flow
//! ```text
//! Request to upstream:
//!     → timeouts.rs (enforce connect/response deadline)
//!     → On failure: mapped to 502/504, never retried
//! ```
//!
//! # Design Decisions
//! - Every failure is local to its request; the router keeps serving
//! - No retries: forwarded requests are typically non-idempotent POSTs

pub mod timeouts;
