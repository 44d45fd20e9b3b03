//! Timeout enforcement.
//!
//! # Responsibilities
//! - Wrap upstream calls with an optional deadline
//!
//! # Design Decisions
//! - Uses Tokio's timeout facilities
//! - No deadline configured means none is imposed beyond the network stack
//! - Dropping the wrapped future cancels the upstream call

use std::future::Future;
use std::time::Duration;

use tokio::time::error::Elapsed;

/// Await `future`, giving up after `deadline` if one is set.
pub async fn with_deadline<F>(deadline: Option<Duration>, future: F) -> Result<F::Output, Elapsed>
where
    F: Future,
{
    match deadline {
        Some(deadline) => tokio::time::timeout(deadline, future).await,
        None => Ok(future.await),
    }
}

/// Convert an optional seconds setting into a duration.
pub fn from_secs(secs: Option<u64>) -> Option<Duration> {
    secs.map(Duration::from_secs)
}
