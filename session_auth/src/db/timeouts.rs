//! Store call timeout helpers
//!
//! Bounds account store operations so a stalled backend surfaces as an error
//! instead of hanging the request.

use std::future::Future;
use std::time::Duration;
use tokio::time::timeout;

use super::errors::{StoreError, StoreResult};

/// Default timeout for store queries (5 seconds)
pub const DEFAULT_QUERY_TIMEOUT: Duration = Duration::from_secs(5);

/// Execute a store operation with timeout
///
/// Dropping the returned future drops `future` as well, so cancellation by
/// the caller reaches the store call.
///
/// # Arguments
///
/// * `duration` - Timeout duration
/// * `future` - Store operation to execute
///
/// # Returns
///
/// * `StoreResult<T>` - Result or `StoreError::Timeout`
pub async fn with_timeout<F, T>(duration: Duration, future: F) -> StoreResult<T>
where
    F: Future<Output = StoreResult<T>>,
{
    match timeout(duration, future).await {
        Ok(result) => result,
        Err(_) => Err(StoreError::Timeout(duration)),
    }
}
