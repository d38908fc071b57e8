use std::future::Future;
use std::time::Duration;

use tokio::time;

use crate::client::CcapiError;

/// Bounds `operation` by `limit`.
///
/// When the limit elapses the operation is dropped, which cancels any request
/// it has in flight, and [`CcapiError::Timeout`] is returned. There is no
/// retry and the limit is never extended.
pub async fn with_deadline<F, T>(limit: Duration, operation: F) -> Result<T, CcapiError>
where
    F: Future<Output = Result<T, CcapiError>>,
{
    match time::timeout(limit, operation).await {
        Ok(res) => res,
        Err(_) => Err(CcapiError::Timeout(limit)),
    }
}
