use crate::error::{ProtocolError, Result};
use std::future::Future;
use std::time::Duration;

/// Default send/receive timeout for transport operations
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

/// Run a fallible future with a deadline, mapping expiry to `ProtocolError::Timeout`.
pub async fn with_timeout_error<F, T>(future: F, duration: Duration) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    match tokio::time::timeout(duration, future).await {
        Ok(result) => result,
        Err(_) => Err(ProtocolError::Timeout),
    }
}
