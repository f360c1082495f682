//! Per-call deadline for persistence work.

use std::future::Future;
use std::time::Duration;

use super::errors::AuthError;

/// Default bound on a single repository call.
pub const DEFAULT_DB_TIMEOUT: Duration = Duration::from_secs(3);

/// Run one repository call under `limit`. Dropping the future on expiry
/// releases whatever it held; the caller sees `AuthError::Timeout`.
pub async fn within<T, F>(limit: Duration, call: F) -> Result<T, AuthError>
where
    F: Future<Output = Result<T, AuthError>>,
{
    match tokio::time::timeout(limit, call).await {
        Ok(res) => res,
        Err(_) => {
            tracing::warn!(timeout_ms = limit.as_millis() as u64, "repository call exceeded deadline");
            Err(AuthError::Timeout)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn passes_through_results_in_time() {
        let ok: Result<u8, AuthError> = within(Duration::from_millis(100), async { Ok(7) }).await;
        assert_eq!(ok.unwrap(), 7);
        let err: Result<u8, AuthError> =
            within(Duration::from_millis(100), async { Err(AuthError::Persistence("down".into())) }).await;
        assert!(matches!(err, Err(AuthError::Persistence(_))));
    }

    #[tokio::test]
    async fn slow_calls_become_timeouts() {
        let res: Result<(), AuthError> = within(Duration::from_millis(10), async {
            tokio::time::sleep(Duration::from_millis(200)).await;
            Ok(())
        })
        .await;
        assert!(matches!(res, Err(AuthError::Timeout)));
    }
}
