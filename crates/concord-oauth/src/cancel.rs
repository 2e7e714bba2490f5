//! Cancellation of upstream calls.

use std::future::Future;

use tokio_util::sync::CancellationToken;

use crate::error::{OAuthError, Result};

/// Run `fut` to completion unless `cancel` fires first.
///
/// A cancelled call returns [`OAuthError::Cancelled`] and the in-flight
/// future is dropped, so its result can never be observed.
pub async fn with_cancellation<F, T>(cancel: Option<&CancellationToken>, fut: F) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    let Some(cancel) = cancel else {
        return fut.await;
    };

    if cancel.is_cancelled() {
        return Err(OAuthError::Cancelled);
    }

    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(OAuthError::Cancelled),
        result = fut => result,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_no_token_runs_future() {
        let result = with_cancellation(None, async { Ok(7) }).await;
        assert_eq!(result.unwrap(), 7);
    }

    #[tokio::test]
    async fn test_already_cancelled() {
        let cancel = CancellationToken::new();
        cancel.cancel();
        let result = with_cancellation(Some(&cancel), async { Ok(1) }).await;
        assert!(matches!(result, Err(OAuthError::Cancelled)));
    }

    #[tokio::test]
    async fn test_cancelled_mid_flight() {
        let cancel = CancellationToken::new();
        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            trigger.cancel();
        });

        let result = with_cancellation(Some(&cancel), async {
            tokio::time::sleep(Duration::from_secs(10)).await;
            Ok(())
        })
        .await;
        assert!(matches!(result, Err(OAuthError::Cancelled)));
    }
}
