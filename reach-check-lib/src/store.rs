//! Cancellable data source and the responder that serves from it.
//!
//! A [`Store`] receives a [`CancellationToken`] with every fetch and is
//! responsible for stopping its own work once the token fires. [`serve`]
//! only writes a response when the fetch succeeded, so a cancelled request
//! leaves the output untouched.

use crate::Result;
use futures::future::BoxFuture;
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// A slow source of data that honours cancellation.
pub trait Store: Send + Sync {
    /// Fetch the data, giving up with [`crate::ReachCheckError::Cancelled`]
    /// once `cancel` fires.
    fn fetch(&self, cancel: CancellationToken) -> BoxFuture<'_, Result<String>>;
}

/// Fetch from `store` and write the data to the async writer `out`.
///
/// Nothing is written if the fetch fails or is cancelled; the error is
/// returned to the caller instead.
pub async fn serve<S, W>(store: &S, cancel: CancellationToken, out: &mut W) -> Result<()>
where
    S: Store + ?Sized,
    W: AsyncWrite + Unpin + ?Sized,
{
    let data = match store.fetch(cancel).await {
        Ok(data) => data,
        Err(err) => {
            debug!(error = %err, "fetch did not complete, nothing written");
            return Err(err);
        }
    };

    out.write_all(data.as_bytes()).await?;
    out.flush().await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ReachCheckError;
    use futures::FutureExt;
    use std::time::Duration;
    use tokio::sync::oneshot;
    use tokio::time::sleep;

    /// Builds its response one character every 10ms, checking for
    /// cancellation between characters.
    struct SpyStore {
        response: String,
    }

    impl Store for SpyStore {
        fn fetch(&self, cancel: CancellationToken) -> BoxFuture<'_, Result<String>> {
            async move {
                let (tx, rx) = oneshot::channel();
                let response = self.response.clone();
                let worker_cancel = cancel.clone();

                tokio::spawn(async move {
                    let mut result = String::new();
                    for c in response.chars() {
                        tokio::select! {
                            _ = worker_cancel.cancelled() => return,
                            _ = sleep(Duration::from_millis(10)) => result.push(c),
                        }
                    }
                    let _ = tx.send(result);
                });

                tokio::select! {
                    _ = cancel.cancelled() => Err(ReachCheckError::cancelled("store fetch")),
                    res = rx => res.map_err(|_| ReachCheckError::internal("store worker vanished")),
                }
            }
            .boxed()
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_returns_data_from_the_store() {
        let store = SpyStore {
            response: "hello, world".to_string(),
        };
        let mut out = Vec::new();

        serve(&store, CancellationToken::new(), &mut out).await.unwrap();

        assert_eq!(String::from_utf8(out).unwrap(), "hello, world");
    }

    #[tokio::test(start_paused = true)]
    async fn test_buffered_writer_is_flushed() {
        let store = SpyStore {
            response: "buffered".to_string(),
        };
        let mut out = tokio::io::BufWriter::new(Vec::new());

        serve(&store, CancellationToken::new(), &mut out).await.unwrap();

        assert_eq!(out.into_inner(), b"buffered");
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancelled_request_writes_nothing() {
        let store = SpyStore {
            response: "hello, world".to_string(),
        };
        let cancel = CancellationToken::new();
        let trigger = cancel.clone();
        tokio::spawn(async move {
            sleep(Duration::from_millis(5)).await;
            trigger.cancel();
        });

        let mut out = Vec::new();
        let err = serve(&store, cancel, &mut out).await.unwrap_err();

        assert_eq!(err, ReachCheckError::cancelled("store fetch"));
        assert!(out.is_empty());
    }

    #[tokio::test]
    async fn test_already_cancelled_token() {
        let store = SpyStore {
            response: "data".to_string(),
        };
        let cancel = CancellationToken::new();
        cancel.cancel();

        let mut out = Vec::new();
        let result = serve(&store, cancel, &mut out).await;

        assert!(matches!(result, Err(ReachCheckError::Cancelled { .. })));
        assert!(out.is_empty());
    }
}
