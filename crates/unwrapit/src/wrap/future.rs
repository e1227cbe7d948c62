//! Future adapters.
//!
//! A wrapped future polls straight through to the inner one: no extra
//! suspension, buffering, or spawning. Dropping it drops the inner future,
//! which is the only way to cancel.

use std::future::Future;
use std::panic::AssertUnwindSafe;

use futures::FutureExt;

use super::callable::caught;
use crate::error::Panicked;
use crate::outcome::Outcome;

/// Shared conversion behind every asynchronous adapter.
pub(crate) fn settle<Fut, T, E0, E>(future: Fut) -> impl Future<Output = Outcome<T, E>>
where
    Fut: Future<Output = Result<T, E0>>,
    E: From<E0> + From<Panicked>,
{
    AssertUnwindSafe(future)
        .catch_unwind()
        .map(|settled| match settled {
            Ok(Ok(value)) => Outcome::Ok(value),
            Ok(Err(error)) => Outcome::Err(E::from(error)),
            Err(payload) => Outcome::Err(E::from(caught(payload))),
        })
}

/// Adapt a pending future so it resolves to an [`Outcome`].
///
/// A future that fails resolves to `Err`; one that panics while polled
/// resolves to `Err(E::from(Panicked))`. The returned future never panics on
/// the inner future's behalf.
pub fn wrap_future<Fut, T, E>(future: Fut) -> impl Future<Output = Outcome<T, E>>
where
    Fut: Future<Output = Result<T, E>>,
    E: From<Panicked>,
{
    settle(future)
}

/// Adapt a pending future without a panic barrier.
///
/// Only the `Result` is mapped, so any error type works. A panic while
/// polling propagates to the caller; use [`wrap_future`] to catch it.
///
/// ```
/// use futures::executor::block_on;
/// use unwrapit::outcome_of;
///
/// let outcome = block_on(outcome_of(async { Err::<u8, _>("closed".to_string()) }));
/// assert_eq!(outcome.error().map(String::as_str), Some("closed"));
/// ```
pub fn outcome_of<Fut, T, E>(future: Fut) -> impl Future<Output = Outcome<T, E>>
where
    Fut: Future<Output = Result<T, E>>,
{
    future.map(Outcome::from)
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::anyhow;
    use std::time::Duration;
    use tokio::sync::oneshot;

    #[tokio::test]
    async fn test_wrap_future_ok() {
        let outcome = wrap_future(async { Ok::<_, anyhow::Error>("Yay") }).await;
        assert_eq!(outcome.into_value(), Some("Yay"));
    }

    #[tokio::test]
    async fn test_wrap_future_failure_resolves_to_err() {
        let outcome: Outcome<i32, anyhow::Error> =
            wrap_future(async { Err(anyhow!("Toggle is off.")) }).await;
        assert_eq!(outcome.error().unwrap().to_string(), "Toggle is off.");
    }

    async fn explode() -> Result<i32, Panicked> {
        panic!("polled into a panic")
    }

    #[tokio::test]
    async fn test_wrap_future_panic_resolves_to_err() {
        let outcome = wrap_future(explode()).await;
        assert_eq!(
            outcome.error().map(Panicked::message),
            Some("polled into a panic")
        );
    }

    #[tokio::test]
    async fn test_wrap_future_waits_for_inner_settlement() {
        let (tx, rx) = oneshot::channel::<Result<u32, Panicked>>();
        let pending = tokio::spawn(wrap_future(async move {
            rx.await.unwrap_or_else(|_| Err(Panicked::new("sender dropped")))
        }));

        tokio::time::sleep(Duration::from_millis(10)).await;
        assert!(!pending.is_finished());

        tx.send(Ok(7)).unwrap();
        assert_eq!(pending.await.unwrap(), Outcome::Ok(7));
    }

    #[derive(Debug, PartialEq)]
    enum FetchError {
        Timeout,
    }

    #[tokio::test]
    async fn test_outcome_of_accepts_any_error_type() {
        let timed_out = outcome_of(async { Err::<u32, _>(FetchError::Timeout) }).await;
        assert_eq!(timed_out, Outcome::Err(FetchError::Timeout));

        let io_failure = outcome_of(async {
            Err::<u32, _>(std::io::Error::new(std::io::ErrorKind::NotFound, "missing"))
        })
        .await;
        assert_eq!(
            io_failure.error().map(std::io::Error::kind),
            Some(std::io::ErrorKind::NotFound)
        );

        let delivered = outcome_of(async { Ok::<_, String>(3) }).await;
        assert_eq!(delivered, Outcome::Ok(3));
    }

    #[tokio::test]
    async fn test_ready_future_completes_on_first_poll() {
        let outcome = wrap_future(async { Ok::<_, Panicked>(1) }).now_or_never();
        assert_eq!(outcome, Some(Outcome::Ok(1)));
    }
}
