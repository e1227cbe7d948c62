//! Stream bridge for unwrapit
//!
//! Turns a stream of `Result`s into a stream of [`Outcome`]s. Each `Ok`
//! item is forwarded as `Outcome::Ok`. The first `Err` item is forwarded as
//! `Outcome::Err`, the source is dropped, and the output stream completes
//! normally. A failure on the source therefore never surfaces as anything
//! but a final `Err` value; consumers treat it as the end of the sequence.
//!
//! ```
//! use futures::{executor::block_on, stream, StreamExt};
//! use unwrapit_stream::OutcomeStreamExt;
//!
//! let checked = stream::iter([1, 2, 3]).map(|x| {
//!     if x % 2 == 0 {
//!         Err(format!("num {x} is even."))
//!     } else {
//!         Ok(x)
//!     }
//! });
//!
//! let outcomes: Vec<_> = block_on(checked.into_outcomes().collect());
//! assert_eq!(outcomes.len(), 2);
//! assert_eq!(outcomes[0].value(), Some(&1));
//! assert_eq!(outcomes[1].error().map(String::as_str), Some("num 2 is even."));
//! ```

use std::pin::Pin;
use std::task::{ready, Context, Poll};

use futures::stream::{FusedStream, Stream};
use tracing::debug;
use unwrapit::Outcome;

/// Stream returned by [`OutcomeStreamExt::into_outcomes`] and [`to_outcomes`].
#[must_use = "streams do nothing unless polled"]
pub struct Outcomes<S> {
    source: Option<Pin<Box<S>>>,
}

impl<S> Outcomes<S> {
    fn new(source: S) -> Self {
        Self {
            source: Some(Box::pin(source)),
        }
    }
}

impl<S, T, E> Stream for Outcomes<S>
where
    S: Stream<Item = Result<T, E>>,
{
    type Item = Outcome<T, E>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();
        let Some(source) = this.source.as_mut() else {
            return Poll::Ready(None);
        };

        match ready!(source.as_mut().poll_next(cx)) {
            Some(Ok(value)) => Poll::Ready(Some(Outcome::Ok(value))),
            Some(Err(error)) => {
                debug!("source stream failed; completing after final Err");
                this.source = None;
                Poll::Ready(Some(Outcome::Err(error)))
            }
            None => {
                this.source = None;
                Poll::Ready(None)
            }
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        match &self.source {
            Some(source) => {
                let (_, upper) = source.size_hint();
                (0, upper)
            }
            None => (0, Some(0)),
        }
    }
}

impl<S, T, E> FusedStream for Outcomes<S>
where
    S: Stream<Item = Result<T, E>>,
{
    fn is_terminated(&self) -> bool {
        self.source.is_none()
    }
}

impl<S> std::fmt::Debug for Outcomes<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Outcomes")
            .field("terminated", &self.source.is_none())
            .finish()
    }
}

/// Convert a stream of `Result`s into a stream of [`Outcome`]s.
pub fn to_outcomes<S, T, E>(source: S) -> Outcomes<S>
where
    S: Stream<Item = Result<T, E>>,
{
    Outcomes::new(source)
}

/// Adds [`into_outcomes`](OutcomeStreamExt::into_outcomes) to every stream of
/// `Result`s.
pub trait OutcomeStreamExt<T, E>: Stream<Item = Result<T, E>> + Sized {
    fn into_outcomes(self) -> Outcomes<Self> {
        Outcomes::new(self)
    }
}

impl<S, T, E> OutcomeStreamExt<T, E> for S where S: Stream<Item = Result<T, E>> {}
