//! Curried adapters with the error type fixed up front.
//!
//! `wrap_as::<E>()` picks the error type once; the returned [`Wrap`] then
//! adapts any input shape into outcomes carrying `E`. Behavior is identical
//! to the free functions; only the place where `E` is named moves.

use std::fmt;
use std::future::Future;
use std::marker::PhantomData;

use super::callable::{AsyncWrapped, TryWrapped, Wrapped};
use super::future::settle;
use crate::error::Panicked;
use crate::outcome::Outcome;

/// Adapter factory for outcomes with error type `E`.
pub struct Wrap<E> {
    _error: PhantomData<fn() -> E>,
}

/// Fix the error type, then pick the input shape.
///
/// ```
/// use unwrapit::wrap_as;
///
/// let parse = wrap_as::<anyhow::Error>().try_func(|raw: &str| raw.parse::<u8>());
/// assert_eq!(parse.call(("7",)).into_value(), Some(7));
/// assert!(parse.call(("700",)).is_err());
/// ```
pub fn wrap_as<E>() -> Wrap<E> {
    Wrap {
        _error: PhantomData,
    }
}

impl<E> Wrap<E> {
    /// Adapt a value-returning function; panics convert into `E`.
    pub fn func<F>(self, func: F) -> Wrapped<F, E> {
        Wrapped::new(func)
    }

    /// Adapt a `Result`-returning function whose error converts into `E`.
    pub fn try_func<F>(self, func: F) -> TryWrapped<F, E> {
        TryWrapped::new(func)
    }

    /// Adapt a function returning a future of `Result`.
    pub fn async_func<F>(self, func: F) -> AsyncWrapped<F, E> {
        AsyncWrapped::new(func)
    }

    /// Adapt a pending future.
    pub fn future<Fut, T, E0>(self, future: Fut) -> impl Future<Output = Outcome<T, E>>
    where
        Fut: Future<Output = Result<T, E0>>,
        E: From<E0> + From<Panicked>,
    {
        settle(future)
    }

    /// Box a plain value as success.
    pub fn value<T>(self, value: T) -> Outcome<T, E> {
        Outcome::Ok(value)
    }
}

impl<E> Clone for Wrap<E> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<E> Copy for Wrap<E> {}

impl<E> Default for Wrap<E> {
    fn default() -> Self {
        wrap_as()
    }
}

impl<E> fmt::Debug for Wrap<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Wrap<{}>", std::any::type_name::<E>())
    }
}
