//! Callable adapters: run a function behind a panic barrier and box whatever
//! happens into an [`Outcome`].

use std::future::Future;
use std::marker::PhantomData;
use std::panic::{self, AssertUnwindSafe};

use tracing::debug;

use super::future::settle;
use crate::error::Panicked;
use crate::outcome::Outcome;

/// A function invoked with its arguments packed into a tuple.
///
/// Implemented for every `Fn` of up to six arguments, so a two-argument
/// closure is a `Callable<(A, B)>` and a zero-argument one a `Callable<()>`.
pub trait Callable<Args> {
    type Output;

    fn invoke(&self, args: Args) -> Self::Output;
}

macro_rules! impl_callable {
    ($($arg:ident),*) => {
        impl<Func, Ret, $($arg,)*> Callable<($($arg,)*)> for Func
        where
            Func: Fn($($arg),*) -> Ret,
        {
            type Output = Ret;

            #[allow(non_snake_case)]
            fn invoke(&self, ($($arg,)*): ($($arg,)*)) -> Ret {
                (self)($($arg),*)
            }
        }
    };
}

impl_callable!();
impl_callable!(A);
impl_callable!(A, B);
impl_callable!(A, B, C);
impl_callable!(A, B, C, D);
impl_callable!(A, B, C, D, G);
impl_callable!(A, B, C, D, G, H);

pub(crate) fn caught(payload: Box<dyn std::any::Any + Send>) -> Panicked {
    let panicked = Panicked::from_payload(payload);
    debug!(message = panicked.message(), "caught panic in wrapped call");
    panicked
}

/// A function whose panics come back as `Err`.
///
/// Built by [`wrap`](crate::wrap()) or [`Wrap::func`](super::Wrap::func).
/// The call is synchronous; nothing is scheduled.
pub struct Wrapped<F, E = Panicked> {
    func: F,
    _error: PhantomData<fn() -> E>,
}

impl<F, E> Wrapped<F, E> {
    pub(crate) fn new(func: F) -> Self {
        Self {
            func,
            _error: PhantomData,
        }
    }

    /// Invoke the function with `args`; a panic becomes `Err`.
    pub fn call<Args>(&self, args: Args) -> Outcome<<F as Callable<Args>>::Output, E>
    where
        F: Callable<Args>,
        E: From<Panicked>,
    {
        match panic::catch_unwind(AssertUnwindSafe(|| self.func.invoke(args))) {
            Ok(value) => Outcome::Ok(value),
            Err(payload) => Outcome::Err(E::from(caught(payload))),
        }
    }

    pub fn into_inner(self) -> F {
        self.func
    }
}

/// A `Result`-returning function whose `Err`s and panics both come back as
/// `Err`.
pub struct TryWrapped<F, E> {
    func: F,
    _error: PhantomData<fn() -> E>,
}

impl<F, E> TryWrapped<F, E> {
    pub(crate) fn new(func: F) -> Self {
        Self {
            func,
            _error: PhantomData,
        }
    }

    pub fn call<Args, T, E0>(&self, args: Args) -> Outcome<T, E>
    where
        F: Callable<Args, Output = Result<T, E0>>,
        E: From<E0> + From<Panicked>,
    {
        match panic::catch_unwind(AssertUnwindSafe(|| self.func.invoke(args))) {
            Ok(Ok(value)) => Outcome::Ok(value),
            Ok(Err(error)) => Outcome::Err(E::from(error)),
            Err(payload) => Outcome::Err(E::from(caught(payload))),
        }
    }

    pub fn into_inner(self) -> F {
        self.func
    }
}

/// A function returning a future, adapted so the future resolves to an
/// [`Outcome`] instead of failing.
pub struct AsyncWrapped<F, E> {
    func: F,
    _error: PhantomData<fn() -> E>,
}

impl<F, E> AsyncWrapped<F, E> {
    pub(crate) fn new(func: F) -> Self {
        Self {
            func,
            _error: PhantomData,
        }
    }

    /// Invoke the function and adapt the future it returns.
    ///
    /// The function itself runs immediately; a panic there resolves the
    /// returned future to `Err` on its first poll. The only suspension
    /// points are those of the inner future.
    pub fn call<Args, Fut, T, E0>(&self, args: Args) -> impl Future<Output = Outcome<T, E>>
    where
        F: Callable<Args, Output = Fut>,
        Fut: Future<Output = Result<T, E0>>,
        E: From<E0> + From<Panicked>,
    {
        let started = panic::catch_unwind(AssertUnwindSafe(|| self.func.invoke(args)));
        async move {
            match started {
                Ok(future) => settle(future).await,
                Err(payload) => Outcome::Err(E::from(caught(payload))),
            }
        }
    }

    pub fn into_inner(self) -> F {
        self.func
    }
}

macro_rules! impl_adapter_traits {
    ($($adapter:ident),*) => {$(
        impl<F: Clone, E> Clone for $adapter<F, E> {
            fn clone(&self) -> Self {
                Self::new(self.func.clone())
            }
        }

        impl<F, E> std::fmt::Debug for $adapter<F, E> {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.debug_struct(stringify!($adapter)).finish_non_exhaustive()
            }
        }
    )*};
}

impl_adapter_traits!(Wrapped, TryWrapped, AsyncWrapped);

/// Wrap a value-returning function; panics become [`Panicked`] errors.
///
/// ```
/// use unwrapit::wrap;
///
/// let divide = wrap(|a: i32, b: i32| a / b);
/// assert_eq!(divide.call((6, 3)).unwrap(), 2);
/// assert!(divide.call((1, 0)).is_err());
/// ```
pub fn wrap<F>(func: F) -> Wrapped<F> {
    Wrapped::new(func)
}

/// Wrap a `Result`-returning function; its `Err`s and panics become `Err`.
pub fn try_wrap<F, Args, T, E>(func: F) -> TryWrapped<F, E>
where
    F: Callable<Args, Output = Result<T, E>>,
{
    TryWrapped::new(func)
}

/// Wrap a function returning a future of `Result`.
pub fn wrap_async<F, Args, Fut, T, E>(func: F) -> AsyncWrapped<F, E>
where
    F: Callable<Args, Output = Fut>,
    Fut: Future<Output = Result<T, E>>,
{
    AsyncWrapped::new(func)
}
