//! Adaptation layer: turn panicking or failing operations into outcomes
//!
//! The caller picks the input shape statically:
//!
//! | Input | Adapter | Result |
//! |-------|---------|--------|
//! | `Fn(..) -> T` | [`wrap`] | `Outcome<T, Panicked>`, synchronously |
//! | `Fn(..) -> Result<T, E>` | [`try_wrap`] | `Outcome<T, E>`, synchronously |
//! | `Fn(..) -> impl Future<Output = Result<T, E>>` | [`wrap_async`] | future of `Outcome<T, E>` |
//! | `impl Future<Output = Result<T, E>>` | [`wrap_future`] | future of `Outcome<T, E>` |
//! | `impl Future<Output = Result<T, E>>`, any `E` | [`outcome_of`] | future of `Outcome<T, E>`, panics propagate |
//! | `T` | [`wrap_value`] | `Outcome<T, Infallible>` |
//!
//! [`wrap_as`] fixes the error type first and offers the same shapes as
//! methods. Arguments are passed to `call` as a tuple.

pub mod callable;
pub mod curried;
pub mod future;

use std::convert::Infallible;

use crate::outcome::Outcome;

pub use callable::{try_wrap, wrap, wrap_async, AsyncWrapped, Callable, TryWrapped, Wrapped};
pub use curried::{wrap_as, Wrap};
pub use future::{outcome_of, wrap_future};

/// Treat a plain value as an already-successful outcome.
pub fn wrap_value<T>(value: T) -> Outcome<T, Infallible> {
    Outcome::Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wrap_value() {
        assert_eq!(wrap_value(1).unwrap(), 1);
        assert_eq!(wrap_value("string").unwrap(), "string");
        assert_eq!(wrap_value(vec![1, 2, 3]).unwrap(), vec![1, 2, 3]);
        assert!(wrap_value(()).is_ok());
    }
}
