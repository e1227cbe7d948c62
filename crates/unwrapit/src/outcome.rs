//! The [`Outcome`] container.
//!
//! An `Outcome` is fixed as `Ok` or `Err` when it is built and never changes
//! variant. Extraction comes in two flavors: the recovering operations
//! (`unwrap_or`, `unwrap_or_else`, `match_with`, `map_err`) never leave the
//! caller's control, while forced extraction (`unwrap`, `expect`) hands a
//! failure to the process-wide escalation hook and does not return.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::escalation::{self, UnwrapOptions};

/// A success value or a failure payload.
///
/// Serializes externally tagged: `{"Ok": value}` / `{"Err": error}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[must_use = "this `Outcome` may be an `Err` variant, which should be handled"]
pub enum Outcome<T, E> {
    Ok(T),
    Err(E),
}

/// Build a successful outcome.
pub fn ok<T, E>(value: T) -> Outcome<T, E> {
    Outcome::Ok(value)
}

/// Build a failed outcome.
pub fn err<T, E>(error: E) -> Outcome<T, E> {
    Outcome::Err(error)
}

impl<T, E> Outcome<T, E> {
    pub fn is_ok(&self) -> bool {
        matches!(self, Self::Ok(_))
    }

    pub fn is_err(&self) -> bool {
        !self.is_ok()
    }

    /// The success value, if any.
    pub fn value(&self) -> Option<&T> {
        match self {
            Self::Ok(value) => Some(value),
            Self::Err(_) => None,
        }
    }

    /// The failure payload, if any.
    pub fn error(&self) -> Option<&E> {
        match self {
            Self::Ok(_) => None,
            Self::Err(error) => Some(error),
        }
    }

    pub fn into_value(self) -> Option<T> {
        match self {
            Self::Ok(value) => Some(value),
            Self::Err(_) => None,
        }
    }

    pub fn into_error(self) -> Option<E> {
        match self {
            Self::Ok(_) => None,
            Self::Err(error) => Some(error),
        }
    }

    pub fn as_ref(&self) -> Outcome<&T, &E> {
        match self {
            Self::Ok(value) => Outcome::Ok(value),
            Self::Err(error) => Outcome::Err(error),
        }
    }

    /// Convert into a standard `Result` for use with `?`.
    pub fn into_result(self) -> Result<T, E> {
        match self {
            Self::Ok(value) => Ok(value),
            Self::Err(error) => Err(error),
        }
    }

    /// The value, or `fallback` on failure. Never escalates.
    pub fn unwrap_or(self, fallback: T) -> T {
        match self {
            Self::Ok(value) => value,
            Self::Err(_) => fallback,
        }
    }

    /// The value, or `recover(error)` on failure. Never escalates.
    pub fn unwrap_or_else<F>(self, recover: F) -> T
    where
        F: FnOnce(E) -> T,
    {
        match self {
            Self::Ok(value) => value,
            Self::Err(error) => recover(error),
        }
    }

    /// Transform the failure payload. A success passes through untouched and
    /// `map` is not called.
    pub fn map_err<U, F>(self, map: F) -> Outcome<T, U>
    where
        F: FnOnce(E) -> U,
    {
        match self {
            Self::Ok(value) => Outcome::Ok(value),
            Self::Err(error) => Outcome::Err(map(error)),
        }
    }

    /// Run the handler for this variant.
    ///
    /// Returns `None` when the matching handler was not supplied. The
    /// receiver and the handlers are only borrowed, so matching again gives
    /// the same answer.
    pub fn match_with<U>(&self, handlers: &Handlers<'_, T, E, U>) -> Option<U> {
        match self {
            Self::Ok(value) => handlers.on_ok.as_ref().map(|handler| handler(value)),
            Self::Err(error) => handlers.on_err.as_ref().map(|handler| handler(error)),
        }
    }
}

impl<T, E: fmt::Debug> Outcome<T, E> {
    /// The value; escalates on failure with the error as payload.
    ///
    /// The error is rendered with `Debug`, so string errors reach the hook
    /// quoted.
    pub fn unwrap(self) -> T {
        self.unwrap_with(UnwrapOptions::default())
    }

    /// [`unwrap`](Self::unwrap) with per-call escalation options.
    pub fn unwrap_with(self, options: UnwrapOptions) -> T {
        match self {
            Self::Ok(value) => value,
            Self::Err(error) => escalation::escalate(format!("{error:?}"), None, options),
        }
    }

    /// The value; escalates on failure with `message` as payload and the
    /// error as its cause.
    pub fn expect(self, message: &str) -> T {
        self.expect_with(message, UnwrapOptions::default())
    }

    /// [`expect`](Self::expect) with per-call escalation options.
    pub fn expect_with(self, message: &str, options: UnwrapOptions) -> T {
        match self {
            Self::Ok(value) => value,
            Self::Err(error) => {
                escalation::escalate(message.to_string(), Some(format!("{error:?}")), options)
            }
        }
    }
}

impl<T, E> From<Result<T, E>> for Outcome<T, E> {
    fn from(result: Result<T, E>) -> Self {
        match result {
            Ok(value) => Self::Ok(value),
            Err(error) => Self::Err(error),
        }
    }
}

impl<T, E> From<Outcome<T, E>> for Result<T, E> {
    fn from(outcome: Outcome<T, E>) -> Self {
        outcome.into_result()
    }
}

/// Optional per-variant handlers for [`Outcome::match_with`].
pub struct Handlers<'h, T, E, U> {
    on_ok: Option<Box<dyn Fn(&T) -> U + 'h>>,
    on_err: Option<Box<dyn Fn(&E) -> U + 'h>>,
}

impl<'h, T, E, U> Handlers<'h, T, E, U> {
    pub fn new() -> Self {
        Self {
            on_ok: None,
            on_err: None,
        }
    }

    pub fn on_ok(mut self, handler: impl Fn(&T) -> U + 'h) -> Self {
        self.on_ok = Some(Box::new(handler));
        self
    }

    pub fn on_err(mut self, handler: impl Fn(&E) -> U + 'h) -> Self {
        self.on_err = Some(Box::new(handler));
        self
    }
}

impl<T, E, U> Default for Handlers<'_, T, E, U> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T, E, U> fmt::Debug for Handlers<'_, T, E, U> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Handlers")
            .field("on_ok", &self.on_ok.is_some())
            .field("on_err", &self.on_err.is_some())
            .finish()
    }
}
