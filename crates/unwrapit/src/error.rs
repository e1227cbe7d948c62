//! Error types raised by escalation and produced by caught panics.

use std::any::Any;
use thiserror::Error;

/// Raised by the default escalator when the process is not terminated.
///
/// The error unwinds with [`std::panic::panic_any`], so callers that want to
/// survive a forced extraction can intercept it with
/// [`std::panic::catch_unwind`] and downcast the payload to this type.
///
/// ```
/// use unwrapit::EscalationError;
///
/// let caught = std::panic::catch_unwind(|| {
///     std::panic::panic_any(EscalationError::new("config missing").with_cause("NotFound"))
/// });
/// let payload = caught.unwrap_err();
/// let error = payload.downcast_ref::<EscalationError>().unwrap();
/// assert_eq!(error.message, "config missing");
/// assert_eq!(error.cause.as_deref(), Some("NotFound"));
/// ```
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{message}")]
pub struct EscalationError {
    /// The escalated payload, rendered for humans.
    pub message: String,
    /// Rendered cause attached by `expect`-style extraction.
    pub cause: Option<String>,
}

impl EscalationError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            cause: None,
        }
    }

    pub fn with_cause(mut self, cause: impl Into<String>) -> Self {
        self.cause = Some(cause.into());
        self
    }
}

/// A panic caught by one of the `wrap` adapters, turned into a value.
///
/// Error types used with the adapters convert from this through
/// `From<Panicked>`; `anyhow::Error` does so out of the box.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{message}")]
pub struct Panicked {
    message: String,
    escalation: Option<EscalationError>,
}

/// Message used when a panic payload is neither a string nor an
/// [`EscalationError`].
const OPAQUE_PAYLOAD: &str = "Box<dyn Any>";

impl Panicked {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            escalation: None,
        }
    }

    /// Build from the payload handed back by `catch_unwind`.
    pub fn from_payload(payload: Box<dyn Any + Send>) -> Self {
        if let Some(message) = payload.downcast_ref::<&'static str>() {
            return Self::new(*message);
        }
        match payload.downcast::<String>() {
            Ok(message) => Self::new(*message),
            Err(payload) => match payload.downcast::<EscalationError>() {
                Ok(escalation) => Self {
                    message: escalation.message.clone(),
                    escalation: Some(*escalation),
                },
                Err(_) => Self::new(OPAQUE_PAYLOAD),
            },
        }
    }

    /// The panic message.
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Set when the panic was a forced extraction escalating inside the
    /// wrapped call.
    pub fn escalation(&self) -> Option<&EscalationError> {
        self.escalation.as_ref()
    }
}
