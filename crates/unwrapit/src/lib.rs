//! unwrapit: outcomes you can extract safely, and adapters that never panic
//!
//! This library provides:
//! - [`Outcome`]: an `Ok`/`Err` container with recovering extraction
//!   (`unwrap_or`, `unwrap_or_else`, `match_with`, `map_err`) and forced
//!   extraction (`unwrap`, `expect`)
//! - An escalation hook that decides what forced extraction does on failure:
//!   log and unwind by default, terminate when asked, or anything an
//!   application installs
//! - `wrap` adapters that run functions and futures behind a panic barrier
//!   and hand back an [`Outcome`]
//!
//! # Usage
//!
//! ```
//! use unwrapit::{try_wrap, Handlers};
//!
//! let parse = try_wrap(|raw: &str| -> anyhow::Result<serde_json::Value> {
//!     Ok(serde_json::from_str(raw)?)
//! });
//!
//! let good = parse.call((r#"{"package": "unwrapit!"}"#,));
//! assert_eq!(good.unwrap()["package"], "unwrapit!");
//!
//! let bad = parse.call(("{bad",));
//! let summary = bad.match_with(
//!     &Handlers::new()
//!         .on_ok(|_: &serde_json::Value| "parsed")
//!         .on_err(|_: &anyhow::Error| "rejected"),
//! );
//! assert_eq!(summary, Some("rejected"));
//! ```
//!
//! # Escalation
//!
//! Forced extraction of a failure goes through the process-wide
//! configuration. By default it logs at `ERROR` and unwinds with
//! [`EscalationError`]; set `terminate_by_default` (or pass
//! a terminating [`UnwrapOptions`] at the call site) to exit the process
//! instead.
//!
//! ```rust,ignore
//! use unwrapit::{define_config, escalate_with, ConfigUpdate};
//!
//! define_config(
//!     ConfigUpdate::from_env().escalator(escalate_with(|escalation| {
//!         telemetry::record(&escalation.payload);
//!         std::process::exit(escalation.exit_code);
//!     })),
//! );
//! ```

pub mod error;
pub mod escalation;
pub mod outcome;
pub mod wrap;

// Re-export the container
pub use outcome::{err, ok, Handlers, Outcome};

// Re-export error types
pub use error::{EscalationError, Panicked};

// Re-export escalation configuration and hooks
pub use escalation::{
    current_config, define_config, escalate_with, scoped, set_escalate, ConfigUpdate,
    DefaultEscalator, Escalate, Escalation, EscalationConfig, ScopedConfig, SharedEscalator,
    UnwrapOptions,
};

// Re-export adapters
pub use wrap::{
    outcome_of, try_wrap, wrap, wrap_as, wrap_async, wrap_future, wrap_value, AsyncWrapped,
    Callable, TryWrapped, Wrap, Wrapped,
};
