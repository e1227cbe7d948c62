//! Escalation: what forced extraction does with a failure
//!
//! ```text
//! Outcome::Err(e).unwrap()
//!     │
//!     ├─ resolve options: call-site override, else process-wide default
//!     │
//!     ▼
//! configured hook (DefaultEscalator unless replaced)
//!     │  logs payload and cause at ERROR (stderr without a subscriber)
//!     │
//!     ├─ terminate requested and platform can exit → process::exit(code)
//!     └─ otherwise → unwind with EscalationError
//! ```

pub mod config;
pub mod hook;

pub use config::{
    current_config, define_config, scoped, set_escalate, ConfigUpdate, EscalationConfig,
    ScopedConfig, UnwrapOptions, TERMINATE_ENV,
};
pub use hook::{
    escalate_with, DefaultEscalator, Escalate, Escalation, SharedEscalator, CAN_TERMINATE,
    DEFAULT_EXIT_CODE,
};

pub(crate) use config::escalate;
