//! Escalation hook: the single chokepoint where a failed outcome becomes a
//! process-level event.

use std::io::{self, Write};
use std::sync::Arc;

use tracing::error;
use tracing::subscriber::NoSubscriber;

use crate::error::EscalationError;

/// Exit status used when a caller does not pick one.
pub const DEFAULT_EXIT_CODE: i32 = 1;

/// Whether this platform can end the process with an exit status.
///
/// `wasm32-unknown-unknown` has no process to exit, so escalation always
/// unwinds there.
pub const CAN_TERMINATE: bool = !cfg!(all(target_arch = "wasm32", target_os = "unknown"));

/// One forced-extraction failure, with per-call options already resolved
/// against the process-wide configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Escalation {
    /// The escalated error (`unwrap`) or the caller's message (`expect`).
    ///
    /// Errors are rendered with `Debug`, the way `Result::unwrap` renders
    /// them, so a string error arrives quoted: `err("boom").unwrap()`
    /// escalates with the payload `"boom"` including the quotes.
    pub payload: String,
    /// The `Debug` rendering of the error behind an `expect` message.
    pub cause: Option<String>,
    /// Whether the process should end, if the platform allows it.
    pub terminate: bool,
    /// Exit status to use when terminating.
    pub exit_code: i32,
}

impl Escalation {
    /// A non-terminating escalation with the default exit code.
    pub fn new(payload: impl Into<String>) -> Self {
        Self {
            payload: payload.into(),
            cause: None,
            terminate: false,
            exit_code: DEFAULT_EXIT_CODE,
        }
    }

    pub fn with_cause(mut self, cause: impl Into<String>) -> Self {
        self.cause = Some(cause.into());
        self
    }

    pub fn terminate(mut self, terminate: bool) -> Self {
        self.terminate = terminate;
        self
    }

    pub fn exit_code(mut self, exit_code: i32) -> Self {
        self.exit_code = exit_code;
        self
    }

    /// Whether handling this escalation ends the process.
    pub fn exits_process(&self, can_terminate: bool) -> bool {
        can_terminate && self.terminate
    }

    /// The error raised when this escalation unwinds instead of exiting.
    pub fn into_error(self) -> EscalationError {
        EscalationError {
            message: self.payload,
            cause: self.cause,
        }
    }
}

/// Handler invoked when a failure is forcibly extracted.
///
/// Implementations must diverge: exit the process, or unwind with a payload
/// the caller may catch.
pub trait Escalate: Send + Sync {
    fn escalate(&self, escalation: Escalation) -> !;
}

/// Shared reference to an escalation hook
pub type SharedEscalator = Arc<dyn Escalate>;

/// Logs the escalation, then exits or unwinds with [`EscalationError`].
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultEscalator;

impl Escalate for DefaultEscalator {
    fn escalate(&self, escalation: Escalation) -> ! {
        report(&escalation);

        if escalation.exits_process(CAN_TERMINATE) {
            std::process::exit(escalation.exit_code);
        }

        std::panic::panic_any(escalation.into_error())
    }
}

/// Logs through `tracing`, or straight to stderr when no subscriber is
/// listening.
fn report(escalation: &Escalation) {
    let unobserved = tracing::dispatcher::get_default(|dispatch| dispatch.is::<NoSubscriber>());
    if unobserved {
        let _ = write_report(&mut io::stderr().lock(), escalation);
        return;
    }

    error!("{}", escalation.payload);
    if let Some(cause) = &escalation.cause {
        error!(payload = %escalation.payload, "[Cause] {}", cause);
    }
}

fn write_report(out: &mut impl Write, escalation: &Escalation) -> io::Result<()> {
    writeln!(out, "{}", escalation.payload)?;
    if let Some(cause) = &escalation.cause {
        writeln!(out, "[Cause] {cause}")?;
    }
    out.flush()
}

/// Adapts a plain closure into a hook.
struct FnEscalator<F>(F);

impl<F> Escalate for FnEscalator<F>
where
    F: Fn(&Escalation) + Send + Sync,
{
    fn escalate(&self, escalation: Escalation) -> ! {
        (self.0)(&escalation);
        // The closure returned; unwind so forced extraction still diverges.
        std::panic::panic_any(escalation.into_error())
    }
}

/// Build a hook from a closure.
///
/// The closure usually panics with its own payload or exits. If it returns,
/// the escalation unwinds with [`EscalationError`].
pub fn escalate_with<F>(handler: F) -> SharedEscalator
where
    F: Fn(&Escalation) + Send + Sync + 'static,
{
    Arc::new(FnEscalator(handler))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::panic::{catch_unwind, AssertUnwindSafe};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    #[derive(Clone, Default)]
    struct Captured(Arc<Mutex<Vec<u8>>>);

    impl Captured {
        fn text(&self) -> String {
            String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
        }
    }

    impl io::Write for Captured {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    fn with_captured_logs<R>(f: impl FnOnce() -> R) -> (R, String) {
        let captured = Captured::default();
        let writer = captured.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_ansi(false)
            .with_writer(move || writer.clone())
            .finish();
        let result = tracing::subscriber::with_default(subscriber, f);
        (result, captured.text())
    }

    #[test]
    fn test_escalation_defaults() {
        let escalation = Escalation::new("boom");
        assert_eq!(escalation.payload, "boom");
        assert_eq!(escalation.cause, None);
        assert!(!escalation.terminate);
        assert_eq!(escalation.exit_code, DEFAULT_EXIT_CODE);
    }

    #[test]
    fn test_exits_only_when_requested_and_supported() {
        let stay = Escalation::new("x");
        let leave = Escalation::new("x").terminate(true);
        assert!(!stay.exits_process(true));
        assert!(!stay.exits_process(false));
        assert!(leave.exits_process(true));
        assert!(!leave.exits_process(false));
    }

    #[test]
    fn test_default_escalator_unwinds_with_error() {
        let (caught, logs) = with_captured_logs(|| {
            catch_unwind(AssertUnwindSafe(|| {
                DefaultEscalator.escalate(Escalation::new("error message"))
            }))
        });

        let payload = caught.unwrap_err();
        let error = payload.downcast_ref::<EscalationError>().unwrap();
        assert_eq!(error, &EscalationError::new("error message"));
        assert!(logs.contains("error message"));
        assert!(!logs.contains("[Cause]"));
    }

    #[test]
    fn test_default_escalator_reports_cause() {
        let escalation = Escalation::new("error message")
            .with_cause("error cause")
            .exit_code(2);
        let (caught, logs) = with_captured_logs(|| {
            catch_unwind(AssertUnwindSafe(|| DefaultEscalator.escalate(escalation)))
        });

        let payload = caught.unwrap_err();
        let error = payload.downcast_ref::<EscalationError>().unwrap();
        assert_eq!(error.message, "error message");
        assert_eq!(error.cause.as_deref(), Some("error cause"));
        assert!(logs.contains("[Cause] error cause"));
        assert_eq!(logs.matches("ERROR").count(), 2);
    }

    #[test]
    fn test_write_report_payload_then_cause() {
        let mut out = Vec::new();
        write_report(&mut out, &Escalation::new("payload only")).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "payload only\n");

        let mut out = Vec::new();
        let escalation = Escalation::new("reading config").with_cause("\"port missing\"");
        write_report(&mut out, &escalation).unwrap();
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "reading config\n[Cause] \"port missing\"\n"
        );
    }

    #[test]
    fn test_closure_escalator_falls_through_to_unwind() {
        let calls = Arc::new(AtomicUsize::new(0));
        let seen = calls.clone();
        let hook = escalate_with(move |_| {
            seen.fetch_add(1, Ordering::SeqCst);
        });

        let caught = catch_unwind(AssertUnwindSafe(|| hook.escalate(Escalation::new("quiet"))));

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        let payload = caught.unwrap_err();
        assert_eq!(
            payload.downcast_ref::<EscalationError>(),
            Some(&EscalationError::new("quiet"))
        );
    }

    #[test]
    fn test_closure_escalator_custom_payload() {
        #[derive(Debug, PartialEq)]
        struct MyError(String);

        let hook = escalate_with(|escalation| {
            std::panic::panic_any(MyError(escalation.payload.clone()))
        });

        let caught = catch_unwind(AssertUnwindSafe(|| hook.escalate(Escalation::new("error"))));
        let payload = caught.unwrap_err();
        assert_eq!(
            payload.downcast_ref::<MyError>(),
            Some(&MyError("error".to_string()))
        );
    }
}
