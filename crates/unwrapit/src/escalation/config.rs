//! Process-wide escalation configuration.
//!
//! One shared [`EscalationConfig`] decides what forced extraction does on
//! failure. It changes only through [`define_config`], which merges the
//! fields present in a [`ConfigUpdate`] and leaves the rest alone. Nothing
//! resets it between units of work; use [`scoped`] when a test or a request
//! needs a temporary override.

use std::cell::Cell;
use std::fmt;
use std::sync::{Arc, LazyLock, Mutex, MutexGuard, PoisonError, RwLock};

use serde::{Deserialize, Deserializer};
use tracing::{debug, warn};

use super::hook::{DefaultEscalator, Escalate, Escalation, SharedEscalator, DEFAULT_EXIT_CODE};

/// Environment variable read by [`ConfigUpdate::from_env`].
pub const TERMINATE_ENV: &str = "UNWRAPIT_TERMINATE_BY_DEFAULT";

static CONFIG: LazyLock<RwLock<EscalationConfig>> =
    LazyLock::new(|| RwLock::new(EscalationConfig::default()));

/// Serializes [`scoped`] overrides.
static SCOPE: Mutex<()> = Mutex::new(());

thread_local! {
    /// Set while this thread holds a [`ScopedConfig`].
    static IN_SCOPE: Cell<bool> = const { Cell::new(false) };
}

/// Per-call options for forced extraction.
///
/// `None` defers to the process-wide configuration; it never means `false`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UnwrapOptions {
    /// Overrides [`EscalationConfig::terminate_by_default`] for this call.
    pub terminate: Option<bool>,
    /// Exit status if the process terminates (default `1`).
    pub exit_code: Option<i32>,
}

impl UnwrapOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn terminate(mut self, terminate: bool) -> Self {
        self.terminate = Some(terminate);
        self
    }

    pub fn exit_code(mut self, exit_code: i32) -> Self {
        self.exit_code = Some(exit_code);
        self
    }
}

/// What forced extraction does when it meets a failure.
#[derive(Clone)]
pub struct EscalationConfig {
    /// Terminate the process unless the call site says otherwise.
    pub terminate_by_default: bool,
    /// Hook invoked on every escalation.
    pub escalator: SharedEscalator,
}

impl Default for EscalationConfig {
    fn default() -> Self {
        Self {
            terminate_by_default: false,
            escalator: Arc::new(DefaultEscalator),
        }
    }
}

impl fmt::Debug for EscalationConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EscalationConfig")
            .field("terminate_by_default", &self.terminate_by_default)
            .finish_non_exhaustive()
    }
}

impl EscalationConfig {
    /// Merge the fields present in `update`.
    pub fn apply(&mut self, update: ConfigUpdate) {
        if let Some(terminate) = update.terminate_by_default {
            self.terminate_by_default = terminate;
        }
        if let Some(escalator) = update.escalator {
            self.escalator = escalator;
        }
    }

    /// Resolve per-call options against this configuration.
    pub fn resolve(
        &self,
        payload: String,
        cause: Option<String>,
        options: UnwrapOptions,
    ) -> Escalation {
        Escalation {
            payload,
            cause,
            terminate: options.terminate.unwrap_or(self.terminate_by_default),
            exit_code: options.exit_code.unwrap_or(DEFAULT_EXIT_CODE),
        }
    }

    /// Resolve the options and hand the escalation to the configured hook.
    pub fn escalate(&self, payload: String, cause: Option<String>, options: UnwrapOptions) -> ! {
        let escalation = self.resolve(payload, cause, options);
        self.escalator.escalate(escalation)
    }
}

/// Partial configuration; only `Some` fields are applied.
///
/// Deserializes leniently: a `terminate_by_default` that is not a boolean
/// or a recognizable flag string is ignored rather than rejected.
#[derive(Clone, Default, Deserialize)]
#[serde(default)]
pub struct ConfigUpdate {
    #[serde(deserialize_with = "lenient_flag")]
    pub terminate_by_default: Option<bool>,
    #[serde(skip)]
    pub escalator: Option<SharedEscalator>,
}

impl fmt::Debug for ConfigUpdate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConfigUpdate")
            .field("terminate_by_default", &self.terminate_by_default)
            .field("escalator", &self.escalator.as_ref().map(|_| "custom"))
            .finish()
    }
}

impl ConfigUpdate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn terminate_by_default(mut self, terminate: bool) -> Self {
        self.terminate_by_default = Some(terminate);
        self
    }

    pub fn escalator(mut self, escalator: SharedEscalator) -> Self {
        self.escalator = Some(escalator);
        self
    }

    /// Read overrides from the process environment.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read overrides through `lookup`, which maps a variable name to its
    /// value.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        Self {
            terminate_by_default: lookup(TERMINATE_ENV).and_then(|raw| parse_flag(&raw)),
            escalator: None,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.terminate_by_default.is_none() && self.escalator.is_none()
    }
}

fn parse_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        other => {
            warn!(value = other, "ignoring unrecognized terminate flag");
            None
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum FlagValue {
    Bool(bool),
    Text(String),
    Other(serde::de::IgnoredAny),
}

fn lenient_flag<'de, D>(deserializer: D) -> Result<Option<bool>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match FlagValue::deserialize(deserializer)? {
        FlagValue::Bool(flag) => Some(flag),
        FlagValue::Text(raw) => parse_flag(&raw),
        FlagValue::Other(_) => {
            warn!("ignoring non-boolean terminate_by_default");
            None
        }
    })
}

/// Merge `update` into the process-wide configuration.
pub fn define_config(update: ConfigUpdate) {
    debug!(?update, "updating escalation config");
    CONFIG
        .write()
        .unwrap_or_else(PoisonError::into_inner)
        .apply(update);
}

/// Replace the escalation hook.
pub fn set_escalate(escalator: SharedEscalator) {
    define_config(ConfigUpdate::new().escalator(escalator));
}

/// Snapshot of the active configuration.
pub fn current_config() -> EscalationConfig {
    CONFIG
        .read()
        .unwrap_or_else(PoisonError::into_inner)
        .clone()
}

fn replace_config(config: EscalationConfig) -> EscalationConfig {
    let mut guard = CONFIG.write().unwrap_or_else(PoisonError::into_inner);
    std::mem::replace(&mut *guard, config)
}

/// Escalate through the process-wide configuration.
///
/// The lock is released before the hook runs, so hooks may reconfigure.
pub(crate) fn escalate(payload: String, cause: Option<String>, options: UnwrapOptions) -> ! {
    current_config().escalate(payload, cause, options)
}

/// Restores the configuration captured by [`scoped`] when dropped.
#[must_use = "the override is reverted as soon as the guard is dropped"]
pub struct ScopedConfig {
    previous: Option<EscalationConfig>,
    _serial: MutexGuard<'static, ()>,
}

impl Drop for ScopedConfig {
    fn drop(&mut self) {
        if let Some(previous) = self.previous.take() {
            replace_config(previous);
        }
        IN_SCOPE.with(|flag| flag.set(false));
    }
}

/// Apply `update` until the returned guard drops, then restore the previous
/// configuration.
///
/// Scopes are serialized process-wide: a `scoped` call on another thread
/// blocks until the current guard drops.
///
/// # Panics
///
/// Panics if the calling thread already holds a guard. Nested scopes would
/// otherwise wait on themselves forever.
pub fn scoped(update: ConfigUpdate) -> ScopedConfig {
    if IN_SCOPE.with(Cell::get) {
        panic!("scoped config already active on this thread; drop the outer guard first");
    }
    let serial = SCOPE.lock().unwrap_or_else(PoisonError::into_inner);
    IN_SCOPE.with(|flag| flag.set(true));
    let previous = current_config();
    define_config(update);
    ScopedConfig {
        previous: Some(previous),
        _serial: serial,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::escalation::hook::escalate_with;
    use std::collections::HashMap;

    fn recording_hook() -> SharedEscalator {
        escalate_with(|_| {})
    }

    #[test]
    fn test_default_config_does_not_terminate() {
        let config = EscalationConfig::default();
        assert!(!config.terminate_by_default);
    }

    #[test]
    fn test_apply_merges_present_fields_only() {
        let mut config = EscalationConfig::default();
        let initial = Arc::as_ptr(&config.escalator) as *const ();

        config.apply(ConfigUpdate::new().terminate_by_default(true));
        assert!(config.terminate_by_default);
        assert_eq!(Arc::as_ptr(&config.escalator) as *const (), initial);

        let hook = recording_hook();
        config.apply(ConfigUpdate::new().escalator(hook.clone()));
        assert!(config.terminate_by_default, "absent field must not reset");
        assert!(Arc::ptr_eq(&config.escalator, &hook));
    }

    #[test]
    fn test_resolve_prefers_call_site_override() {
        let config = EscalationConfig {
            terminate_by_default: true,
            ..Default::default()
        };

        let deferred = config.resolve("e".into(), None, UnwrapOptions::new());
        assert!(deferred.terminate);
        assert_eq!(deferred.exit_code, DEFAULT_EXIT_CODE);

        let overridden = config.resolve(
            "e".into(),
            Some("c".into()),
            UnwrapOptions::new().terminate(false).exit_code(3),
        );
        assert!(!overridden.terminate, "explicit false must win");
        assert_eq!(overridden.exit_code, 3);
        assert_eq!(overridden.cause.as_deref(), Some("c"));
    }

    #[test]
    fn test_scoped_restores_previous_config() {
        let hook = recording_hook();
        {
            let _guard = scoped(
                ConfigUpdate::new()
                    .terminate_by_default(true)
                    .escalator(hook.clone()),
            );
            let active = current_config();
            assert!(active.terminate_by_default);
            assert!(Arc::ptr_eq(&active.escalator, &hook));

            define_config(ConfigUpdate::new().terminate_by_default(false));
            let merged = current_config();
            assert!(!merged.terminate_by_default);
            assert!(Arc::ptr_eq(&merged.escalator, &hook));
        }
        let _guard = scoped(ConfigUpdate::new());
        let restored = current_config();
        assert!(!restored.terminate_by_default);
        assert!(!Arc::ptr_eq(&restored.escalator, &hook));
    }

    #[test]
    fn test_nested_scope_panics_instead_of_blocking() {
        let nested = std::panic::catch_unwind(|| {
            let _outer = scoped(ConfigUpdate::new().terminate_by_default(true));
            let _inner = scoped(ConfigUpdate::new());
        });

        let payload = nested.unwrap_err();
        let message = payload.downcast_ref::<&str>().unwrap();
        assert!(message.contains("already active on this thread"));

        let _guard = scoped(ConfigUpdate::new());
        assert!(!current_config().terminate_by_default);
    }

    #[test]
    fn test_set_escalate_replaces_hook() {
        let _guard = scoped(ConfigUpdate::new());
        let hook = recording_hook();
        set_escalate(hook.clone());
        assert!(Arc::ptr_eq(&current_config().escalator, &hook));
    }

    #[test]
    fn test_from_lookup_parses_flags() {
        for (raw, expected) in [
            ("1", Some(true)),
            ("TRUE", Some(true)),
            (" yes ", Some(true)),
            ("off", Some(false)),
            ("0", Some(false)),
            ("maybe", None),
        ] {
            let vars = HashMap::from([(TERMINATE_ENV.to_string(), raw.to_string())]);
            let update = ConfigUpdate::from_lookup(|key| vars.get(key).cloned());
            assert_eq!(update.terminate_by_default, expected, "raw = {raw:?}");
        }
    }

    #[test]
    fn test_from_lookup_without_variable_is_empty() {
        let update = ConfigUpdate::from_lookup(|_| None);
        assert!(update.is_empty());
    }

    #[test]
    fn test_deserialize_is_lenient() {
        let update: ConfigUpdate =
            serde_json::from_str(r#"{"terminate_by_default": true}"#).unwrap();
        assert_eq!(update.terminate_by_default, Some(true));

        let update: ConfigUpdate =
            serde_json::from_str(r#"{"terminate_by_default": "no"}"#).unwrap();
        assert_eq!(update.terminate_by_default, Some(false));

        let update: ConfigUpdate =
            serde_json::from_str(r#"{"terminate_by_default": [1, 2]}"#).unwrap();
        assert_eq!(update.terminate_by_default, None);

        let update: ConfigUpdate = serde_json::from_str("{}").unwrap();
        assert!(update.is_empty());
    }
}
