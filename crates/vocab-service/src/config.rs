//! Service configuration from environment variables.

use std::path::PathBuf;
use std::time::Duration;

use crate::engine::DisplayNameLookup;
use crate::error::ConfigError;

/// Code vocabulary source root.
pub const CODE_DIR_VAR: &str = "VOCAB_CODE_DIR";
/// Value-set source root.
pub const VALUE_SET_DIR_VAR: &str = "VOCAB_VALUESET_DIR";
/// Whether to load both roots before starting the watchdogs.
pub const LOAD_AT_STARTUP_VAR: &str = "VOCAB_LOAD_AT_STARTUP";
/// `code` or `display-name`.
pub const DISPLAY_NAME_LOOKUP_VAR: &str = "VOCAB_DISPLAY_NAME_LOOKUP";
/// Watchdog quiet period in milliseconds.
pub const WATCH_DEBOUNCE_VAR: &str = "VOCAB_WATCH_DEBOUNCE_MS";

const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(2000);

/// Startup and runtime settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceConfig {
    /// Code vocabulary source root.
    pub code_directory: Option<PathBuf>,
    /// Value-set source root.
    pub value_set_directory: Option<PathBuf>,
    /// Load both roots before starting the watchdogs.
    pub load_at_startup: bool,
    /// How `validate_code` fills the codes-for-display-name branch.
    pub display_name_lookup: DisplayNameLookup,
    /// Quiet period after a file-system event before a reload starts.
    pub watch_debounce: Duration,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            code_directory: None,
            value_set_directory: None,
            load_at_startup: true,
            display_name_lookup: DisplayNameLookup::default(),
            watch_debounce: DEFAULT_DEBOUNCE,
        }
    }
}

impl ServiceConfig {
    /// Reads the configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Reads the configuration through `lookup`, which returns the value of
    /// a variable if it is set.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();
        let value = |name: &str| lookup(name).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        config.code_directory = value(CODE_DIR_VAR).map(PathBuf::from);
        config.value_set_directory = value(VALUE_SET_DIR_VAR).map(PathBuf::from);

        if let Some(raw) = value(LOAD_AT_STARTUP_VAR) {
            config.load_at_startup = parse_bool(LOAD_AT_STARTUP_VAR, &raw)?;
        }

        if let Some(raw) = value(DISPLAY_NAME_LOOKUP_VAR) {
            config.display_name_lookup = match raw.to_ascii_lowercase().as_str() {
                "code" => DisplayNameLookup::ByCode,
                "display-name" | "display_name" => DisplayNameLookup::ByDisplayName,
                _ => {
                    return Err(ConfigError::InvalidValue {
                        variable: DISPLAY_NAME_LOOKUP_VAR,
                        value: raw,
                        reason: "expected 'code' or 'display-name'",
                    })
                }
            };
        }

        if let Some(raw) = value(WATCH_DEBOUNCE_VAR) {
            let millis = raw.parse::<u64>().map_err(|_| ConfigError::InvalidValue {
                variable: WATCH_DEBOUNCE_VAR,
                value: raw.clone(),
                reason: "expected a whole number of milliseconds",
            })?;
            config.watch_debounce = Duration::from_millis(millis);
        }

        Ok(config)
    }
}

fn parse_bool(variable: &'static str, raw: &str) -> Result<bool, ConfigError> {
    match raw.to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" => Ok(true),
        "false" | "0" | "no" => Ok(false),
        _ => Err(ConfigError::InvalidValue {
            variable,
            value: raw.to_string(),
            reason: "expected true or false",
        }),
    }
}
