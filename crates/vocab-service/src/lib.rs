//! # vocab-service
//!
//! Code and value-set validation over hot-swapped vocabulary data.
//!
//! The [`ValidationEngine`] answers the four queries the rest of the system
//! relies on: [`is_code_system_loaded`](ValidationEngine::is_code_system_loaded),
//! [`is_value_set_loaded`](ValidationEngine::is_value_set_loaded),
//! [`validate_code`](ValidationEngine::validate_code) and
//! [`validate_value_set_code`](ValidationEngine::validate_value_set_code).
//! [`initialize`] loads the configured source roots in the background and
//! starts a [`WatchdogHandle`] per root so later file changes are rebuilt
//! into the inactive generation and swapped in.

#![warn(missing_docs)]

pub mod config;
pub mod engine;
pub mod error;
pub mod startup;
pub mod watchdog;

pub use config::ServiceConfig;
pub use engine::{DisplayNameLookup, ValidationEngine};
pub use error::{ConfigError, EngineError, StartupError, WatchError};
pub use startup::{initialize, shutdown, Service, StartupHandle};
pub use watchdog::WatchdogHandle;

// Re-export the loader crate for convenience
pub use vocab_loader;
