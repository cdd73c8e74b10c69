//! # Configuration Module
//!
//! Engine configuration affecting pattern compilation and fault handling.
//!
//! ## Environment Variables
//!
//! ### `EXPRESSWAY_MODE`
//!
//! Selects the operating mode. `development` lets callback panics propagate
//! uncaught to the hosting transport for diagnostics; any other value (or the
//! variable being unset) selects production mode, where panics are contained
//! and converted into request errors.
//!
//! ## Usage
//!
//! ```rust
//! use expressway::config::AppConfig;
//!
//! let mut config = AppConfig::from_env();
//! config.case_sensitive = true;
//! ```

use std::env;

/// Operating mode for the chain executor's fault policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AppMode {
    /// Contain callback panics and convert them into request errors
    #[default]
    Production,
    /// Let callback panics propagate to the hosting transport
    Development,
}

/// Engine configuration.
///
/// Read once at [`App`](crate::App) construction; pattern options apply to
/// every subsequent registration, and `mode` fixes the executor's fault
/// policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct AppConfig {
    /// Keep the case of patterns and request paths instead of folding both
    /// to lowercase
    pub case_sensitive: bool,
    /// Compile patterns as prefix matches instead of appending the
    /// end-of-path marker (exact match)
    pub coarse: bool,
    /// Accept host-qualified patterns (patterns not starting with `/`)
    pub allow_host: bool,
    /// Fault-handling mode, see [`AppMode`]
    pub mode: AppMode,
}

impl AppConfig {
    /// Load configuration from environment variables.
    ///
    /// Pattern options keep their defaults; only the operating mode is
    /// environment-driven.
    #[must_use]
    pub fn from_env() -> Self {
        let mode = match env::var("EXPRESSWAY_MODE") {
            Ok(val) if val.eq_ignore_ascii_case("development") => AppMode::Development,
            _ => AppMode::Production,
        };
        AppConfig {
            mode,
            ..AppConfig::default()
        }
    }
}
