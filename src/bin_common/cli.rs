//! CLI utilities for binaries
//!
//! Handles configuration-path resolution from the environment for the
//! operator-facing executables.

use std::path::PathBuf;

/// Environment variable overriding the config file location.
pub const CONFIG_ENV_VAR: &str = "FIELDCTL_CONFIG_PATH";

/// Config file used when the environment does not say otherwise.
pub const DEFAULT_CONFIG_PATH: &str = "config.yaml";

/// Resolve the configuration path from the environment or fall back to the
/// default.
///
/// # Examples
/// ```
/// use tm_fieldctl::bin_common::config_path_from_env;
///
/// let path = config_path_from_env();
/// ```
pub fn config_path_from_env() -> PathBuf {
    std::env::var(CONFIG_ENV_VAR)
        .unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string())
        .into()
}
