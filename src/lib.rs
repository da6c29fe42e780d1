//! Tournament Manager field-control client.
//!
//! This crate ties the workspace together for the operator-facing binary:
//!
//! - **fieldwire**: framing, handshake, and protobuf schema for the TM wire
//!   protocol (re-exported from the workspace)
//! - **fieldclient**: session credentials and the field-set connection
//!   manager (re-exported from the workspace)
//! - **bin_common**: shared plumbing for binary executables
//!
//! ## Usage in binaries
//!
//! ```rust,ignore
//! use tm_fieldctl::bin_common::config_path_from_env;
//! use tm_fieldctl::fieldclient::{FieldControlConfig, FieldSetClient};
//! ```

// Re-export workspace libraries for convenience
pub use fieldclient;
pub use fieldwire;

// Binary common utilities
pub mod bin_common {
    //! Common utilities for binary executables

    pub mod cli;

    pub use cli::{config_path_from_env, CONFIG_ENV_VAR, DEFAULT_CONFIG_PATH};
}
