//! Session and connection management for Tournament Manager field control.
//!
//! The [`session::SessionManager`] acquires and refreshes the admin session
//! credential over HTTP; the [`client::FieldSetClient`] owns the WebSocket to
//! one field set, drives the handshake, keeps the active-field id current
//! from inbound notices, and exposes the match-timer commands
//! (start/end-early/abort/reset).
//!
//! Wire-level concerns (framing, handshake layout, protobuf schema) live in
//! the `fieldwire` crate.

pub mod client;
pub mod config;
pub mod error;
pub mod logging;
pub mod session;
pub mod state;

pub use client::{ClientEvent, FieldSetClient, DEFAULT_HANDSHAKE_TIMEOUT};
pub use config::{FieldControlConfig, PASSWORD_ENV_VAR};
pub use error::{ClientError, Result};
pub use logging::init_tracing;
pub use session::{AuthError, Credential, CredentialSource, SessionManager};
pub use state::{AtomicConnectionState, ConnectionState};
