//! Client-level error type surfaced by connect and command operations.
//!
//! Per-frame decode failures never appear here: they are isolated inside the
//! inbound task and reported through the event channel, since one malformed
//! frame must not take the session down.

use crate::session::AuthError;
use crate::state::ConnectionState;
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ClientError {
    /// Login or credential parsing failed; surfaces from `connect()`.
    #[error("authentication failed: {0}")]
    Authentication(#[from] AuthError),

    /// No notice arrived within the bounded wait after the handshake. The
    /// server gives no explicit rejection, so this usually means the
    /// handshake timestamp fell outside the server's clock tolerance.
    #[error("no notice within {0:?} of handshake (probable clock skew beyond server tolerance)")]
    HandshakeTimeout(Duration),

    /// Socket-level failure while dialing or writing.
    #[error("WebSocket error: {0}")]
    WebSocket(String),

    /// A command was issued while disconnected; call `connect()` first.
    #[error("not connected to a field set")]
    NotConnected,

    /// A command was issued in a state where it is not legal. This is a
    /// programming error in the caller, not a transport condition.
    #[error("operation not legal in state {0:?}")]
    InvalidState(ConnectionState),

    /// A field-targeted command was issued before any field id was observed.
    /// Commands never substitute a sentinel field id.
    #[error("no active field observed yet")]
    NoActiveField,
}

pub type Result<T> = std::result::Result<T, ClientError>;
