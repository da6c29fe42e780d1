//! Connection lifecycle state, shared lock-free between the caller's thread
//! and the inbound socket task.

use std::sync::atomic::{AtomicU8, Ordering};

/// Lifecycle of the single field-set connection.
///
/// Transitions are driven by [`crate::client::FieldSetClient`]:
/// `Disconnected -> Authenticating -> Connecting -> HandshakePending -> Ready`,
/// with any socket-level failure dropping back to `Disconnected`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u8)]
pub enum ConnectionState {
    /// Initial state; also entered on any socket close or fatal error.
    Disconnected = 0,
    /// Acquiring or refreshing the session credential.
    Authenticating = 1,
    /// Socket dial in progress.
    Connecting = 2,
    /// Handshake sent, waiting for the server's first notice.
    HandshakePending = 3,
    /// Commands may be sent.
    Ready = 4,
}

impl ConnectionState {
    fn from_u8(value: u8) -> Self {
        match value {
            1 => ConnectionState::Authenticating,
            2 => ConnectionState::Connecting,
            3 => ConnectionState::HandshakePending,
            4 => ConnectionState::Ready,
            _ => ConnectionState::Disconnected,
        }
    }
}

/// Atomic wrapper so the state can be read and written from the inbound task,
/// the command path, and the connect path without locks.
pub struct AtomicConnectionState(AtomicU8);

impl AtomicConnectionState {
    pub fn new(state: ConnectionState) -> Self {
        Self(AtomicU8::new(state as u8))
    }

    pub fn get(&self) -> ConnectionState {
        ConnectionState::from_u8(self.0.load(Ordering::Acquire))
    }

    pub fn set(&self, state: ConnectionState) {
        self.0.store(state as u8, Ordering::Release);
    }

    /// Move from `from` to `to` only if the state is currently `from`.
    ///
    /// Returns whether the transition happened; this is what makes
    /// `connect()` idempotent under concurrent callers.
    pub fn transition(&self, from: ConnectionState, to: ConnectionState) -> bool {
        self.0
            .compare_exchange(from as u8, to as u8, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    #[inline]
    pub fn is_ready(&self) -> bool {
        self.get() == ConnectionState::Ready
    }

    #[inline]
    pub fn is_disconnected(&self) -> bool {
        self.get() == ConnectionState::Disconnected
    }
}

impl Default for AtomicConnectionState {
    fn default() -> Self {
        Self::new(ConnectionState::Disconnected)
    }
}
