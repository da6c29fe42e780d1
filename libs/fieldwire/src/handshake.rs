//! The fixed 128-byte frame a client sends immediately after the socket opens.
//!
//! Layout: 7 bytes of zero padding, the current Unix time in seconds as a
//! 4-byte little-endian integer at offsets 7..=10, then 117 more bytes of
//! zero padding. The server only validates the timestamp and accepts the
//! handshake when it is within [`CLOCK_TOLERANCE_SECS`] of its own clock, so
//! the timestamp must be wall-clock time captured at send time, never cached.

use std::time::{SystemTime, UNIX_EPOCH};

/// Total handshake frame length in bytes.
pub const HANDSHAKE_LEN: usize = 128;

/// Byte offset where the little-endian timestamp starts.
const TIMESTAMP_OFFSET: usize = 7;

/// The server accepts a handshake only when its embedded timestamp is within
/// this many seconds of the server's clock. There is no explicit rejection
/// signal; a handshake outside the window simply never gets a response.
pub const CLOCK_TOLERANCE_SECS: u64 = 300;

/// Build the handshake frame for the given instant.
///
/// Seconds since the Unix epoch are truncated to 32 bits, matching the wire
/// field width.
pub fn build_handshake(now: SystemTime) -> [u8; HANDSHAKE_LEN] {
    let secs = now
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs() as u32;

    let mut frame = [0u8; HANDSHAKE_LEN];
    frame[TIMESTAMP_OFFSET..TIMESTAMP_OFFSET + 4].copy_from_slice(&secs.to_le_bytes());
    frame
}
