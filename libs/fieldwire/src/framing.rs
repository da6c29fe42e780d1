//! Symmetric byte obfuscation applied to every frame on the wire.
//!
//! The server XORs each frame against a single-byte key and prepends the key
//! itself, masked with a fixed constant so it is recoverable from byte 0.
//! The transform is its own inverse, so the same key round-trips any payload.

use thiserror::Error;

/// Fixed constant masking the per-frame key in byte 0.
const KEY_MASK: u8 = 229;

/// Key used for outbound frames. Any value in 0..=255 works; the server
/// recovers whatever key was used from the first byte of the frame.
pub const DEFAULT_KEY: u8 = 123;

/// Error produced when de-obfuscating a raw frame.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum FrameError {
    /// A frame must carry at least the key byte.
    #[error("frame is empty; a frame carries at least the key byte")]
    Empty,
}

/// Obfuscate a payload for the wire.
///
/// The output is `payload.len() + 1` bytes: byte 0 is `key ^ 229`, every
/// following byte is the corresponding payload byte XORed with `key`.
pub fn obfuscate(payload: &[u8], key: u8) -> Vec<u8> {
    let mut frame = Vec::with_capacity(payload.len() + 1);
    frame.push(key ^ KEY_MASK);
    frame.extend(payload.iter().map(|b| b ^ key));
    frame
}

/// Recover the payload from a raw frame received off the wire.
///
/// Returns [`FrameError::Empty`] for a zero-length frame; a 1-byte frame
/// yields an empty payload.
pub fn deobfuscate(raw: &[u8]) -> Result<Vec<u8>, FrameError> {
    let (marker, body) = raw.split_first().ok_or(FrameError::Empty)?;
    let key = marker ^ KEY_MASK;
    Ok(body.iter().map(|b| b ^ key).collect())
}
