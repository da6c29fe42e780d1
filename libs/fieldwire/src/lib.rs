//! Wire-level protocol for Tournament Manager field control.
//!
//! This crate owns everything that touches raw bytes, with no I/O of its own:
//!
//! - **framing**: the single-byte XOR obfuscation the server applies to every
//!   frame in both directions
//! - **handshake**: the fixed 128-byte frame a client must send right after
//!   the socket opens
//! - **proto**: the protobuf messages exchanged with a field set, plus
//!   encode/decode helpers
//!
//! The layouts here interoperate with a fixed external server, so they must
//! match exactly; see the tests in each module for the concrete byte-level
//! contracts.

pub mod framing;
pub mod handshake;
pub mod proto;

pub use framing::{deobfuscate, obfuscate, FrameError, DEFAULT_KEY};
pub use handshake::{build_handshake, CLOCK_TOLERANCE_SECS, HANDSHAKE_LEN};
pub use proto::{
    decode_notice, encode_request, CodecError, FieldControl, FieldControlRequest, FieldSetNotice,
    FieldSetRequest, NOTICE_FIELD_ACTIVATED,
};
