//! Protobuf messages exchanged with a field set.
//!
//! The schema is an external contract fixed by the server (`FieldSetNotice`
//! inbound, `FieldSetRequest` wrapping `FieldControlRequest` outbound); this
//! module declares it with prost derives rather than a build step.

use prost::Message;
use thiserror::Error;

/// Error returned by [`decode_notice`].
#[derive(Debug, Error)]
pub enum CodecError {
    /// The raw bytes could not be decoded as a `FieldSetNotice`.
    #[error("failed to decode notice: {0}")]
    Decode(#[from] prost::DecodeError),
}

/// Field-control operations, by wire code.
#[derive(Clone, Copy, Debug, PartialEq, Eq, prost::Enumeration)]
#[repr(i32)]
pub enum FieldControl {
    None = 0,
    StartMatch = 1,
    EndEarly = 2,
    Abort = 3,
    ResetTimer = 4,
}

/// Notice `id` announcing which physical field is now active.
pub const NOTICE_FIELD_ACTIVATED: u32 = 8;

/// Server-pushed notice about field-set state. Only the discriminator and the
/// field id matter to this client; other notice kinds are passed through as-is.
#[derive(Clone, PartialEq, Message)]
pub struct FieldSetNotice {
    /// Variant discriminator selecting the payload meaning.
    #[prost(uint32, tag = "1")]
    pub id: u32,
    /// Field the notice refers to, when the variant carries one.
    #[prost(uint32, tag = "2")]
    pub field_id: u32,
}

/// A command directing the active field's match timer.
#[derive(Clone, PartialEq, Message)]
pub struct FieldControlRequest {
    #[prost(enumeration = "FieldControl", tag = "1")]
    pub id: i32,
    #[prost(uint32, tag = "2")]
    pub field_id: u32,
}

/// Outbound envelope for field-set requests.
#[derive(Clone, PartialEq, Message)]
pub struct FieldSetRequest {
    #[prost(message, optional, tag = "1")]
    pub field_control: Option<FieldControlRequest>,
}

impl FieldSetRequest {
    /// Build a field-control request targeting the given field.
    pub fn field_control(op: FieldControl, field_id: u32) -> Self {
        Self {
            field_control: Some(FieldControlRequest {
                id: op as i32,
                field_id,
            }),
        }
    }
}

/// Encode an outbound request to protobuf bytes.
///
/// Encoding cannot fail for a well-formed request; the only prost error is
/// `BufferTooSmall`, which a growable `Vec` rules out.
pub fn encode_request(request: &FieldSetRequest) -> Vec<u8> {
    let mut out = Vec::with_capacity(request.encoded_len());
    request.encode(&mut out).unwrap_or_default();
    out
}

/// Decode inbound protobuf bytes as a notice.
pub fn decode_notice(bytes: &[u8]) -> Result<FieldSetNotice, CodecError> {
    Ok(FieldSetNotice::decode(bytes)?)
}
