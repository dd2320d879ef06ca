//! Codec seam between frame payloads and envelopes.

use crate::envelope::{InboundEnvelope, OutboundEnvelope};
use crate::proto::FromRadio;
use bytes::{Bytes, BytesMut};
use prost::encoding::{decode_key, skip_field, DecodeContext};
use prost::Message;
use thiserror::Error;

/// Field numbers of [`FromRadio`] the client understands
const KNOWN_FROM_RADIO_TAGS: std::ops::RangeInclusive<u32> = 1..=17;

/// Schema codec errors
#[derive(Error, Debug)]
pub enum SchemaError {
    /// Payload is not a valid envelope
    #[error("envelope decode failed: {0}")]
    Decode(#[from] prost::DecodeError),
    /// Envelope could not be serialised
    #[error("envelope encode failed: {0}")]
    Encode(#[from] prost::EncodeError),
}

/// Encodes outbound envelopes and decodes inbound ones
pub trait SchemaCodec: Send {
    /// Serialise an outbound envelope into a frame payload
    fn encode(&self, envelope: &OutboundEnvelope) -> Result<Bytes, SchemaError>;

    /// Parse a frame payload into an inbound envelope
    fn decode(&self, payload: &[u8]) -> Result<InboundEnvelope, SchemaError>;
}

/// Protobuf codec backed by `prost`
#[derive(Debug, Clone, Copy, Default)]
pub struct ProstCodec;

impl ProstCodec {
    /// Create a new codec
    pub fn new() -> Self {
        Self
    }
}

impl SchemaCodec for ProstCodec {
    fn encode(&self, envelope: &OutboundEnvelope) -> Result<Bytes, SchemaError> {
        let message = envelope.to_message();
        let mut buf = BytesMut::with_capacity(message.encoded_len());
        message.encode(&mut buf)?;
        Ok(buf.freeze())
    }

    fn decode(&self, payload: &[u8]) -> Result<InboundEnvelope, SchemaError> {
        let message = FromRadio::decode(payload)?;
        let unknown_tag = if message.payload_variant.is_none() {
            first_unknown_tag(payload)
        } else {
            None
        };
        Ok(InboundEnvelope::from_message(message, unknown_tag))
    }
}

/// Walk the top-level fields and return the first one outside the known set.
///
/// `prost` drops unknown fields silently, so this is the only way to tell an
/// unrecognised payload from a bare id envelope.
fn first_unknown_tag(mut buf: &[u8]) -> Option<u32> {
    while !buf.is_empty() {
        let (tag, wire_type) = decode_key(&mut buf).ok()?;
        if !KNOWN_FROM_RADIO_TAGS.contains(&tag) {
            return Some(tag);
        }
        skip_field(wire_type, tag, &mut buf, DecodeContext::default()).ok()?;
    }
    None
}
