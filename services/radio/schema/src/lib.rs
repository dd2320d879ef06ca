//! Envelope schema for the radio link.
//!
//! The device speaks a tag-discriminated protobuf schema. This crate declares
//! the subset of that schema the client needs (`proto`), the tagged envelopes
//! the session layer works with (`envelope`), and the codec seam between the
//! two (`codec`). The session layer only ever talks to [`SchemaCodec`], so a
//! different codec (e.g. one generated from the full schema) can be dropped in.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod codec;
pub mod envelope;
pub mod proto;

// Re-export main types
pub use codec::{ProstCodec, SchemaCodec, SchemaError};
pub use envelope::{InboundEnvelope, OutboundEnvelope, BROADCAST_ADDR};
pub use proto::PortNum;
