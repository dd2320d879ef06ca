//! Wire framing for the radio link.
//!
//! This crate provides the byte-level framing used between the client and a
//! mesh-radio device: a pure frame codec and a bounded reassembly buffer that
//! turns an arbitrarily chunked byte stream back into whole frames.
//!
//! ## Wire Format
//!
//! ```text
//! +----------+----------+-------------------------------+
//! | 0x94     | 0xC3     | magic                         |
//! +----------+----------+-------------------------------+
//! | u16 len (big-endian)| payload length, header excl.  |
//! +---------------------+-------------------------------+
//! | payload             | schema-encoded envelope       |
//! +---------------------+-------------------------------+
//! ```
//!
//! A buffer whose first two bytes are not the magic is discarded in full;
//! recovery happens on the next valid frame that arrives.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod buffer;
pub mod error;
pub mod frame;

// Re-export main types
pub use buffer::{Polled, ReassemblyBuffer, DEFAULT_BUFFER_CAPACITY};
pub use error::WireError;
pub use frame::{
    encode_frame, try_extract, Extract, FrameDecoder, HEADER_SIZE, MAGIC, MAX_PAYLOAD_SIZE,
};
