//! Wire framing error types.

use thiserror::Error;

/// Wire framing errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum WireError {
    /// Payload does not fit in a single frame
    #[error("payload too large: {size} bytes (max {max})")]
    PayloadTooLarge {
        /// Offending payload size
        size: usize,
        /// Largest payload the frame can carry
        max: usize,
    },

    /// Appended bytes exceed the buffer's free space
    #[error("buffer overflow: {incoming} bytes offered, {free} free")]
    Overflow {
        /// Bytes offered to the buffer
        incoming: usize,
        /// Free space at the time of the call
        free: usize,
    },

    /// Buffer capacity cannot hold even a frame header
    #[error("buffer capacity {0} is smaller than the frame header")]
    Capacity(usize),
}
