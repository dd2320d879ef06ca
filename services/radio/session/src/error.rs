//! Error types for the radio session layer.

use crate::report::Nonce;
use radio_schema::SchemaError;
use radio_wire::WireError;
use thiserror::Error;

/// Transport errors
#[derive(Error, Debug)]
pub enum TransportError {
    /// Underlying I/O failure
    #[error("transport I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Connection attempt took too long
    #[error("transport timed out after {0:?}")]
    Timeout(std::time::Duration),

    /// Peer closed the connection
    #[error("transport closed by peer")]
    Closed,

    /// Serial port could not be opened or configured
    #[error("serial port error: {0}")]
    Serial(#[from] tokio_serial::Error),
}

/// Engine errors
#[derive(Error, Debug)]
pub enum EngineError {
    /// Framing failure
    #[error("wire error: {0}")]
    Wire(#[from] WireError),

    /// Envelope codec failure
    #[error("schema error: {0}")]
    Schema(#[from] SchemaError),

    /// Transport failure
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    /// A node report is already in flight
    #[error("node report already outstanding (nonce {0})")]
    SessionOutstanding(Nonce),

    /// Text does not fit in a single packet
    #[error("text message too long: {len} bytes (max {max})")]
    TextTooLong {
        /// Encoded text length
        len: usize,
        /// Largest text a packet can carry
        max: usize,
    },

    /// The engine task is no longer running
    #[error("engine stopped")]
    Stopped,
}
