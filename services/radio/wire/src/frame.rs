//! Frame codec for the radio link.
//!
//! Encoding prepends the magic and a big-endian payload length; extraction
//! inspects the front of a buffer and reports whether a whole frame is
//! available, more bytes are needed, or the buffered bytes are garbage.

use crate::WireError;
use bytes::{BufMut, Bytes, BytesMut};

/// Frame magic (first two bytes of every frame)
pub const MAGIC: [u8; 2] = [0x94, 0xC3];

/// Header size: magic plus the u16 length field
pub const HEADER_SIZE: usize = 4;

/// Largest payload a frame may carry
pub const MAX_PAYLOAD_SIZE: usize = 512;

/// Result of inspecting the front of a buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Extract<'a> {
    /// Fewer bytes than a header are buffered
    Empty,
    /// Bad magic or an impossible length; the whole buffer must be dropped
    Corrupt,
    /// Header is valid but the payload has not fully arrived
    Incomplete,
    /// A complete frame sits at the front of the buffer
    Frame {
        /// Payload bytes, header excluded
        payload: &'a [u8],
        /// Bytes to consume (header + payload)
        consumed: usize,
    },
}

/// Encode a payload into a frame.
///
/// Fails when the payload exceeds [`MAX_PAYLOAD_SIZE`]; callers are expected
/// to size outbound envelopes so this never happens.
pub fn encode_frame(payload: &[u8]) -> Result<Bytes, WireError> {
    if payload.len() > MAX_PAYLOAD_SIZE {
        return Err(WireError::PayloadTooLarge {
            size: payload.len(),
            max: MAX_PAYLOAD_SIZE,
        });
    }

    let mut buf = BytesMut::with_capacity(HEADER_SIZE + payload.len());
    buf.put_slice(&MAGIC);
    buf.put_u16(payload.len() as u16);
    buf.put_slice(payload);

    Ok(buf.freeze())
}

/// Inspect the filled region of a buffer of the given capacity.
///
/// A declared length that could never fit in `capacity` is reported as
/// [`Extract::Corrupt`] rather than [`Extract::Incomplete`], otherwise the
/// buffer would wait forever on a wild length field.
pub fn try_extract(filled: &[u8], capacity: usize) -> Extract<'_> {
    if filled.len() < HEADER_SIZE {
        return Extract::Empty;
    }

    if filled[..2] != MAGIC {
        return Extract::Corrupt;
    }

    let len = u16::from_be_bytes([filled[2], filled[3]]) as usize;
    if len > capacity.saturating_sub(HEADER_SIZE) {
        return Extract::Corrupt;
    }

    let total = HEADER_SIZE + len;
    if total > filled.len() {
        return Extract::Incomplete;
    }

    Extract::Frame {
        payload: &filled[HEADER_SIZE..total],
        consumed: total,
    }
}

/// Frame decoder bound to a buffer capacity
#[derive(Debug, Clone, Copy)]
pub struct FrameDecoder {
    capacity: usize,
}

impl FrameDecoder {
    /// Create a decoder for buffers of the given capacity
    pub fn new(capacity: usize) -> Result<Self, WireError> {
        if capacity < HEADER_SIZE {
            return Err(WireError::Capacity(capacity));
        }
        Ok(Self { capacity })
    }

    /// Buffer capacity this decoder checks lengths against
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Largest payload that can be extracted with this capacity
    pub fn max_payload(&self) -> usize {
        self.capacity - HEADER_SIZE
    }

    /// Inspect the filled region of a buffer
    pub fn extract<'a>(&self, filled: &'a [u8]) -> Extract<'a> {
        try_extract(filled, self.capacity)
    }
}

impl Default for FrameDecoder {
    fn default() -> Self {
        Self {
            capacity: MAX_PAYLOAD_SIZE + HEADER_SIZE,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CAP: usize = MAX_PAYLOAD_SIZE + HEADER_SIZE;

    #[test]
    fn test_encode_header() {
        let frame = encode_frame(&[0x0A, 0x01]).unwrap();
        assert_eq!(frame.as_ref(), &[0x94, 0xC3, 0x00, 0x02, 0x0A, 0x01]);
    }

    #[test]
    fn test_encode_rejects_oversized_payload() {
        let payload = vec![0u8; MAX_PAYLOAD_SIZE + 1];
        assert_eq!(
            encode_frame(&payload),
            Err(WireError::PayloadTooLarge {
                size: MAX_PAYLOAD_SIZE + 1,
                max: MAX_PAYLOAD_SIZE
            })
        );
    }

    #[test]
    fn test_extract_roundtrip_boundary_sizes() {
        for len in [0usize, 1, 255, 256, MAX_PAYLOAD_SIZE] {
            let payload: Vec<u8> = (0..len).map(|i| i as u8).collect();
            let frame = encode_frame(&payload).unwrap();
            assert_eq!(
                try_extract(&frame, CAP),
                Extract::Frame {
                    payload: &payload[..],
                    consumed: HEADER_SIZE + len
                }
            );
        }
    }

    #[test]
    fn test_extract_short_buffer_is_empty() {
        assert_eq!(try_extract(&[], CAP), Extract::Empty);
        assert_eq!(try_extract(&[0x94, 0xC3, 0x00], CAP), Extract::Empty);
    }

    #[test]
    fn test_extract_bad_magic_is_corrupt() {
        assert_eq!(try_extract(&[0x94, 0x00, 0x00, 0x00], CAP), Extract::Corrupt);
        assert_eq!(try_extract(&[0x00, 0xC3, 0x00, 0x00], CAP), Extract::Corrupt);
    }

    #[test]
    fn test_extract_partial_payload_is_incomplete() {
        assert_eq!(
            try_extract(&[0x94, 0xC3, 0x00, 0x03, 0x01], CAP),
            Extract::Incomplete
        );
    }

    #[test]
    fn test_wild_length_is_corrupt_not_incomplete() {
        assert_eq!(try_extract(&[0x94, 0xC3, 0xFF, 0xFF], 512), Extract::Corrupt);
        // One byte more than the buffer could ever hold
        let len = (CAP - HEADER_SIZE + 1) as u16;
        let hdr = [0x94, 0xC3, (len >> 8) as u8, len as u8];
        assert_eq!(try_extract(&hdr, CAP), Extract::Corrupt);
    }

    #[test]
    fn test_extract_leaves_trailing_bytes() {
        let mut buf = encode_frame(b"ab").unwrap().to_vec();
        buf.extend_from_slice(&[0x94, 0xC3]);
        assert_eq!(
            try_extract(&buf, CAP),
            Extract::Frame {
                payload: b"ab",
                consumed: 6
            }
        );
    }

    #[test]
    fn test_decoder_rejects_tiny_capacity() {
        assert_eq!(FrameDecoder::new(3).unwrap_err(), WireError::Capacity(3));
        let decoder = FrameDecoder::new(64).unwrap();
        assert_eq!(decoder.max_payload(), 60);
    }
}
