//! Bounded reassembly buffer.
//!
//! The buffer owns a fixed arena. Transport reads land in the free tail,
//! complete frames are taken from the front, and whatever follows a consumed
//! frame is shifted back to offset zero so no byte is parsed twice.

use crate::frame::{Extract, FrameDecoder, HEADER_SIZE, MAX_PAYLOAD_SIZE};
use crate::WireError;
use bytes::Bytes;
use tracing::{debug, trace, warn};

/// Default arena size: one maximum payload plus its header
pub const DEFAULT_BUFFER_CAPACITY: usize = MAX_PAYLOAD_SIZE + HEADER_SIZE;

/// Outcome of one [`ReassemblyBuffer::poll_frame`] call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Polled {
    /// Not even a header is buffered
    Empty,
    /// A frame has started but not finished arriving
    Incomplete,
    /// A complete frame was removed from the front of the buffer
    Frame {
        /// Payload bytes, header excluded
        payload: Bytes,
        /// Bytes removed from the buffer (header + payload)
        consumed: usize,
    },
    /// The buffered bytes were unusable and have been dropped
    Corrupt {
        /// Number of bytes discarded
        discarded: usize,
    },
}

impl Polled {
    /// Whether the caller should back off before polling again
    pub fn is_idle(&self) -> bool {
        matches!(self, Polled::Empty | Polled::Incomplete)
    }
}

/// Fixed-capacity byte arena that reassembles frames
#[derive(Debug)]
pub struct ReassemblyBuffer {
    arena: Box<[u8]>,
    filled: usize,
    decoder: FrameDecoder,
}

impl ReassemblyBuffer {
    /// Create a buffer with the default capacity
    pub fn new() -> Self {
        Self {
            arena: vec![0u8; DEFAULT_BUFFER_CAPACITY].into_boxed_slice(),
            filled: 0,
            decoder: FrameDecoder::default(),
        }
    }

    /// Create a buffer with a custom capacity
    pub fn with_capacity(capacity: usize) -> Result<Self, WireError> {
        let decoder = FrameDecoder::new(capacity)?;
        Ok(Self {
            arena: vec![0u8; capacity].into_boxed_slice(),
            filled: 0,
            decoder,
        })
    }

    /// Total arena size
    pub fn capacity(&self) -> usize {
        self.arena.len()
    }

    /// Number of buffered bytes
    pub fn len(&self) -> usize {
        self.filled
    }

    /// Whether no bytes are buffered
    pub fn is_empty(&self) -> bool {
        self.filled == 0
    }

    /// Free space left for transport reads
    pub fn remaining(&self) -> usize {
        self.arena.len() - self.filled
    }

    /// Buffered bytes, oldest first
    pub fn filled(&self) -> &[u8] {
        &self.arena[..self.filled]
    }

    /// Copy bytes into the free tail.
    ///
    /// Rejects the whole call if the bytes do not fit; nothing is written.
    pub fn append(&mut self, bytes: &[u8]) -> Result<(), WireError> {
        let free = self.remaining();
        if bytes.len() > free {
            return Err(WireError::Overflow {
                incoming: bytes.len(),
                free,
            });
        }

        self.arena[self.filled..self.filled + bytes.len()].copy_from_slice(bytes);
        self.filled += bytes.len();
        Ok(())
    }

    /// Free tail of the arena, for reading directly from a transport.
    ///
    /// Follow with [`commit`](Self::commit) for the number of bytes written.
    pub fn spare_mut(&mut self) -> &mut [u8] {
        &mut self.arena[self.filled..]
    }

    /// Mark `n` bytes of the free tail as filled
    pub fn commit(&mut self, n: usize) -> Result<(), WireError> {
        let free = self.remaining();
        if n > free {
            return Err(WireError::Overflow { incoming: n, free });
        }
        self.filled += n;
        Ok(())
    }

    /// Drop everything buffered
    pub fn clear(&mut self) {
        self.arena.fill(0);
        self.filled = 0;
    }

    /// Try to take one complete frame from the front of the buffer
    pub fn poll_frame(&mut self) -> Polled {
        let (payload, consumed) = match self.decoder.extract(&self.arena[..self.filled]) {
            Extract::Empty => return Polled::Empty,
            Extract::Incomplete => {
                trace!("Waiting for frame body ({} bytes buffered)", self.filled);
                return Polled::Incomplete;
            }
            Extract::Corrupt => {
                let discarded = self.filled;
                warn!("Discarding {} buffered bytes after corrupt frame header", discarded);
                self.clear();
                return Polled::Corrupt { discarded };
            }
            Extract::Frame { payload, consumed } => (Bytes::copy_from_slice(payload), consumed),
        };

        self.arena.copy_within(consumed..self.filled, 0);
        self.filled -= consumed;
        debug!(
            "Extracted frame: {} payload bytes, {} bytes left in buffer",
            payload.len(),
            self.filled
        );

        Polled::Frame { payload, consumed }
    }
}

impl Default for ReassemblyBuffer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::encode_frame;

    #[test]
    fn test_single_frame_empties_buffer() {
        let mut buf = ReassemblyBuffer::with_capacity(512).unwrap();
        buf.append(&[0x94, 0xC3, 0x00, 0x02, 0x0A, 0x01]).unwrap();

        assert_eq!(
            buf.poll_frame(),
            Polled::Frame {
                payload: Bytes::from_static(&[0x0A, 0x01]),
                consumed: 6
            }
        );
        assert_eq!(buf.len(), 0);
        assert_eq!(buf.poll_frame(), Polled::Empty);
    }

    #[test]
    fn test_wild_length_resets_buffer() {
        let mut buf = ReassemblyBuffer::with_capacity(512).unwrap();
        buf.append(&[0x94, 0xC3, 0xFF, 0xFF]).unwrap();

        assert_eq!(buf.poll_frame(), Polled::Corrupt { discarded: 4 });
        assert!(buf.is_empty());
    }

    #[test]
    fn test_split_delivery_at_every_boundary() {
        let payload: Vec<u8> = (0..40u8).collect();
        let frame = encode_frame(&payload).unwrap();

        for split in 0..=frame.len() {
            let mut buf = ReassemblyBuffer::new();
            buf.append(&frame[..split]).unwrap();
            if split < frame.len() {
                assert!(buf.poll_frame().is_idle(), "split at {}", split);
            }
            buf.append(&frame[split..]).unwrap();

            match buf.poll_frame() {
                Polled::Frame { payload: got, consumed } => {
                    assert_eq!(&got[..], payload.as_slice(), "split at {}", split);
                    assert_eq!(consumed, frame.len());
                }
                other => panic!("split at {}: unexpected {:?}", split, other),
            }
            assert!(buf.is_empty());
        }
    }

    #[test]
    fn test_byte_at_a_time_delivery() {
        let frame = encode_frame(b"hello radio").unwrap();
        let mut buf = ReassemblyBuffer::new();
        let mut frames = Vec::new();

        for byte in frame.iter() {
            buf.append(&[*byte]).unwrap();
            if let Polled::Frame { payload, .. } = buf.poll_frame() {
                frames.push(payload);
            }
        }

        assert_eq!(frames, vec![Bytes::from_static(b"hello radio")]);
    }

    #[test]
    fn test_back_to_back_frames_are_taken_one_per_poll() {
        let mut buf = ReassemblyBuffer::new();
        buf.append(&encode_frame(b"one").unwrap()).unwrap();
        buf.append(&encode_frame(b"two").unwrap()).unwrap();
        buf.append(&[0x94]).unwrap();

        let first = buf.poll_frame();
        assert!(matches!(first, Polled::Frame { ref payload, .. } if &payload[..] == b"one"));
        assert_eq!(buf.len(), 7 + 1);

        let second = buf.poll_frame();
        assert!(matches!(second, Polled::Frame { ref payload, .. } if &payload[..] == b"two"));
        assert_eq!(buf.filled(), &[0x94]);
        assert_eq!(buf.poll_frame(), Polled::Empty);
    }

    #[test]
    fn test_recovers_after_corrupt_prefix() {
        let mut buf = ReassemblyBuffer::new();
        let mut garbage = encode_frame(b"lost").unwrap().to_vec();
        garbage[0] = 0x00;
        garbage[1] = 0x00;
        buf.append(&garbage).unwrap();

        assert_eq!(buf.poll_frame(), Polled::Corrupt { discarded: 8 });

        buf.append(&encode_frame(b"next").unwrap()).unwrap();
        assert!(matches!(buf.poll_frame(), Polled::Frame { ref payload, .. } if &payload[..] == b"next"));
    }

    #[test]
    fn test_append_overflow_is_rejected_without_writing() {
        let mut buf = ReassemblyBuffer::with_capacity(8).unwrap();
        buf.append(&[0x94, 0xC3, 0x00]).unwrap();

        assert_eq!(
            buf.append(&[0u8; 6]),
            Err(WireError::Overflow {
                incoming: 6,
                free: 5
            })
        );
        assert_eq!(buf.len(), 3);
    }

    #[test]
    fn test_spare_and_commit() {
        let mut buf = ReassemblyBuffer::new();
        let frame = encode_frame(b"xy").unwrap();
        buf.spare_mut()[..frame.len()].copy_from_slice(&frame);
        buf.commit(frame.len()).unwrap();

        assert!(matches!(buf.poll_frame(), Polled::Frame { consumed: 6, .. }));
        assert!(buf.commit(DEFAULT_BUFFER_CAPACITY + 1).is_err());
    }

    #[test]
    fn test_full_size_frame_fits_default_capacity() {
        let payload = vec![0x5Au8; MAX_PAYLOAD_SIZE];
        let mut buf = ReassemblyBuffer::new();
        buf.append(&encode_frame(&payload).unwrap()).unwrap();

        assert_eq!(buf.remaining(), 0);
        assert!(matches!(buf.poll_frame(), Polled::Frame { consumed, .. } if consumed == DEFAULT_BUFFER_CAPACITY));
    }
}
