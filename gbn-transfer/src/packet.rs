//! Wire-format definitions for data packets, acknowledgments and the
//! end-of-stream sentinel.
//!
//! Every datagram exchanged between sender and receiver is a [`Frame`].  This
//! module is responsible for:
//! - Defining the on-wire binary layout (sequence header + raw payload).
//! - Serialising a [`Frame`] into a byte buffer ready for transmission.
//! - Deserialising a raw byte slice back into a [`Frame`], returning an error
//!   for datagrams too short to carry a header.
//!
//! No I/O happens here; this is pure data transformation.
//!
//! # Wire format
//!
//! All multi-byte integers are **big-endian**.
//!
//! ```text
//!  0               1               2               3
//!  0 1 2 3 4 5 6 7 0 1 2 3 4 5 6 7 0 1 2 3 4 5 6 7 0 1 2 3 4 5 6 7
//! +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//! |                  Sequence Number (signed, i32)                |
//! +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//! |                  Payload (0..M bytes) ...                     |
//! +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//! ```
//!
//! The same layout serves three purposes:
//!
//! | Frame      | Sequence          | Payload        |
//! |------------|-------------------|----------------|
//! | Data       | `0, 1, 2, ...`    | 1..=M bytes    |
//! | Sentinel   | [`SENTINEL_SEQ`]  | empty          |
//! | Ack        | last accepted seq | empty          |
//!
//! There is no length field: the payload is every byte after the header, so
//! the datagram boundary delimits the frame.

use thiserror::Error;

/// Byte length of the fixed-size header on the wire.
pub const HEADER_LEN: usize = 4;

/// Reserved sequence number marking end-of-stream.
pub const SENTINEL_SEQ: i32 = -1;

/// Largest datagram either side will ever read.
pub const MAX_DATAGRAM: usize = 65_535;

/// Largest UDP payload an IPv4 datagram can carry (65535 minus the 20-byte IP
/// and 8-byte UDP headers).  Anything bigger fails with `EMSGSIZE`.
pub const MAX_UDP_PAYLOAD: usize = 65_507;

/// A decoded datagram: sequence header + payload bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    /// Packet sequence number, or the acknowledged sequence for acks.
    pub seq: i32,
    pub payload: Vec<u8>,
}

impl Frame {
    /// A data packet carrying `payload` at position `seq`.
    pub fn data(seq: i32, payload: Vec<u8>) -> Self {
        Self { seq, payload }
    }

    /// A cumulative acknowledgment: every packet `<= seq` has been accepted.
    pub fn ack(seq: i32) -> Self {
        Self {
            seq,
            payload: Vec::new(),
        }
    }

    /// The end-of-stream sentinel.
    pub fn sentinel() -> Self {
        Self::ack(SENTINEL_SEQ)
    }

    /// `true` when a receiver must treat this frame as end-of-stream.
    ///
    /// Any empty payload counts, not just [`SENTINEL_SEQ`]: an empty data
    /// packet is indistinguishable from a finished stream.
    pub fn is_end_of_stream(&self) -> bool {
        self.seq == SENTINEL_SEQ || self.payload.is_empty()
    }

    /// Length of this frame once encoded.
    pub fn encoded_len(&self) -> usize {
        HEADER_LEN + self.payload.len()
    }

    /// Serialise this frame into a newly allocated byte vector.
    pub fn encode(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(self.encoded_len());
        buf.extend_from_slice(&self.seq.to_be_bytes());
        buf.extend_from_slice(&self.payload);
        buf
    }

    /// Parse a [`Frame`] from a raw datagram.
    ///
    /// Returns [`FrameError::TooShort`] if `buf` cannot hold the 4-byte header.
    /// Callers drop such datagrams; a malformed frame is never fatal.
    pub fn decode(buf: &[u8]) -> Result<Self, FrameError> {
        let Some((header, payload)) = buf.split_first_chunk::<HEADER_LEN>() else {
            return Err(FrameError::TooShort { len: buf.len() });
        };
        Ok(Self {
            seq: i32::from_be_bytes(*header),
            payload: payload.to_vec(),
        })
    }
}

/// Errors that can arise when parsing a raw datagram.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FrameError {
    /// Datagram shorter than the fixed header.
    #[error("datagram of {len} byte(s) is too short to contain a 4-byte header")]
    TooShort { len: usize },
}
