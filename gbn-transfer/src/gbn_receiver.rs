//! Go-Back-N receive-side state machine.
//!
//! [`GbnReceiver`] implements the receiver side of Go-Back-N:
//!
//! - Only the **next expected** packet (`seq == expected_seq`) is accepted;
//!   its payload is appended to the reassembly buffer and acknowledged with
//!   `ack = seq`.
//! - Out-of-order or duplicate packets are **discarded** without buffering
//!   and answered with a repeat of the last good ACK (`expected_seq - 1`).
//!   Those repeats are what drive the sender back to its window base.
//! - An end-of-stream frame moves the machine to
//!   [`ReceiverState::Done`] and produces no ACK.
//!
//! This module only manages state; all socket I/O is the caller's
//! responsibility.  The caller sends whatever ACK [`GbnReceiver::on_frame`]
//! returns back to the datagram's source address.

use crate::packet::Frame;
use crate::state::{Completion, ReceiverState};

/// Counters describing what the receiver saw.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReceiverStats {
    /// Packets appended to the buffer.
    pub accepted: u64,
    /// Packets rejected because they were not the expected sequence.
    pub out_of_order: u64,
    /// Datagrams too short to decode.
    pub malformed: u64,
    /// ACK frames produced.
    pub acks: u64,
}

/// Go-Back-N receive-side state for one transfer.
#[derive(Debug, Default)]
pub struct GbnReceiver {
    /// Next sequence number that will be accepted.
    ///
    /// Only ever advances by exactly one, and only on acceptance.
    expected_seq: i32,

    /// In-order payload bytes of packets `0..expected_seq`.
    buffer: Vec<u8>,

    state: ReceiverState,

    stats: ReceiverStats,
}

impl GbnReceiver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> ReceiverState {
        self.state
    }

    pub fn expected_seq(&self) -> i32 {
        self.expected_seq
    }

    /// Bytes reassembled so far.
    pub fn buffer(&self) -> &[u8] {
        &self.buffer
    }

    pub fn stats(&self) -> ReceiverStats {
        self.stats
    }

    /// `true` once at least one data frame has arrived.
    pub fn has_started(&self) -> bool {
        self.state != ReceiverState::WaitingFirstPacket
    }

    /// Process one decoded frame.
    ///
    /// Returns the ACK to send back, or `None` for end-of-stream frames and
    /// for anything arriving after the machine is done.
    pub fn on_frame(&mut self, frame: &Frame) -> Option<Frame> {
        if self.state.is_done() {
            return None;
        }
        if frame.is_end_of_stream() {
            self.state = ReceiverState::Done(Completion::Sentinel);
            return None;
        }
        self.state = ReceiverState::Receiving;

        let ack = if frame.seq == self.expected_seq {
            self.buffer.extend_from_slice(&frame.payload);
            self.stats.accepted += 1;
            let accepted = self.expected_seq;
            self.expected_seq += 1;
            accepted
        } else {
            // Out-of-order or duplicate: drop and repeat the last good ACK.
            self.stats.out_of_order += 1;
            self.expected_seq - 1
        };
        self.stats.acks += 1;
        Some(Frame::ack(ack))
    }

    /// Record a datagram that was too short to decode.
    ///
    /// Has no effect on `expected_seq` or the FSM state.
    pub fn on_malformed(&mut self) {
        self.stats.malformed += 1;
    }

    /// The inactivity timeout elapsed with no datagram.
    ///
    /// Ends the stream only if something has arrived; before the first packet
    /// the receiver keeps waiting indefinitely.
    pub fn on_timeout(&mut self) {
        if self.state == ReceiverState::Receiving {
            self.state = ReceiverState::Done(Completion::Inactivity);
        }
    }

    /// Hand over the reassembled bytes.
    pub fn into_payload(self) -> Vec<u8> {
        self.buffer
    }
}
