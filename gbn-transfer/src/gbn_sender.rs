//! Go-Back-N send-side state machine.
//!
//! [`GbnSender`] owns a payload split into fixed-size packets and the sliding
//! window over them.  Up to `window_size` packets may be outstanding at once.
//!
//! # Protocol contract
//!
//! - Packets are numbered `0..N` where `N = ceil(len / packet_size)`.
//! - ACKs are **cumulative**: `ack = k` means the receiver has accepted every
//!   packet `0..=k` in order, so one ACK may clear several packets.
//! - ACKs below `base` are stale or duplicated and are ignored.
//! - On timeout the caller calls [`GbnSender::on_timeout`], which rewinds
//!   `next_to_send` to `base`; the following send-ahead step then retransmits
//!   the entire outstanding window (go back to N).
//! - There is no retry ceiling: the sender keeps going back until every
//!   packet is acknowledged.
//!
//! This module only manages state; all socket I/O is the caller's
//! responsibility.

use crate::error::TransferError;
use crate::packet::Frame;

/// Counters describing how a transfer went.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SenderStats {
    /// Number of data packets the payload was split into (`N`).
    pub packets: usize,
    /// Data frames handed to the channel, first sends and resends.
    pub transmissions: u64,
    /// Data frames sent for a sequence number that had been sent before.
    pub retransmissions: u64,
    /// Retransmission timeouts that fired.
    pub timeouts: u64,
    /// ACKs ignored because they were below `base`.
    pub stale_acks: u64,
    /// ACKs ignored because they named a packet never sent.
    pub spurious_acks: u64,
}

/// Go-Back-N send-side state for one transfer.
///
/// # Sequence-number layout
///
/// ```text
///  base           next_to_send     base + K          N
///   │                   │             │              │
///  ─┼───────────────────┼─────────────┼──────────────┼──▶ seq space
///   │ <── in flight ──▶ │ <─ usable ─▶│ <── later ──▶│
/// ```
///
/// Invariant: `base <= next_to_send <= min(base + K, N)`.
#[derive(Debug)]
pub struct GbnSender {
    payload: Vec<u8>,
    packet_size: usize,
    window_size: usize,
    total_packets: usize,

    /// Lowest unacknowledged sequence number (left window edge).
    base: usize,
    /// Lowest sequence number not yet (re)sent in the current round.
    next_to_send: usize,
    /// One past the highest sequence number ever transmitted.
    high_water: usize,

    stats: SenderStats,
}

impl GbnSender {
    /// Split `payload` into `packet_size`-byte packets behind a window of
    /// `window_size`.
    pub fn new(
        payload: Vec<u8>,
        packet_size: usize,
        window_size: usize,
    ) -> Result<Self, TransferError> {
        if packet_size == 0 {
            return Err(TransferError::Config("packet size must be at least 1".into()));
        }
        if window_size == 0 {
            return Err(TransferError::Config("window size must be at least 1".into()));
        }
        let total_packets = payload.len().div_ceil(packet_size);
        if i32::try_from(total_packets).is_err() {
            return Err(TransferError::TooManyPackets {
                len: payload.len(),
                packet_size,
            });
        }
        Ok(Self {
            payload,
            packet_size,
            window_size,
            total_packets,
            base: 0,
            next_to_send: 0,
            high_water: 0,
            stats: SenderStats {
                packets: total_packets,
                ..SenderStats::default()
            },
        })
    }

    /// Lowest unacknowledged sequence number.
    pub fn base(&self) -> usize {
        self.base
    }

    /// Next sequence number the send-ahead step will transmit.
    pub fn next_to_send(&self) -> usize {
        self.next_to_send
    }

    pub fn total_packets(&self) -> usize {
        self.total_packets
    }

    pub fn stats(&self) -> SenderStats {
        self.stats
    }

    /// Packets sent in the current round but not yet acknowledged.
    pub fn in_flight(&self) -> usize {
        self.next_to_send - self.base
    }

    /// `true` once every packet has been acknowledged.
    pub fn is_complete(&self) -> bool {
        self.base == self.total_packets
    }

    /// `true` when the send-ahead step may transmit another packet.
    pub fn can_send(&self) -> bool {
        self.next_to_send < self.base + self.window_size && self.next_to_send < self.total_packets
    }

    /// One send-ahead step: build packet `next_to_send` and advance.
    ///
    /// Returns `None` when the window is full or every packet has been sent.
    /// Call repeatedly until `None` to fill the window.
    pub fn next_frame(&mut self) -> Option<Frame> {
        if !self.can_send() {
            return None;
        }
        let seq = self.next_to_send;
        let frame = self.frame_at(seq);

        self.stats.transmissions += 1;
        if seq < self.high_water {
            self.stats.retransmissions += 1;
        }
        self.next_to_send += 1;
        self.high_water = self.high_water.max(self.next_to_send);
        Some(frame)
    }

    /// Process a cumulative ACK.
    ///
    /// Advances `base` to `ack + 1` and returns the number of newly
    /// acknowledged packets.  Returns `0` for a stale/duplicate ACK
    /// (`ack < base`) or one naming a packet that was never sent.
    pub fn on_ack(&mut self, ack: i32) -> usize {
        let Ok(acked) = usize::try_from(ack) else {
            // Negative: the receiver has accepted nothing yet.
            self.stats.stale_acks += 1;
            return 0;
        };
        if acked < self.base {
            self.stats.stale_acks += 1;
            return 0;
        }
        if acked >= self.high_water {
            self.stats.spurious_acks += 1;
            return 0;
        }

        let newly_acked = acked + 1 - self.base;
        self.base = acked + 1;
        // A late ACK can overtake a go-back-N rewind.
        if self.next_to_send < self.base {
            self.next_to_send = self.base;
        }
        newly_acked
    }

    /// Retransmission timeout: go back to `base`.
    pub fn on_timeout(&mut self) {
        self.stats.timeouts += 1;
        self.next_to_send = self.base;
    }

    fn frame_at(&self, seq: usize) -> Frame {
        let start = seq * self.packet_size;
        let end = (start + self.packet_size).min(self.payload.len());
        // `new` guarantees every packet index fits an i32.
        Frame::data(seq as i32, self.payload[start..end].to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sender(len: usize, packet_size: usize, window: usize) -> GbnSender {
        let payload: Vec<u8> = (0..len).map(|i| (i % 251) as u8).collect();
        GbnSender::new(payload, packet_size, window).unwrap()
    }

    fn drain(s: &mut GbnSender) -> Vec<Frame> {
        std::iter::from_fn(|| s.next_frame()).collect()
    }

    #[test]
    fn initial_state() {
        let s = sender(10, 4, 2);
        assert_eq!(s.base(), 0);
        assert_eq!(s.next_to_send(), 0);
        assert_eq!(s.total_packets(), 3);
        assert!(s.can_send());
        assert!(!s.is_complete());
        assert_eq!(s.in_flight(), 0);
    }

    #[test]
    fn five_thousand_bytes_make_five_packets() {
        let mut s = sender(5000, 1024, 5);
        assert_eq!(s.total_packets(), 5);

        let frames = drain(&mut s);
        let lens: Vec<usize> = frames.iter().map(|f| f.payload.len()).collect();
        assert_eq!(lens, vec![1024, 1024, 1024, 1024, 904]);
        let seqs: Vec<i32> = frames.iter().map(|f| f.seq).collect();
        assert_eq!(seqs, vec![0, 1, 2, 3, 4]);

        // Zero loss: one window round plus acks completes the transfer.
        for seq in 0..5 {
            assert_eq!(s.on_ack(seq), 1);
        }
        assert!(s.is_complete());
        assert_eq!(s.stats().transmissions, 5);
        assert_eq!(s.stats().retransmissions, 0);
    }

    #[test]
    fn frames_reassemble_to_payload() {
        let mut s = sender(5000, 1024, 5);
        let original = s.payload.clone();
        let joined: Vec<u8> = drain(&mut s).into_iter().flat_map(|f| f.payload).collect();
        assert_eq!(joined, original);
    }

    #[test]
    fn window_full_blocks_send() {
        let mut s = sender(100, 10, 3);
        assert_eq!(drain(&mut s).len(), 3);
        assert!(!s.can_send());
        assert_eq!(s.in_flight(), 3);
        assert!(s.next_frame().is_none());
    }

    #[test]
    fn ack_slides_window_by_one() {
        let mut s = sender(100, 10, 3);
        drain(&mut s);

        assert_eq!(s.on_ack(0), 1);
        assert_eq!(s.base(), 1);
        assert!(s.can_send());
        assert_eq!(s.next_frame().unwrap().seq, 3);
    }

    #[test]
    fn cumulative_ack_slides_multiple() {
        let mut s = sender(100, 10, 4);
        drain(&mut s);

        assert_eq!(s.on_ack(2), 3);
        assert_eq!(s.base(), 3);
        assert_eq!(s.in_flight(), 1);
    }

    #[test]
    fn duplicate_ack_is_ignored_and_base_does_not_regress() {
        let mut s = sender(100, 10, 5);
        drain(&mut s);

        assert_eq!(s.on_ack(1), 2);
        assert_eq!(s.base(), 2);

        assert_eq!(s.on_ack(1), 0);
        assert_eq!(s.base(), 2);
        assert_eq!(s.on_ack(0), 0);
        assert_eq!(s.base(), 2);
        assert_eq!(s.stats().stale_acks, 2);
    }

    #[test]
    fn negative_ack_is_stale() {
        let mut s = sender(100, 10, 5);
        drain(&mut s);
        assert_eq!(s.on_ack(-1), 0);
        assert_eq!(s.base(), 0);
    }

    #[test]
    fn spurious_ack_beyond_sent_ignored() {
        let mut s = sender(100, 10, 2);
        drain(&mut s); // sent 0, 1

        assert_eq!(s.on_ack(7), 0);
        assert_eq!(s.base(), 0);
        assert_eq!(s.stats().spurious_acks, 1);
    }

    #[test]
    fn timeout_goes_back_to_base() {
        let mut s = sender(100, 10, 4);
        drain(&mut s); // 0..4 in flight
        s.on_ack(1); // base = 2

        s.on_timeout();
        assert_eq!(s.next_to_send(), 2);
        assert_eq!(s.in_flight(), 0);

        // The whole outstanding window goes out again, then new packets.
        let seqs: Vec<i32> = drain(&mut s).iter().map(|f| f.seq).collect();
        assert_eq!(seqs, vec![2, 3, 4, 5]);
        assert_eq!(s.stats().retransmissions, 2);
        assert_eq!(s.stats().timeouts, 1);
    }

    #[test]
    fn lost_packet_is_resent_with_everything_after_it() {
        // Packet 2 is lost: the receiver acks 0, 1 and then re-acks 1 twice.
        let mut s = sender(5000, 1024, 5);
        drain(&mut s);
        assert_eq!(s.on_ack(0), 1);
        assert_eq!(s.on_ack(1), 1);
        assert_eq!(s.on_ack(1), 0);
        assert_eq!(s.on_ack(1), 0);

        s.on_timeout();
        let seqs: Vec<i32> = drain(&mut s).iter().map(|f| f.seq).collect();
        assert_eq!(seqs, vec![2, 3, 4]);

        for seq in 2..5 {
            s.on_ack(seq);
        }
        assert!(s.is_complete());
    }

    #[test]
    fn late_ack_after_rewind_keeps_next_ahead_of_base() {
        let mut s = sender(100, 10, 4);
        drain(&mut s); // 0..4 sent
        s.on_timeout(); // next_to_send = 0
        s.next_frame(); // resend 0

        // An ACK from the first round covering 0..=2 arrives late.
        assert_eq!(s.on_ack(2), 3);
        assert_eq!(s.base(), 3);
        assert_eq!(s.next_to_send(), 3);
        assert_eq!(s.next_frame().unwrap().seq, 3);
    }

    #[test]
    fn empty_payload_is_already_complete() {
        let mut s = sender(0, 1024, 5);
        assert_eq!(s.total_packets(), 0);
        assert!(s.is_complete());
        assert!(s.next_frame().is_none());
    }

    #[test]
    fn exact_multiple_has_no_short_tail() {
        let mut s = sender(2048, 1024, 5);
        let lens: Vec<usize> = drain(&mut s).iter().map(|f| f.payload.len()).collect();
        assert_eq!(lens, vec![1024, 1024]);
    }

    #[test]
    fn zero_window_rejected() {
        assert!(matches!(
            GbnSender::new(vec![1, 2, 3], 1, 0),
            Err(TransferError::Config(_))
        ));
    }
}
