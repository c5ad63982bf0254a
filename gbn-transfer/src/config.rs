//! Transfer parameters shared by sender and receiver.
//!
//! [`TransferConfig`] carries the four knobs of the protocol:
//! - packet size `M`: payload bytes per data packet,
//! - window size `K`: packets the sender may have in flight,
//! - retransmission timeout `T`: how long the sender waits for an ack
//!   before going back to `base`,
//! - inactivity timeout: how long a receiver that has seen traffic waits in
//!   silence before declaring the stream complete.
//!
//! Both ends only need to agree on `M` loosely: the receiver reads datagrams
//! of up to [`MAX_DATAGRAM`](crate::packet::MAX_DATAGRAM) bytes regardless of
//! its own setting.

use std::time::Duration;

use crate::error::TransferError;
use crate::packet::{HEADER_LEN, MAX_UDP_PAYLOAD};

/// Default payload bytes per data packet (`M`).
pub const DEFAULT_PACKET_SIZE: usize = 1024;
/// Default sender window (`K`).
pub const DEFAULT_WINDOW_SIZE: usize = 5;
/// Default sender retransmission timeout (`T`).
pub const DEFAULT_RETRANSMIT_TIMEOUT: Duration = Duration::from_millis(100);
/// Default receiver inactivity timeout.
pub const DEFAULT_INACTIVITY_TIMEOUT: Duration = Duration::from_millis(5000);
/// Well-known receiver port.
pub const DEFAULT_PORT: u16 = 10_000;

/// Largest payload that still fits in one IPv4 UDP datagram after the header.
pub const MAX_PACKET_SIZE: usize = MAX_UDP_PAYLOAD - HEADER_LEN;

/// Adjustable protocol parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferConfig {
    pub packet_size: usize,
    pub window_size: usize,
    pub retransmit_timeout: Duration,
    pub inactivity_timeout: Duration,
}

impl Default for TransferConfig {
    fn default() -> Self {
        Self {
            packet_size: DEFAULT_PACKET_SIZE,
            window_size: DEFAULT_WINDOW_SIZE,
            retransmit_timeout: DEFAULT_RETRANSMIT_TIMEOUT,
            inactivity_timeout: DEFAULT_INACTIVITY_TIMEOUT,
        }
    }
}

impl TransferConfig {
    pub fn with_packet_size(mut self, packet_size: usize) -> Self {
        self.packet_size = packet_size;
        self
    }

    pub fn with_window_size(mut self, window_size: usize) -> Self {
        self.window_size = window_size;
        self
    }

    pub fn with_retransmit_timeout(mut self, timeout: Duration) -> Self {
        self.retransmit_timeout = timeout;
        self
    }

    pub fn with_inactivity_timeout(mut self, timeout: Duration) -> Self {
        self.inactivity_timeout = timeout;
        self
    }

    /// Reject parameters the protocol cannot run with.
    pub fn validate(&self) -> Result<(), TransferError> {
        if self.packet_size == 0 || self.packet_size > MAX_PACKET_SIZE {
            return Err(TransferError::Config(format!(
                "packet size must be in 1..={MAX_PACKET_SIZE}, got {}",
                self.packet_size
            )));
        }
        if self.window_size == 0 {
            return Err(TransferError::Config(
                "window size must be at least 1".into(),
            ));
        }
        if self.retransmit_timeout.is_zero() {
            return Err(TransferError::Config(
                "retransmit timeout must be non-zero".into(),
            ));
        }
        if self.inactivity_timeout.is_zero() {
            return Err(TransferError::Config(
                "inactivity timeout must be non-zero".into(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_protocol_constants() {
        let cfg = TransferConfig::default();
        assert_eq!(cfg.packet_size, 1024);
        assert_eq!(cfg.window_size, 5);
        assert_eq!(cfg.retransmit_timeout, Duration::from_millis(100));
        assert_eq!(cfg.inactivity_timeout, Duration::from_secs(5));
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn zero_packet_size_rejected() {
        let cfg = TransferConfig::default().with_packet_size(0);
        assert!(matches!(cfg.validate(), Err(TransferError::Config(_))));
    }

    #[test]
    fn oversized_packet_rejected() {
        let cfg = TransferConfig::default().with_packet_size(MAX_PACKET_SIZE + 1);
        assert!(cfg.validate().is_err());

        let cfg = TransferConfig::default().with_packet_size(MAX_PACKET_SIZE);
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn largest_packet_fits_an_ipv4_datagram() {
        assert_eq!(MAX_PACKET_SIZE, 65_503);
        assert_eq!(MAX_PACKET_SIZE + HEADER_LEN, MAX_UDP_PAYLOAD);

        // Sizes the socket layer would refuse with EMSGSIZE.
        for size in [65_504, 65_527, crate::packet::MAX_DATAGRAM - HEADER_LEN] {
            let cfg = TransferConfig::default().with_packet_size(size);
            assert!(
                matches!(cfg.validate(), Err(TransferError::Config(_))),
                "packet size {size} accepted"
            );
        }
    }

    #[test]
    fn zero_window_rejected() {
        let cfg = TransferConfig::default().with_window_size(0);
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn zero_timeouts_rejected() {
        let cfg = TransferConfig::default().with_retransmit_timeout(Duration::ZERO);
        assert!(cfg.validate().is_err());

        let cfg = TransferConfig::default().with_inactivity_timeout(Duration::ZERO);
        assert!(cfg.validate().is_err());
    }
}
