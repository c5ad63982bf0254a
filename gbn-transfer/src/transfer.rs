//! Go-Back-N transfer drivers: one payload, one sender, one receiver.
//!
//! # Architecture
//!
//! ```text
//!  send_payload                                receive_payload
//!    └── GbnSender (window, seq nums)            └── GbnReceiver (expected_seq, buffer)
//!          │                                            ▲      │
//!          │  DATA seq=0..N-1, then SENTINEL            │      │ ACK k
//!          └────────────▶ Channel ─────────────────────┘      │
//!          ◀───────────────────────────────────────────────────┘
//! ```
//!
//! Each driver is a single async loop that exclusively owns its state
//! machine, so no locking is involved.  The loops only surface setup errors;
//! loss, duplication, reordering and malformed datagrams are all absorbed.
//!
//! ```ignore
//! let socket = Socket::bind("0.0.0.0:0".parse()?).await?;
//! let report = send_payload(&socket, receiver_addr, bytes, &TransferConfig::default()).await?;
//! ```

use std::net::SocketAddr;
use std::time::Duration;

use tokio::time::{sleep, sleep_until, timeout, timeout_at, Instant};

use crate::config::TransferConfig;
use crate::error::TransferError;
use crate::gbn_receiver::{GbnReceiver, ReceiverStats};
use crate::gbn_sender::{GbnSender, SenderStats};
use crate::packet::Frame;
use crate::socket::{Channel, SocketError};
use crate::state::{Completion, ReceiverState};

/// Pause after an OS-level receive error before reading again.
const IO_ERROR_BACKOFF: Duration = Duration::from_millis(100);

/// Outcome of a completed [`send_payload`].
#[derive(Debug, Clone, Copy)]
pub struct SendReport {
    pub stats: SenderStats,
    pub elapsed: Duration,
}

/// The reassembled stream handed to the downstream consumer.
#[derive(Debug, Clone)]
pub struct ReceivedPayload {
    /// Original payload bytes, in order.
    pub bytes: Vec<u8>,
    /// Source address of the first datagram, if any arrived.
    pub peer: Option<SocketAddr>,
    pub completion: Completion,
    pub stats: ReceiverStats,
}

/// Reliably deliver `payload` to the receiver at `peer`.
///
/// Splits the payload into `config.packet_size` packets, keeps up to
/// `config.window_size` in flight, and goes back to the window base whenever
/// `config.retransmit_timeout` passes without the window advancing.  Once
/// every packet is acknowledged a single sentinel is sent and the call
/// returns.
///
/// There is no retry ceiling: against a receiver that never answers this
/// future does not complete.  Wrap it in [`tokio::time::timeout`] to bound it.
pub async fn send_payload<C>(
    channel: &C,
    peer: SocketAddr,
    payload: Vec<u8>,
    config: &TransferConfig,
) -> Result<SendReport, TransferError>
where
    C: Channel + ?Sized,
{
    config.validate()?;
    let rto = config.retransmit_timeout;
    let mut sender = GbnSender::new(payload, config.packet_size, config.window_size)?;

    log::info!(
        "[gbn:send] {} packet(s) to {peer} (M={} K={} T={:?})",
        sender.total_packets(),
        config.packet_size,
        config.window_size,
        rto
    );
    let started = Instant::now();
    let mut deadline = started + rto;

    while !sender.is_complete() {
        // 1. Send-ahead: fill the window.
        while let Some(frame) = sender.next_frame() {
            log::debug!(
                "[gbn:send] → DATA seq={} len={} base={}",
                frame.seq,
                frame.payload.len(),
                sender.base()
            );
            if let Err(e) = channel.send_to(&frame, peer).await {
                log::warn!("[gbn:send] send of seq={} failed: {e}", frame.seq);
            }
        }

        // 2. Wait for an ACK until the retransmission deadline.
        match timeout_at(deadline, channel.recv_from()).await {
            Ok(Ok((ack, from))) => {
                if from != peer {
                    log::debug!("[gbn:send] ignoring datagram from {from}");
                    continue;
                }
                let slid = sender.on_ack(ack.seq);
                if slid > 0 {
                    deadline = Instant::now() + rto;
                    log::debug!(
                        "[gbn:send] ← ACK {} (slid {slid}, base={})",
                        ack.seq,
                        sender.base()
                    );
                } else {
                    log::debug!("[gbn:send] ← ACK {} ignored (base={})", ack.seq, sender.base());
                }
            }
            Ok(Err(SocketError::Frame(e))) => {
                log::debug!("[gbn:send] dropping malformed ACK: {e}");
            }
            Ok(Err(SocketError::Io(e))) => {
                // Indistinguishable from loss: wait out the deadline.
                log::warn!("[gbn:send] receive failed: {e}");
                sleep_until(deadline).await;
            }
            Err(_elapsed) => {
                log::debug!(
                    "[gbn:send] timeout, going back to seq={} ({} in flight)",
                    sender.base(),
                    sender.in_flight()
                );
                sender.on_timeout();
                deadline = Instant::now() + rto;
            }
        }
    }

    // The sentinel is sent once and never acknowledged.
    if let Err(e) = channel.send_to(&Frame::sentinel(), peer).await {
        log::warn!("[gbn:send] send of sentinel failed: {e}");
    }
    let report = SendReport {
        stats: sender.stats(),
        elapsed: started.elapsed(),
    };
    log::info!(
        "[gbn:send] complete in {:?}: {} transmission(s), {} retransmission(s), {} timeout(s)",
        report.elapsed,
        report.stats.transmissions,
        report.stats.retransmissions,
        report.stats.timeouts
    );
    Ok(report)
}

/// Receive one payload, acknowledging in-order packets as they arrive.
///
/// Returns once an end-of-stream frame arrives, or once the channel has been
/// silent for `config.inactivity_timeout` after at least one data frame.
/// Before the first frame the receiver waits indefinitely.
pub async fn receive_payload<C>(
    channel: &C,
    config: &TransferConfig,
) -> Result<ReceivedPayload, TransferError>
where
    C: Channel + ?Sized,
{
    config.validate()?;
    let mut receiver = GbnReceiver::new();
    let mut peer = None;

    log::info!("[gbn:recv] waiting for packets on {}", channel.local_addr());

    let completion = loop {
        if let ReceiverState::Done(completion) = receiver.state() {
            break completion;
        }

        match timeout(config.inactivity_timeout, channel.recv_from()).await {
            Ok(Ok((frame, from))) => {
                if peer.is_none() {
                    log::info!("[gbn:recv] first datagram from {from}");
                    peer = Some(from);
                }
                let expected = receiver.expected_seq();
                match receiver.on_frame(&frame) {
                    Some(ack) => {
                        log::debug!(
                            "[gbn:recv] ← DATA seq={} len={} accepted={}; → ACK {}",
                            frame.seq,
                            frame.payload.len(),
                            frame.seq == expected,
                            ack.seq
                        );
                        if let Err(e) = channel.send_to(&ack, from).await {
                            log::warn!("[gbn:recv] send of ACK {} failed: {e}", ack.seq);
                        }
                    }
                    None => log::debug!("[gbn:recv] ← end of stream (seq={})", frame.seq),
                }
            }
            Ok(Err(SocketError::Frame(e))) => {
                receiver.on_malformed();
                log::debug!("[gbn:recv] dropping malformed datagram: {e}");
            }
            Ok(Err(SocketError::Io(e))) => {
                log::warn!("[gbn:recv] receive failed: {e}");
                sleep(IO_ERROR_BACKOFF).await;
            }
            Err(_elapsed) => {
                if receiver.has_started() {
                    log::info!(
                        "[gbn:recv] no traffic for {:?}; treating stream as complete",
                        config.inactivity_timeout
                    );
                } else {
                    log::debug!("[gbn:recv] still waiting for the first packet");
                }
                receiver.on_timeout();
            }
        }
    };

    let stats = receiver.stats();
    let bytes = receiver.into_payload();
    log::info!(
        "[gbn:recv] done ({completion}): {} byte(s) in {} packet(s), {} out of order, {} ACK(s) sent",
        bytes.len(),
        stats.accepted,
        stats.out_of_order,
        stats.acks
    );
    Ok(ReceivedPayload {
        bytes,
        peer,
        completion,
        stats,
    })
}
