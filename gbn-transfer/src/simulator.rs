//! Fault-injecting channel for exercising the reliability mechanisms.
//!
//! Real networks drop, reorder, and duplicate datagrams.  To exercise the
//! Go-Back-N recovery paths without depending on actual network conditions,
//! [`Simulator`] wraps any [`Channel`] and applies a configurable fault model
//! to every **outbound** frame:
//!
//! | Fault         | Description                                          |
//! |---------------|------------------------------------------------------|
//! | Packet loss   | Drop a frame with probability `loss_rate`.           |
//! | Scripted loss | Drop the first send of each sequence in `drop_once`. |
//! | Reordering    | Delay a frame by `reorder_delay`, letting later      |
//! |               | frames overtake it.                                  |
//! | Duplication   | Deliver a frame twice.                               |
//!
//! Inbound frames pass through untouched; wrap both endpoints to impair both
//! directions.  All randomness comes from a seeded [`StdRng`], so a given
//! seed and send sequence always makes the same decisions.

use std::collections::HashSet;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::error::TransferError;
use crate::packet::Frame;
use crate::socket::{Channel, SocketError};

/// Configuration for the fault-injection model.
///
/// All probabilities are in the range `[0.0, 1.0]`.
#[derive(Debug, Clone)]
pub struct SimulatorConfig {
    /// Probability that any given frame is silently dropped.
    pub loss_rate: f64,
    /// Probability that a frame is delayed and so reordered.
    pub reorder_rate: f64,
    /// Fixed delay applied to reordered frames.
    pub reorder_delay: Duration,
    /// Probability that a frame is sent twice.
    pub duplicate_rate: f64,
    /// RNG seed.
    pub seed: u64,
    /// Sequence numbers whose first outbound frame is dropped.
    pub drop_once: Vec<i32>,
}

impl Default for SimulatorConfig {
    fn default() -> Self {
        // No faults by default: the simulator is a transparent pass-through.
        Self {
            loss_rate: 0.0,
            reorder_rate: 0.0,
            reorder_delay: Duration::ZERO,
            duplicate_rate: 0.0,
            seed: 0,
            drop_once: Vec::new(),
        }
    }
}

impl SimulatorConfig {
    /// Uniform random loss with the given seed.
    pub fn lossy(loss_rate: f64, seed: u64) -> Self {
        Self {
            loss_rate,
            seed,
            ..Self::default()
        }
    }

    pub fn validate(&self) -> Result<(), TransferError> {
        for (name, p) in [
            ("loss rate", self.loss_rate),
            ("reorder rate", self.reorder_rate),
            ("duplicate rate", self.duplicate_rate),
        ] {
            if !(0.0..=1.0).contains(&p) {
                return Err(TransferError::Config(format!(
                    "{name} must be within 0.0..=1.0, got {p}"
                )));
            }
        }
        Ok(())
    }
}

/// Snapshot of what the simulator did to outbound traffic.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SimulatorStats {
    pub sent: u64,
    pub dropped: u64,
    pub delayed: u64,
    pub duplicated: u64,
}

/// Per-frame decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Fate {
    Drop,
    Deliver { delay: bool, duplicate: bool },
}

#[derive(Debug, Default)]
struct Counters {
    sent: AtomicU64,
    dropped: AtomicU64,
    delayed: AtomicU64,
    duplicated: AtomicU64,
}

/// A fault-injecting wrapper around another [`Channel`].
#[derive(Debug)]
pub struct Simulator<C> {
    inner: Arc<C>,
    config: SimulatorConfig,
    rng: Mutex<StdRng>,
    pending_drops: Mutex<HashSet<i32>>,
    counters: Counters,
}

impl<C> Simulator<C> {
    pub fn new(inner: C, config: SimulatorConfig) -> Result<Self, TransferError> {
        config.validate()?;
        Ok(Self {
            inner: Arc::new(inner),
            rng: Mutex::new(StdRng::seed_from_u64(config.seed)),
            pending_drops: Mutex::new(config.drop_once.iter().copied().collect()),
            config,
            counters: Counters::default(),
        })
    }

    pub fn config(&self) -> &SimulatorConfig {
        &self.config
    }

    pub fn stats(&self) -> SimulatorStats {
        SimulatorStats {
            sent: self.counters.sent.load(Ordering::Relaxed),
            dropped: self.counters.dropped.load(Ordering::Relaxed),
            delayed: self.counters.delayed.load(Ordering::Relaxed),
            duplicated: self.counters.duplicated.load(Ordering::Relaxed),
        }
    }

    /// Decide what happens to `frame`.  Locks are released before returning.
    fn roll(&self, frame: &Frame) -> Fate {
        let scripted = self
            .pending_drops
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&frame.seq);
        if scripted {
            return Fate::Drop;
        }

        let mut rng = self.rng.lock().unwrap_or_else(PoisonError::into_inner);
        if rng.random::<f64>() < self.config.loss_rate {
            return Fate::Drop;
        }
        let delay = rng.random::<f64>() < self.config.reorder_rate;
        let duplicate = rng.random::<f64>() < self.config.duplicate_rate;
        Fate::Deliver { delay, duplicate }
    }
}

#[async_trait]
impl<C: Channel + 'static> Channel for Simulator<C> {
    async fn send_to(&self, frame: &Frame, dest: SocketAddr) -> Result<(), SocketError> {
        self.counters.sent.fetch_add(1, Ordering::Relaxed);

        let (delay, duplicate) = match self.roll(frame) {
            Fate::Drop => {
                self.counters.dropped.fetch_add(1, Ordering::Relaxed);
                log::debug!("[sim] dropped seq={} → {dest}", frame.seq);
                return Ok(());
            }
            Fate::Deliver { delay, duplicate } => (delay, duplicate),
        };

        if delay {
            self.counters.delayed.fetch_add(1, Ordering::Relaxed);
            log::debug!(
                "[sim] delaying seq={} by {:?}",
                frame.seq,
                self.config.reorder_delay
            );
            let inner = Arc::clone(&self.inner);
            let frame = frame.clone();
            let wait = self.config.reorder_delay;
            tokio::spawn(async move {
                tokio::time::sleep(wait).await;
                if let Err(e) = inner.send_to(&frame, dest).await {
                    log::warn!("[sim] delayed send of seq={} failed: {e}", frame.seq);
                }
            });
        } else {
            self.inner.send_to(frame, dest).await?;
        }

        if duplicate {
            self.counters.duplicated.fetch_add(1, Ordering::Relaxed);
            log::debug!("[sim] duplicating seq={}", frame.seq);
            self.inner.send_to(frame, dest).await?;
        }
        Ok(())
    }

    async fn recv_from(&self) -> Result<(Frame, SocketAddr), SocketError> {
        self.inner.recv_from().await
    }

    fn local_addr(&self) -> SocketAddr {
        self.inner.local_addr()
    }
}
