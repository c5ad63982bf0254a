//! Async datagram channel abstraction.
//!
//! [`Channel`] is the seam between the protocol drivers in
//! [`crate::transfer`] and the network: it speaks [`Frame`]s instead of raw
//! bytes.  [`Socket`] implements it over `tokio::net::UdpSocket`;
//! [`crate::simulator::Simulator`] wraps any other channel and injects faults.
//! All protocol logic lives elsewhere; this module owns only byte I/O.

use std::net::SocketAddr;

use async_trait::async_trait;
use thiserror::Error;
use tokio::net::UdpSocket;

use crate::packet::{Frame, FrameError, MAX_DATAGRAM};

/// Errors that can arise from channel operations.
#[derive(Debug, Error)]
pub enum SocketError {
    /// Underlying I/O error from the OS.
    #[error("socket I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// The received datagram could not be decoded as a frame.
    #[error("frame decode error: {0}")]
    Frame(#[from] FrameError),
}

/// An unreliable, unordered datagram channel carrying [`Frame`]s.
///
/// Sends are best effort.  Receives yield one frame and the address it came
/// from; datagrams that fail to decode come back as
/// [`SocketError::Frame`] so the caller can drop them and keep reading.
#[async_trait]
pub trait Channel: Send + Sync {
    /// Encode `frame` and send it as a single datagram to `dest`.
    async fn send_to(&self, frame: &Frame, dest: SocketAddr) -> Result<(), SocketError>;

    /// Receive the next datagram and decode it.
    async fn recv_from(&self) -> Result<(Frame, SocketAddr), SocketError>;

    /// Address this channel is bound to.
    fn local_addr(&self) -> SocketAddr;
}

/// An async, frame-oriented UDP socket.
///
/// All methods are `&self` so the socket can be shared across tasks if needed.
#[derive(Debug)]
pub struct Socket {
    /// Address this socket is bound to (filled in after OS assigns ephemeral port).
    pub local_addr: SocketAddr,
    inner: UdpSocket,
}

impl Socket {
    /// Bind a new socket to `local_addr`.
    ///
    /// Passing `0.0.0.0:0` lets the OS choose an ephemeral port.
    pub async fn bind(local_addr: SocketAddr) -> Result<Self, SocketError> {
        let inner = UdpSocket::bind(local_addr).await?;
        let local_addr = inner.local_addr()?;
        Ok(Self { local_addr, inner })
    }
}

#[async_trait]
impl Channel for Socket {
    async fn send_to(&self, frame: &Frame, dest: SocketAddr) -> Result<(), SocketError> {
        self.inner.send_to(&frame.encode(), dest).await?;
        Ok(())
    }

    async fn recv_from(&self) -> Result<(Frame, SocketAddr), SocketError> {
        let mut buf = vec![0u8; MAX_DATAGRAM];
        let (n, addr) = self.inner.recv_from(&mut buf).await?;
        let frame = Frame::decode(&buf[..n])?;
        Ok((frame, addr))
    }

    fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }
}
