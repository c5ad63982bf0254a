//! Fatal errors surfaced by a transfer.
//!
//! Loss, reordering, duplication and malformed frames are all handled inside
//! the protocol loops and never reach the caller.  What remains are setup
//! failures: the channel could not be opened, or the parameters are unusable.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum TransferError {
    /// Binding or querying the underlying socket failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid [`crate::config::TransferConfig`].
    #[error("configuration error: {0}")]
    Config(String),

    /// The payload needs more packets than an `i32` sequence number can address.
    #[error("payload of {len} bytes needs more than i32::MAX packets of {packet_size} bytes")]
    TooManyPackets { len: usize, packet_size: usize },
}
