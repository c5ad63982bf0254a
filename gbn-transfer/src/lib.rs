//! `gbn-transfer`: reliable single-file delivery over UDP with Go-Back-N.
//!
//! # Architecture
//!
//! ```text
//!  ┌──────────────┐   DATA / SENTINEL  ┌────────────────┐
//!  │  GbnSender   │───────────────────▶│  GbnReceiver   │
//!  └──────┬───────┘                    └───────┬────────┘
//!         │               ACKs                 │
//!         │◀───────────────────────────────────┘
//!         │
//!  ┌──────▼─────────────────────────────────────┐
//!  │  transfer::{send_payload, receive_payload} │
//!  │  (own the state machines + the channel)    │
//!  └──────┬─────────────────────────────────────┘
//!         │ frames
//!  ┌──────▼──────┐      ┌─────────────┐
//!  │  Channel    │◀─────│  Simulator  │  (optional loss / reorder / dup)
//!  │  (Socket)   │      └─────────────┘
//!  └─────────────┘
//! ```
//!
//! Each module has a single responsibility:
//! - [`packet`]        wire format (4-byte sequence header + payload)
//! - [`config`]        packet size, window, timeouts
//! - [`error`]         fatal setup errors
//! - [`state`]         receiver finite-state-machine types
//! - [`gbn_sender`]    sliding-window send state machine
//! - [`gbn_receiver`]  in-order accept / re-ACK state machine
//! - [`socket`]        async datagram channel abstraction over tokio UDP
//! - [`simulator`]     fault-injecting channel for testing
//! - [`transfer`]      async driver loops for both roles

pub mod config;
pub mod error;
pub mod gbn_receiver;
pub mod gbn_sender;
pub mod packet;
pub mod simulator;
pub mod socket;
pub mod state;
pub mod transfer;

pub use config::TransferConfig;
pub use error::TransferError;
pub use packet::{Frame, FrameError};
pub use socket::{Channel, Socket, SocketError};
pub use state::{Completion, ReceiverState};
pub use transfer::{receive_payload, send_payload, ReceivedPayload, SendReport};
