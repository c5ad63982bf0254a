//! Receiver finite-state machine (FSM) types.
//!
//! This module defines every state a [`crate::gbn_receiver::GbnReceiver`] can
//! occupy and the reason it finished.  Transitions live in
//! [`crate::gbn_receiver`]; keeping the types here lets the transfer driver
//! and tests match on them without pulling in receiver internals.

use std::fmt;

/// All possible states of the receiver FSM.
///
/// ```text
///            timeout                    data frame
///          ┌─────────┐               ┌────────────┐
///          ▼         │   data frame  ▼            │
///  WAITING_FIRST_PACKET ───────────▶ RECEIVING ───┘
///          │                             │
///          │ sentinel                    │ sentinel or timeout
///          ▼                             ▼
///     DONE(Sentinel)        DONE(Sentinel | Inactivity)
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReceiverState {
    /// Nothing has arrived yet; silence is not an end-of-stream signal here.
    #[default]
    WaitingFirstPacket,
    /// At least one data frame has arrived.
    Receiving,
    /// The stream is complete; the buffer can be handed off.
    Done(Completion),
}

impl ReceiverState {
    pub fn is_done(&self) -> bool {
        matches!(self, Self::Done(_))
    }
}

impl fmt::Display for ReceiverState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::WaitingFirstPacket => write!(f, "WAITING_FIRST_PACKET"),
            Self::Receiving => write!(f, "RECEIVING"),
            Self::Done(reason) => write!(f, "DONE ({reason})"),
        }
    }
}

/// Why the receiver stopped reading.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Completion {
    /// An end-of-stream frame arrived.
    Sentinel,
    /// The channel went quiet for the full inactivity timeout.
    Inactivity,
}

impl fmt::Display for Completion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Sentinel => write!(f, "sentinel"),
            Self::Inactivity => write!(f, "inactivity timeout"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_waiting() {
        assert_eq!(ReceiverState::default(), ReceiverState::WaitingFirstPacket);
        assert!(!ReceiverState::Receiving.is_done());
        assert!(ReceiverState::Done(Completion::Sentinel).is_done());
    }

    #[test]
    fn display_names() {
        assert_eq!(ReceiverState::Receiving.to_string(), "RECEIVING");
        assert_eq!(
            ReceiverState::Done(Completion::Inactivity).to_string(),
            "DONE (inactivity timeout)"
        );
    }
}
