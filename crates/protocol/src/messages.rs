//! Wire messages for the Veles lockstep protocol
//!
//! The message set is closed: every datagram on the wire is exactly one
//! `Message<I>`, where `I` is the application's input type. Timestamps are
//! monotonic clock readings in seconds, in the sender's own timebase; the
//! clock sync layer reconciles the two timebases from heartbeat round trips.
//!
//! Direction of each kind:
//! - client → server: `Connect`, `Heartbeat`, `SubmitInput`, `Ack`,
//!   `RequestAuthInput`
//! - server → client: `Connected`, `HeartbeatResponse`, `AuthInput`,
//!   `HintInput`

use crate::tick::{PlayerId, Tick};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Per-tick inputs, one entry per player
///
/// `BTreeMap` keeps iteration ordered by `PlayerId`, which every participant
/// relies on when feeding inputs to the deterministic step function.
pub type InputMap<I> = BTreeMap<PlayerId, I>;

/// A single protocol message, generic over the application input type
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Message<I> {
    /// Request to join the session (client → server)
    Connect {
        /// Sender's monotonic clock reading in seconds
        sent_at: f64,
    },

    /// Connection acknowledgement carrying the assigned id (server → client)
    Connected { player_id: PlayerId },

    /// Liveness announcement doubling as a clock sample request (client → server)
    Heartbeat {
        /// Sender's monotonic clock reading in seconds
        sent_at: f64,
    },

    /// Clock sample: echoes the client timestamp and adds the server's
    /// receive time (server → client)
    HeartbeatResponse { client_send: f64, server_recv: f64 },

    /// Local input for a target tick (client → server)
    SubmitInput { tick: Tick, input: I },

    /// Acknowledges the client's unbroken authoritative prefix (client → server)
    Ack { tick: Tick },

    /// Consecutive authoritative inputs starting at `head_tick`, followed by
    /// speculative hints for the ticks immediately after (server → client)
    ///
    /// `auth[i]` is the complete input map for `head_tick + i`. `hints[j]` is
    /// a possibly-partial map for `head_tick + auth.len() + j`; the hint base
    /// tick is implicit in the compact encoding.
    AuthInput {
        head_tick: Tick,
        auth: Vec<InputMap<I>>,
        hints: Vec<InputMap<I>>,
    },

    /// A single speculative input for one player at one tick (server → client)
    HintInput {
        tick: Tick,
        player: PlayerId,
        input: I,
    },

    /// Request for authoritative ticks the client is missing (client → server)
    RequestAuthInput { ticks: Vec<Tick> },
}

impl<I> Message<I> {
    /// Returns the tag of this message, for dispatch and logging
    pub fn kind(&self) -> MessageKind {
        match self {
            Message::Connect { .. } => MessageKind::Connect,
            Message::Connected { .. } => MessageKind::Connected,
            Message::Heartbeat { .. } => MessageKind::Heartbeat,
            Message::HeartbeatResponse { .. } => MessageKind::HeartbeatResponse,
            Message::SubmitInput { .. } => MessageKind::SubmitInput,
            Message::Ack { .. } => MessageKind::Ack,
            Message::AuthInput { .. } => MessageKind::AuthInput,
            Message::HintInput { .. } => MessageKind::HintInput,
            Message::RequestAuthInput { .. } => MessageKind::RequestAuthInput,
        }
    }
}

/// Message tags, the closed set of wire message kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MessageKind {
    Connect,
    Connected,
    Heartbeat,
    HeartbeatResponse,
    SubmitInput,
    Ack,
    AuthInput,
    HintInput,
    RequestAuthInput,
}

impl fmt::Display for MessageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            MessageKind::Connect => "Connect",
            MessageKind::Connected => "Connected",
            MessageKind::Heartbeat => "Heartbeat",
            MessageKind::HeartbeatResponse => "HeartbeatResponse",
            MessageKind::SubmitInput => "SubmitInput",
            MessageKind::Ack => "Ack",
            MessageKind::AuthInput => "AuthInput",
            MessageKind::HintInput => "HintInput",
            MessageKind::RequestAuthInput => "RequestAuthInput",
        };
        write!(f, "{}", name)
    }
}
