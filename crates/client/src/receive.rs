//! Receive loop: turns inbound datagrams into store mutations
//!
//! One long-lived task per client. Every message's mutations happen under a
//! single hold of the state lock, so sampling never observes a half-applied
//! message. Undecodable datagrams and client-illegal kinds are dropped; the
//! transport already promised nothing beyond per-datagram integrity.

use crate::{ClientShared, MAX_REQUEST_AUTH_INPUTS};
use bytes::Bytes;
use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::{mpsc, watch};
use veles_protocol::{Codec, Message, MessageKind, PlayerId, PostcardCodec, Tick};
use veles_simulation::Simulation;

pub(crate) struct ReceiveLoop<S: Simulation> {
    shared: Arc<ClientShared<S>>,
    incoming_rx: mpsc::Receiver<Bytes>,
    connected_tx: watch::Sender<Option<PlayerId>>,
    /// Client-illegal kinds already complained about, to log each only once
    rejected_kinds: HashSet<MessageKind>,
}

impl<S: Simulation> ReceiveLoop<S> {
    pub fn new(
        shared: Arc<ClientShared<S>>,
        incoming_rx: mpsc::Receiver<Bytes>,
        connected_tx: watch::Sender<Option<PlayerId>>,
    ) -> Self {
        Self {
            shared,
            incoming_rx,
            connected_tx,
            rejected_kinds: HashSet::new(),
        }
    }

    pub async fn run(mut self) {
        while let Some(datagram) = self.incoming_rx.recv().await {
            match PostcardCodec.decode::<Message<S::Input>>(&datagram) {
                Ok(message) => self.handle_message(message),
                Err(e) => {
                    // Corrupt or foreign datagram; equivalent to loss.
                    tracing::debug!(error = %e, len = datagram.len(), "dropping undecodable datagram");
                }
            }
        }
        tracing::debug!("receive loop stopped: transport channel closed");
    }

    fn handle_message(&mut self, message: Message<S::Input>) {
        match message {
            Message::Connected { player_id } => self.handle_connected(player_id),

            Message::HeartbeatResponse {
                client_send,
                server_recv,
            } => {
                let now = self.shared.now();
                self.shared.clock.lock().record(client_send, server_recv, now);
            }

            Message::AuthInput {
                head_tick,
                auth,
                hints,
            } => self.handle_auth_input(head_tick, auth, hints),

            Message::HintInput {
                tick,
                player,
                input,
            } => {
                self.shared.state.lock().insert_hint_one(tick, player, input);
            }

            other => {
                // Server-bound kinds have no business arriving here.
                let kind = other.kind();
                if self.rejected_kinds.insert(kind) {
                    tracing::warn!(kind = %kind, "ignoring client-illegal inbound message");
                }
            }
        }
    }

    fn handle_connected(&mut self, player_id: PlayerId) {
        let mut st = self.shared.state.lock();
        match st.my_player_id {
            None => {
                st.my_player_id = Some(player_id);
                drop(st);
                tracing::info!(player_id = %player_id, "connected");
                let _ = self.connected_tx.send(Some(player_id));
            }
            Some(existing) => {
                tracing::debug!(
                    player_id = %existing,
                    duplicate = %player_id,
                    "ignoring duplicate connection acknowledgement"
                );
            }
        }
    }

    fn handle_auth_input(
        &mut self,
        head_tick: Tick,
        auth: Vec<veles_protocol::InputMap<S::Input>>,
        hints: Vec<veles_protocol::InputMap<S::Input>>,
    ) {
        let newest_tick = head_tick + auth.len() as i64 - 1;

        let (ack_tick, missing) = {
            let mut st = self.shared.state.lock();

            if st.extend_auth_prefix(head_tick, newest_tick) {
                tracing::trace!(max_auth_tick = %st.max_auth_tick, "authoritative prefix extended");
            }

            for (i, inner) in auth.into_iter().enumerate() {
                let tick = head_tick + i as i64;
                if let Err(e) = st.insert_auth(tick, inner) {
                    tracing::debug!(error = %e, "dropping duplicate authoritative inputs");
                }
            }

            let self_player = st.my_player_id;
            for (i, inner) in hints.into_iter().enumerate() {
                st.merge_hint(newest_tick + 1 + i as i64, inner, self_player);
            }

            (st.max_auth_tick, st.missing_auth_ticks(MAX_REQUEST_AUTH_INPUTS))
        };

        self.shared.send(&Message::Ack { tick: ack_tick });

        if !missing.is_empty() {
            tracing::debug!(
                count = missing.len(),
                oldest = %missing[0],
                "requesting missing authoritative ticks"
            );
            self.shared.send(&Message::RequestAuthInput { ticks: missing });
        }
    }
}
