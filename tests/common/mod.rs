//! Shared harness for the integration suites: a toy deterministic game, a
//! hand-cranked clock, and a scripted in-process server speaking the wire
//! format over the memory transport.

#![allow(dead_code)] // each test binary uses a subset of the harness

use bytes::Bytes;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use veles_client::transport::MemoryTransport;
use veles_client::{ClockStats, ClockSync};
use veles_protocol::{Codec, InputMap, Message, MessageKind, PlayerId, PostcardCodec, Tick};
use veles_simulation::{InputPair, Simulation};

/// Accumulator input: each tick adds this amount to the player's total
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestInput(pub i64);

/// Per-player running totals
pub type TestWorld = BTreeMap<PlayerId, i64>;

/// Deterministic toy game: every player accumulates their current input
pub struct TestGame;

impl Simulation for TestGame {
    type Input = TestInput;
    type World = TestWorld;

    fn initial_input(&self) -> TestInput {
        TestInput(0)
    }

    fn initial_world(&self) -> TestWorld {
        TestWorld::new()
    }

    fn step(
        &self,
        inputs: &BTreeMap<PlayerId, InputPair<TestInput>>,
        _tick: Tick,
        world: &TestWorld,
    ) -> TestWorld {
        let mut next = world.clone();
        for (player, pair) in inputs {
            *next.entry(*player).or_insert(0) += pair.current.0;
        }
        next
    }
}

/// Clock estimator cranked by the test instead of by round trips
pub struct ManualClock {
    target: Arc<AtomicI64>,
}

impl ClockSync for ManualClock {
    fn record(&mut self, _client_send: f64, _server_recv: f64, _client_recv: f64) {}

    fn estimate_target_tick(&self, _now: f64, _extra_latency: f64) -> Tick {
        Tick::new(self.target.load(Ordering::SeqCst))
    }

    fn analytics(&self) -> Option<ClockStats> {
        None
    }
}

/// Returns the boxed clock plus the knob that moves its target tick
pub fn manual_clock(initial_target: i64) -> (Box<dyn ClockSync>, Arc<AtomicI64>) {
    let target = Arc::new(AtomicI64::new(initial_target));
    (
        Box::new(ManualClock {
            target: target.clone(),
        }),
        target,
    )
}

/// The server side of a memory link, driven explicitly by each test
pub struct ScriptedServer {
    to_client: mpsc::Sender<Bytes>,
    from_client: mpsc::Receiver<Bytes>,
}

impl ScriptedServer {
    /// Creates the server harness and the transport to hand to the client
    pub fn link() -> (Self, MemoryTransport) {
        let (c2s_tx, c2s_rx) = mpsc::channel(256);
        let (s2c_tx, s2c_rx) = mpsc::channel(256);

        let transport = MemoryTransport::new(c2s_tx, s2c_rx);
        let server = Self {
            to_client: s2c_tx,
            from_client: c2s_rx,
        };
        (server, transport)
    }

    pub async fn send(&self, message: &Message<TestInput>) {
        let datagram = PostcardCodec.encode(message).unwrap();
        self.to_client.send(datagram).await.unwrap();
    }

    /// Next client message, connection upkeep included
    pub async fn recv(&mut self) -> Message<TestInput> {
        let datagram = tokio::time::timeout(Duration::from_secs(5), self.from_client.recv())
            .await
            .expect("timed out waiting for a client message")
            .expect("client side of the link closed");
        PostcardCodec.decode(&datagram).unwrap()
    }

    /// Next client message that is not a Connect or Heartbeat
    pub async fn recv_protocol(&mut self) -> Message<TestInput> {
        loop {
            let message = self.recv().await;
            match message.kind() {
                MessageKind::Connect | MessageKind::Heartbeat => continue,
                _ => return message,
            }
        }
    }

    /// Asserts that no non-upkeep message arrives within `window`
    pub async fn expect_silence(&mut self, window: Duration) {
        let result = tokio::time::timeout(window, self.recv_protocol()).await;
        if let Ok(message) = result {
            panic!("expected protocol silence, got {}", message.kind());
        }
    }

    /// Completes the handshake: waits for a Connect, assigns `player_id`
    pub async fn accept(&mut self, player_id: u32) {
        loop {
            if let Message::Connect { .. } = self.recv().await {
                self.send(&Message::Connected {
                    player_id: PlayerId::new(player_id),
                })
                .await;
                return;
            }
        }
    }
}

/// Builds a per-tick input map from `(player, amount)` pairs
pub fn input_map(entries: &[(u32, i64)]) -> InputMap<TestInput> {
    entries
        .iter()
        .map(|&(player, amount)| (PlayerId::new(player), TestInput(amount)))
        .collect()
}

/// Gives the client's receive loop time to apply in-flight messages
pub async fn settle() {
    tokio::time::sleep(Duration::from_millis(100)).await;
}
