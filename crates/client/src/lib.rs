//! # Veles Client
//!
//! The client-side core of the Veles rollback/replay lockstep engine.
//!
//! Every participant runs the same deterministic tick function. The server
//! orders inputs per tick and broadcasts them; this crate predicts future
//! ticks from the freshest inputs it has and rolls back to re-simulate
//! whenever an authoritative input contradicts a prediction.
//!
//! ## Example
//!
//! ```no_run
//! use veles_client::{Client, ClientConfig};
//! use veles_client::transport::UdpTransport;
//! # use std::collections::BTreeMap;
//! # use veles_protocol::{PlayerId, Tick};
//! # use veles_simulation::{InputPair, Simulation};
//! # #[derive(Clone, PartialEq, serde::Serialize, serde::Deserialize)]
//! # struct Input;
//! # struct Game;
//! # impl Simulation for Game {
//! #     type Input = Input;
//! #     type World = ();
//! #     fn initial_input(&self) -> Input { Input }
//! #     fn initial_world(&self) {}
//! #     fn step(&self, _: &BTreeMap<PlayerId, InputPair<Input>>, _: Tick, _: &()) {}
//! # }
//!
//! #[tokio::main]
//! async fn main() {
//!     let transport = UdpTransport::new("127.0.0.1:5000".parse().unwrap());
//!     let client = Client::connect(Game, ClientConfig::new(60), transport)
//!         .await
//!         .unwrap();
//!
//!     loop {
//!         // let input = poll_local_input();
//!         # let input = Input;
//!         client.set_input(input);
//!         let world = client.sample();
//!         // render(world);
//!         # let _ = world;
//!     }
//! }
//! ```

pub mod clock;
pub mod config;
pub mod transport;

mod engine;
mod heartbeat;
mod receive;
mod state;
mod telemetry;

use bytes::Bytes;
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;

use crate::heartbeat::HeartbeatLoop;
use crate::receive::ReceiveLoop;
use crate::state::EngineState;

pub use crate::clock::{ClockStats, ClockSync, RoundTripClock};
pub use crate::config::ClientConfig;
pub use crate::telemetry::TELEMETRY_PORT_ENV;
pub use veles_protocol::{Codec, Message, PlayerId, PostcardCodec, Tick, Transport};
pub use veles_simulation::{InputPair, Simulation};

/// Cap on ticks named in a single `RequestAuthInput`
///
/// Bounds request amplification when the client is far behind; the rest of a
/// large gap is requested on later messages.
pub const MAX_REQUEST_AUTH_INPUTS: usize = 32;

/// Capacity of the datagram channels between engine and transport
const CHANNEL_CAPACITY: usize = 256;

/// State shared between the client handle and its background tasks
pub(crate) struct ClientShared<S: Simulation> {
    pub sim: S,
    pub config: ClientConfig,
    /// Origin of the client's monotonic timebase
    pub epoch: Instant,
    pub state: Mutex<EngineState<S::Input, S::World>>,
    pub clock: Mutex<Box<dyn ClockSync>>,
    pub outgoing_tx: mpsc::Sender<Bytes>,
}

impl<S: Simulation> ClientShared<S> {
    /// Seconds since the client started, on the monotonic clock
    pub fn now(&self) -> f64 {
        self.epoch.elapsed().as_secs_f64()
    }

    /// Best-effort send: encodes and hands the message to the transport
    ///
    /// A full channel or a dead transport counts as packet loss; the
    /// protocol recovers through heartbeats and re-requests.
    pub fn send(&self, message: &Message<S::Input>) {
        match PostcardCodec.encode(message) {
            Ok(datagram) => {
                if let Err(e) = self.outgoing_tx.try_send(datagram) {
                    tracing::debug!(kind = %message.kind(), error = %e, "dropping outbound message");
                }
            }
            Err(e) => {
                tracing::error!(kind = %message.kind(), error = %e, "failed to encode outbound message");
            }
        }
    }
}

/// Handle to a connected session
///
/// Constructed by [`Client::connect`], which only returns once the server
/// has assigned a player id, so every method on the handle may assume a
/// live, identified session. Dropping the handle stops the background
/// tasks.
pub struct Client<S: Simulation> {
    shared: Arc<ClientShared<S>>,
    player_id: PlayerId,
    tasks: Vec<JoinHandle<()>>,
}

impl<S: Simulation> Client<S> {
    /// Connects to the server behind `transport` and waits for an identity
    ///
    /// Spawns the transport bridge, the receive loop, the heartbeat loop and
    /// (if [`TELEMETRY_PORT_ENV`] is set) the telemetry endpoint, then blocks
    /// until the server acknowledges the connection.
    pub async fn connect<T: Transport>(
        sim: S,
        config: ClientConfig,
        transport: T,
    ) -> Result<Self, ConnectError> {
        let clock = RoundTripClock::new(config.tick_rate);
        Self::connect_with_clock(sim, config, transport, Box::new(clock)).await
    }

    /// Like [`Client::connect`], with a caller-supplied clock estimator
    pub async fn connect_with_clock<T: Transport>(
        sim: S,
        config: ClientConfig,
        transport: T,
        clock: Box<dyn ClockSync>,
    ) -> Result<Self, ConnectError> {
        let (incoming_tx, incoming_rx) = mpsc::channel(CHANNEL_CAPACITY);
        let (outgoing_tx, outgoing_rx) = mpsc::channel(CHANNEL_CAPACITY);

        let state = EngineState::new(sim.initial_input(), sim.initial_world());
        let shared = Arc::new(ClientShared {
            sim,
            config,
            epoch: Instant::now(),
            state: Mutex::new(state),
            clock: Mutex::new(clock),
            outgoing_tx,
        });

        let mut tasks = Vec::new();

        tasks.push(tokio::spawn(async move {
            if let Err(e) = transport.run(incoming_tx, outgoing_rx).await {
                tracing::warn!(error = %e, "transport stopped");
            }
        }));

        let (connected_tx, mut connected_rx) = watch::channel(None);
        tasks.push(tokio::spawn(
            ReceiveLoop::new(shared.clone(), incoming_rx, connected_tx).run(),
        ));
        tasks.push(tokio::spawn(HeartbeatLoop::new(shared.clone()).run()));

        if let Some(port) = telemetry::port_from_env() {
            tasks.push(tokio::spawn(telemetry::run(shared.clone(), port)));
        }

        let player_id = loop {
            if let Some(player_id) = *connected_rx.borrow_and_update() {
                break player_id;
            }
            if connected_rx.changed().await.is_err() {
                for task in &tasks {
                    task.abort();
                }
                return Err(ConnectError::TransportClosed);
            }
        };

        Ok(Self {
            shared,
            player_id,
            tasks,
        })
    }

    /// The server-assigned identity of this client
    pub fn player_id(&self) -> PlayerId {
        self.player_id
    }

    /// The predicted world at the current target tick
    ///
    /// Convenience form of [`Client::sample_with_auth`] for callers that
    /// only render the present.
    pub fn sample(&self) -> S::World {
        self.sample_with_auth().1
    }

    /// New authoritative worlds since the last sample, plus the predicted
    /// world at the current target tick
    ///
    /// The authoritative worlds arrive in strictly increasing tick order and
    /// each is returned exactly once across the lifetime of the client;
    /// callers that replay or verify history consume them, callers that
    /// don't can ignore the list.
    pub fn sample_with_auth(&self) -> (Vec<S::World>, S::World) {
        let target = self
            .shared
            .clock
            .lock()
            .estimate_target_tick(self.shared.now(), 0.0);
        engine::sample(&self.shared.sim, &self.shared.config, &self.shared.state, target)
    }

    /// Records the local player's input and schedules it for a future tick
    ///
    /// The input is applied locally right away (zero perceived latency) via
    /// the hint store, and transmitted at most once per target tick. Calls
    /// landing on an already-submitted tick still update the value carried
    /// forward by prediction.
    pub fn set_input(&self, input: S::Input) {
        let target = self.shared.clock.lock().estimate_target_tick(
            self.shared.now(),
            self.shared.config.fixed_input_latency,
        );

        let submit = {
            let mut st = self.shared.state.lock();
            st.current_input = input.clone();
            if target > st.last_submitted_tick {
                st.last_submitted_tick = target;
                let player_id = st
                    .my_player_id
                    .expect("client handle exists only after Connected");
                st.insert_hint_one(target, player_id, input.clone());
                true
            } else {
                // Ticks between the last submission and this one stay empty
                // on purpose: peers carry the previous input forward, which
                // is exactly what the predictor assumes.
                false
            }
        };

        if submit {
            self.shared.send(&Message::SubmitInput {
                tick: target,
                input,
            });
        }
    }

    /// Round-trip statistics from the clock estimator, once warmed up
    pub fn clock_stats(&self) -> Option<ClockStats> {
        self.shared.clock.lock().analytics()
    }
}

impl<S: Simulation> Drop for Client<S> {
    fn drop(&mut self) {
        for task in &self.tasks {
            task.abort();
        }
    }
}

/// Errors surfaced by [`Client::connect`]
#[derive(Debug, thiserror::Error)]
pub enum ConnectError {
    #[error("transport closed before the server assigned a player id")]
    TransportClosed,
}
