//! Clock synchronization consumer
//!
//! The engine never reads the server's clock directly; it records heartbeat
//! round trips and asks a `ClockSync` implementation which tick it should be
//! targeting. The estimator math lives behind the trait so it can evolve (or
//! be replaced in tests) without touching the engine.
//!
//! All timestamps are seconds on the client's monotonic timebase, except
//! `server_recv`, which is the server's own monotonic reading echoed back in
//! the heartbeat response. Tick 0 corresponds to second 0 of the server's
//! timebase.

use std::collections::VecDeque;
use veles_protocol::Tick;

/// Aggregate round-trip statistics, available once enough samples arrived
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClockStats {
    /// Mean round-trip time in seconds
    pub ping_seconds: f64,
    /// Estimated uncertainty of the clock offset, in seconds
    pub clock_error_seconds: f64,
}

/// Consumer of heartbeat round-trip samples and producer of target ticks
pub trait ClockSync: Send + 'static {
    /// Records one heartbeat round trip
    ///
    /// `client_send` and `client_recv` are client-timebase readings taken
    /// when the heartbeat left and its response arrived; `server_recv` is
    /// the server-timebase reading echoed in the response.
    fn record(&mut self, client_send: f64, server_recv: f64, client_recv: f64);

    /// The tick the client should currently be targeting
    ///
    /// `now` is the caller's current monotonic reading. `extra_latency`
    /// shifts the target into the future; input submission passes the
    /// configured fixed input latency here so locally generated inputs reach
    /// the server before other clients simulate their tick.
    fn estimate_target_tick(&self, now: f64, extra_latency: f64) -> Tick;

    /// Round-trip statistics, `None` until enough samples were recorded
    fn analytics(&self) -> Option<ClockStats>;
}

const MAX_SAMPLES: usize = 16;
const MIN_SAMPLES: usize = 4;

/// Extra scheduling margin, in ticks, absorbing network jitter
const JITTER_BUFFER_TICKS: f64 = 2.0;

#[derive(Debug, Clone, Copy)]
struct RoundTripSample {
    ping: f64,
    offset: f64,
}

/// Default round-trip estimator
///
/// Keeps a sliding window of samples. Each sample yields a ping
/// (`client_recv - client_send`) and a clock offset estimate
/// (`server_recv` minus the round-trip midpoint, assuming symmetric paths).
/// The target tick is the averaged server time plus one-way latency, a
/// jitter buffer and any caller-requested extra latency, converted at the
/// tick rate.
pub struct RoundTripClock {
    tick_rate: f64,
    samples: VecDeque<RoundTripSample>,
}

impl RoundTripClock {
    pub fn new(tick_rate: u32) -> Self {
        Self {
            tick_rate: f64::from(tick_rate),
            samples: VecDeque::with_capacity(MAX_SAMPLES),
        }
    }

    fn mean_ping(&self) -> f64 {
        if self.samples.is_empty() {
            return 0.0;
        }
        self.samples.iter().map(|s| s.ping).sum::<f64>() / self.samples.len() as f64
    }

    fn mean_offset(&self) -> f64 {
        if self.samples.is_empty() {
            return 0.0;
        }
        self.samples.iter().map(|s| s.offset).sum::<f64>() / self.samples.len() as f64
    }
}

impl ClockSync for RoundTripClock {
    fn record(&mut self, client_send: f64, server_recv: f64, client_recv: f64) {
        let ping = client_recv - client_send;
        if ping < 0.0 {
            tracing::warn!(client_send, client_recv, "dropping clock sample with negative ping");
            return;
        }

        let offset = server_recv - (client_send + client_recv) / 2.0;
        if self.samples.len() == MAX_SAMPLES {
            self.samples.pop_front();
        }
        self.samples.push_back(RoundTripSample { ping, offset });

        tracing::trace!(ping, offset, samples = self.samples.len(), "recorded clock sample");
    }

    fn estimate_target_tick(&self, now: f64, extra_latency: f64) -> Tick {
        let server_now = now + self.mean_offset();
        let lead_seconds = self.mean_ping() / 2.0 + extra_latency;
        let ticks = server_now * self.tick_rate + lead_seconds * self.tick_rate + JITTER_BUFFER_TICKS;
        Tick::new(ticks.floor() as i64)
    }

    fn analytics(&self) -> Option<ClockStats> {
        if self.samples.len() < MIN_SAMPLES {
            return None;
        }

        let mean = self.mean_offset();
        let spread = self
            .samples
            .iter()
            .map(|s| (s.offset - mean).abs())
            .fold(0.0f64, f64::max);

        Some(ClockStats {
            ping_seconds: self.mean_ping(),
            clock_error_seconds: spread,
        })
    }
}
