//! Optional telemetry endpoint
//!
//! When `VELES_TELEMETRY_PORT` is set, a background task serves a plaintext
//! snapshot of clock and store health on localhost. Point `nc` at it while
//! chasing desyncs; leave the variable unset and nothing is spawned.

use crate::ClientShared;
use std::sync::Arc;
use tokio::io::AsyncWriteExt;
use tokio::net::TcpListener;
use veles_simulation::Simulation;

/// Environment variable naming the local TCP port; absence disables telemetry
pub const TELEMETRY_PORT_ENV: &str = "VELES_TELEMETRY_PORT";

pub(crate) fn port_from_env() -> Option<u16> {
    let raw = std::env::var(TELEMETRY_PORT_ENV).ok()?;
    match raw.parse() {
        Ok(port) => Some(port),
        Err(_) => {
            tracing::warn!(value = %raw, "ignoring unparseable {}", TELEMETRY_PORT_ENV);
            None
        }
    }
}

pub(crate) async fn run<S: Simulation>(shared: Arc<ClientShared<S>>, port: u16) {
    let listener = match TcpListener::bind(("127.0.0.1", port)).await {
        Ok(listener) => listener,
        Err(e) => {
            tracing::warn!(port, error = %e, "telemetry endpoint disabled: bind failed");
            return;
        }
    };
    tracing::info!(port, "telemetry endpoint listening");

    loop {
        let (mut stream, _) = match listener.accept().await {
            Ok(accepted) => accepted,
            Err(e) => {
                tracing::debug!(error = %e, "telemetry accept failed");
                continue;
            }
        };

        let body = render(&shared);
        if let Err(e) = stream.write_all(body.as_bytes()).await {
            tracing::debug!(error = %e, "telemetry write failed");
        }
    }
}

fn render<S: Simulation>(shared: &ClientShared<S>) -> String {
    let stats = shared.clock.lock().analytics();
    let (max_auth_tick, max_world_tick, last_submitted) = {
        let st = shared.state.lock();
        (st.max_auth_tick, st.max_auth_world_tick(), st.last_submitted_tick)
    };

    let mut body = String::new();
    match stats {
        Some(stats) => {
            body.push_str(&format!("ping_seconds {:.6}\n", stats.ping_seconds));
            body.push_str(&format!("clock_error_seconds {:.6}\n", stats.clock_error_seconds));
        }
        None => body.push_str("clock_sync warming_up\n"),
    }
    body.push_str(&format!("max_auth_tick {}\n", max_auth_tick));
    body.push_str(&format!("max_auth_world_tick {}\n", max_world_tick));
    body.push_str(&format!("last_submitted_tick {}\n", last_submitted));
    body
}
