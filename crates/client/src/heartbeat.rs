//! Heartbeat / connect loop
//!
//! Announces the client's presence forever: `Connect` until the server
//! assigns an id, `Heartbeat` afterwards. Heartbeats double as clock sample
//! requests, so the loop runs hot until the estimator has enough samples and
//! then relaxes to a maintenance cadence.

use crate::ClientShared;
use std::sync::Arc;
use std::time::Duration;
use veles_protocol::Message;
use veles_simulation::Simulation;

/// Cadence while the clock estimator is still warming up
const SYNCING_INTERVAL: Duration = Duration::from_millis(50);

/// Cadence once analytics are available
const STEADY_INTERVAL: Duration = Duration::from_millis(500);

pub(crate) struct HeartbeatLoop<S: Simulation> {
    shared: Arc<ClientShared<S>>,
}

impl<S: Simulation> HeartbeatLoop<S> {
    pub fn new(shared: Arc<ClientShared<S>>) -> Self {
        Self { shared }
    }

    pub async fn run(self) {
        loop {
            let interval = if self.shared.clock.lock().analytics().is_some() {
                STEADY_INTERVAL
            } else {
                SYNCING_INTERVAL
            };
            tokio::time::sleep(interval).await;

            let sent_at = self.shared.now();
            let message = if self.shared.state.lock().my_player_id.is_none() {
                Message::Connect { sent_at }
            } else {
                Message::Heartbeat { sent_at }
            };
            self.shared.send(&message);
        }
    }
}
