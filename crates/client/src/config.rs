//! Client configuration

/// Tuning knobs for the prediction engine
///
/// `tick_rate` must match the server's, since it converts clock estimates
/// into tick numbers and sets the input packet rate. The remaining knobs
/// trade responsiveness against misprediction cost.
#[derive(Debug, Clone, Copy)]
pub struct ClientConfig {
    /// Simulation ticks per second; must match the server
    pub tick_rate: u32,

    /// Seconds of deliberate scheduling delay on locally submitted inputs
    ///
    /// Scheduling our own input slightly in the future gives the network
    /// time to deliver it before other clients simulate that tick, reducing
    /// their mispredictions. Typical values sit between 0.0 and 0.1.
    pub fixed_input_latency: f64,

    /// Upper bound on speculative ticks simulated beyond authoritative state
    pub max_prediction_ticks: i64,

    /// Behind-ness, in ticks, at which prediction shuts off entirely
    ///
    /// When the target tick is further than this past the authoritative
    /// prefix, sampling stops predicting and spends its budget catching up.
    pub resync_threshold_ticks: i64,
}

impl ClientConfig {
    /// Configuration with the standard derived defaults for a tick rate
    pub fn new(tick_rate: u32) -> Self {
        Self {
            tick_rate,
            fixed_input_latency: 0.0,
            max_prediction_ticks: i64::from(tick_rate / 2),
            resync_threshold_ticks: i64::from(tick_rate * 3),
        }
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self::new(60)
    }
}
