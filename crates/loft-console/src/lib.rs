pub mod console;
pub mod doctor;
pub mod scheduler;
pub mod store;

use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ConsoleConfig {
    /// Controller endpoint, host:port.
    pub endpoint: String,

    /// Tick rate of the poll/render loop.
    pub frame_rate_hz: u32,

    /// Cap on concurrently in-flight telemetry requests; polls beyond it
    /// are skipped for that tick.
    pub max_inflight: usize,

    /// Per-request deadline in milliseconds.
    pub request_timeout_ms: u64,

    pub fiducial_enabled: bool,
    pub proximity_enabled: bool,
}

impl Default for ConsoleConfig {
    fn default() -> Self {
        Self {
            endpoint: "127.0.0.1:12002".into(),
            frame_rate_hz: 30,
            max_inflight: 8,
            request_timeout_ms: 1000,
            fiducial_enabled: true,
            proximity_enabled: true,
        }
    }
}
