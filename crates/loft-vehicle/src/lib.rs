pub mod doctor;
pub mod server;
pub mod state;

use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct VehicleConfig {
    /// Listen address for the command server.
    pub bind: String,
}

impl Default for VehicleConfig {
    fn default() -> Self {
        Self { bind: "127.0.0.1:12002".into() }
    }
}
