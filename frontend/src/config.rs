//! Client configuration loaded via OrthoConfig.

use std::time::Duration;

use ortho_config::OrthoConfig;
use serde::Deserialize;

/// Tunables for the registration and rating workflows.
#[derive(Debug, Clone, Deserialize, OrthoConfig)]
#[ortho_config(prefix = "FOODOPIA")]
pub struct ClientSettings {
    /// Milliseconds of input silence before a username availability check.
    #[ortho_config(default = 500)]
    pub availability_quiet_period_ms: u64,
}

impl ClientSettings {
    /// Return the configured quiet period.
    pub fn availability_quiet_period(&self) -> Duration {
        Duration::from_millis(self.availability_quiet_period_ms)
    }
}
