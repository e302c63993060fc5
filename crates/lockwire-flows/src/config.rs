use std::time::Duration;

use serde::Deserialize;

/// Timeouts and sizes used by workflows.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct FlowConfig {
    /// Bound for a regular terminal exchange, in seconds.
    pub session_timeout_secs: u64,
    /// Bound for one firmware exchange (begin, chunk, commit), in seconds.
    pub firmware_timeout_secs: u64,
    /// Firmware bytes carried per chunk exchange.
    pub firmware_chunk: usize,
}

impl FlowConfig {
    #[inline]
    pub fn session_timeout(&self) -> Duration {
        Duration::from_secs(self.session_timeout_secs)
    }

    #[inline]
    pub fn firmware_timeout(&self) -> Duration {
        Duration::from_secs(self.firmware_timeout_secs)
    }
}

impl Default for FlowConfig {
    fn default() -> Self {
        Self {
            session_timeout_secs: 15,
            firmware_timeout_secs: 30,
            firmware_chunk: 512,
        }
    }
}
