use std::time::Duration;

use serde::Deserialize;

/// Tunables for terminal sessions.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Timeout for callers that do not pass their own, in seconds.
    pub default_timeout_secs: u64,
    /// Upper bound for connecting and disconnecting the link, in seconds.
    pub connect_timeout_secs: u64,
}

impl SessionConfig {
    #[inline]
    pub fn default_timeout(&self) -> Duration {
        Duration::from_secs(self.default_timeout_secs)
    }

    #[inline]
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            default_timeout_secs: 15,
            connect_timeout_secs: 10,
        }
    }
}
