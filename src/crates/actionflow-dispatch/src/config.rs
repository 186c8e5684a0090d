//! Dispatch configuration.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Configuration for outbound action requests.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DispatchConfig {
    /// Per-request timeout.
    #[serde(default = "default_timeout")]
    pub timeout: Duration,

    /// User-Agent header sent with action requests.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

impl DispatchConfig {
    /// Create a configuration with defaults.
    pub fn new() -> Self {
        Self {
            timeout: default_timeout(),
            user_agent: default_user_agent(),
        }
    }

    /// Set the request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the User-Agent header.
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self::new()
    }
}

fn default_timeout() -> Duration {
    Duration::from_secs(30)
}

fn default_user_agent() -> String {
    concat!("actionflow/", env!("CARGO_PKG_VERSION")).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_overrides_defaults() {
        let config = DispatchConfig::new()
            .with_timeout(Duration::from_secs(5))
            .with_user_agent("widget/1.0");
        assert_eq!(config.timeout, Duration::from_secs(5));
        assert_eq!(config.user_agent, "widget/1.0");
    }
}
