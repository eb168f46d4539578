//! Transport configuration

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Timeout applied when a builder has none of its own.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Connection pool and TLS settings for [`UreqTransport`](crate::UreqTransport).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransportConfig {
    /// Idle connections kept across all hosts
    #[serde(default = "default_max_idle_connections")]
    pub max_idle_connections: usize,

    /// Idle connections kept per host
    #[serde(default = "default_max_idle_connections_per_host")]
    pub max_idle_connections_per_host: usize,

    /// How long an idle pooled connection is kept
    #[serde(default = "default_idle_timeout")]
    pub idle_timeout: Duration,

    /// Connect timeout, bounded by the request timeout either way
    #[serde(default)]
    pub connect_timeout: Option<Duration>,

    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Skip certificate verification. Off unless set explicitly.
    #[serde(default)]
    pub danger_accept_invalid_certs: bool,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            max_idle_connections: default_max_idle_connections(),
            max_idle_connections_per_host: default_max_idle_connections_per_host(),
            idle_timeout: default_idle_timeout(),
            connect_timeout: None,
            user_agent: default_user_agent(),
            danger_accept_invalid_certs: false,
        }
    }
}

impl TransportConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_idle_connections(mut self, max: usize) -> Self {
        self.max_idle_connections = max;
        self
    }

    pub fn with_max_idle_connections_per_host(mut self, max: usize) -> Self {
        self.max_idle_connections_per_host = max;
        self
    }

    pub fn with_idle_timeout(mut self, timeout: Duration) -> Self {
        self.idle_timeout = timeout;
        self
    }

    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = Some(timeout);
        self
    }

    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    pub fn with_danger_accept_invalid_certs(mut self, accept: bool) -> Self {
        self.danger_accept_invalid_certs = accept;
        self
    }
}

fn default_max_idle_connections() -> usize {
    100
}

fn default_max_idle_connections_per_host() -> usize {
    100
}

fn default_idle_timeout() -> Duration {
    Duration::from_secs(90)
}

fn default_user_agent() -> String {
    format!("request-core/{}", env!("CARGO_PKG_VERSION"))
}
