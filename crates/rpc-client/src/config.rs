//! Client configuration.

use rpc_types::DEFAULT_TIMEOUT_MS;
use std::time::Duration;

/// Configuration for an [`RpcClient`](crate::client::RpcClient).
#[derive(Debug, Clone)]
pub struct RpcConfig {
    /// Dedicated queue on which only responses to this client's own
    /// requests arrive. Declared non-exclusive so a reconnect can keep
    /// consuming the same queue name.
    pub reply_queue: String,
    /// Deadline applied when a call does not specify its own.
    pub default_timeout: Duration,
}

impl RpcConfig {
    /// Configuration with the given reply queue and default deadline.
    pub fn new(reply_queue: impl Into<String>) -> Self {
        Self {
            reply_queue: reply_queue.into(),
            ..Self::default()
        }
    }

    /// Override the default call deadline.
    #[must_use]
    pub fn with_default_timeout(mut self, timeout: Duration) -> Self {
        self.default_timeout = timeout;
        self
    }
}

impl Default for RpcConfig {
    fn default() -> Self {
        Self {
            reply_queue: "rpc.replies".to_string(),
            default_timeout: Duration::from_millis(DEFAULT_TIMEOUT_MS),
        }
    }
}
