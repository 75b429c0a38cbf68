use instant::Duration;

/// How long a client waits for its connection to the host to open.
pub const DEFAULT_JOIN_TIMEOUT: Duration = Duration::from_millis(10_000);

/// Configuration for a session.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Join timeout; the connection attempt is abandoned when it elapses.
    pub join_timeout: Duration,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            join_timeout: DEFAULT_JOIN_TIMEOUT,
        }
    }
}

impl SessionConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_join_timeout(mut self, timeout: Duration) -> Self {
        self.join_timeout = timeout;
        self
    }
}
