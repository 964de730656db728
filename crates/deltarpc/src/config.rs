//! Client configuration and builder.

use std::time::Duration;

use crate::Client;

/// The URL a client dials when none is given.
pub const DEFAULT_URL: &str = "ws://localhost:20808/ws";

/// Configuration for a [`Client`].
///
/// A bare URL converts into a config with every other field at its
/// default, so `Client::new("ws://host/ws")` works.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// WebSocket endpoint of the backend (`ws://` or `wss://`).
    pub url: String,

    /// How long `connect()` waits for the handshake before giving up.
    ///
    /// Default: 10 seconds.
    pub connect_timeout: Duration,

    /// Buffer size of the lifecycle broadcast channel. A receiver that
    /// falls further behind than this skips the oldest transitions.
    ///
    /// Default: 16.
    pub lifecycle_capacity: usize,

    /// Buffer size of the diagnostics broadcast channel.
    ///
    /// Default: 64.
    pub diagnostics_capacity: usize,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            url: DEFAULT_URL.to_string(),
            connect_timeout: Duration::from_secs(10),
            lifecycle_capacity: 16,
            diagnostics_capacity: 64,
        }
    }
}

impl From<&str> for ClientConfig {
    fn from(url: &str) -> Self {
        Self {
            url: url.to_string(),
            ..Self::default()
        }
    }
}

impl From<String> for ClientConfig {
    fn from(url: String) -> Self {
        Self {
            url,
            ..Self::default()
        }
    }
}

/// Builder for configuring a [`Client`].
///
/// # Example
///
/// ```rust
/// use std::time::Duration;
///
/// let client = deltarpc::Client::builder()
///     .url("ws://127.0.0.1:20808/ws")
///     .connect_timeout(Duration::from_secs(3))
///     .build();
/// assert!(!client.is_connected());
/// ```
#[derive(Debug, Clone, Default)]
pub struct ClientBuilder {
    config: ClientConfig,
}

impl ClientBuilder {
    /// Creates a new builder with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the backend URL.
    pub fn url(mut self, url: impl Into<String>) -> Self {
        self.config.url = url.into();
        self
    }

    /// Sets the connect handshake timeout.
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.config.connect_timeout = timeout;
        self
    }

    /// Sets the lifecycle channel buffer size (minimum 1).
    pub fn lifecycle_capacity(mut self, capacity: usize) -> Self {
        self.config.lifecycle_capacity = capacity;
        self
    }

    /// Sets the diagnostics channel buffer size (minimum 1).
    pub fn diagnostics_capacity(mut self, capacity: usize) -> Self {
        self.config.diagnostics_capacity = capacity;
        self
    }

    /// Returns the accumulated configuration.
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Builds the client. Does no I/O; call
    /// [`connect`](Client::connect) afterwards.
    pub fn build(self) -> Client {
        Client::new(self.config)
    }
}
