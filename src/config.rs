//! Client configuration.
//!
//! Settings are fixed at construction time. They can be built in code via
//! [`ClientConfig::default`] and the `with_*` setters, or loaded from
//! environment variables (optionally a `.env` file via `dotenvy`) with
//! [`ClientConfig::from_env`].

use std::time::Duration;

use crate::error::ClientError;

/// Default feed endpoint.
pub const DEFAULT_HOST: &str = "wss://ws-live-data.polymarket.com";

/// Default keepalive interval in milliseconds.
pub const DEFAULT_PING_INTERVAL_MS: u64 = 5_000;

/// Default pause between reconnect attempts in milliseconds.
pub const DEFAULT_RECONNECT_DELAY_MS: u64 = 5_000;

/// Construction-time configuration for a [`crate::FeedClient`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// WebSocket URL of the feed (`ws://` or `wss://`).
    pub host: String,

    /// Interval between keepalive pings.
    pub ping_interval: Duration,

    /// Whether to reconnect after the connection is lost.
    pub auto_reconnect: bool,

    /// Fixed pause before each reconnect attempt.
    pub reconnect_delay: Duration,

    /// Verify the server certificate against the webpki root set.
    ///
    /// When `false`, any certificate is accepted.
    pub tls_verify: bool,

    /// Optional blockchain RPC endpoint handed to hooks; never used by the client.
    pub web3_provider: Option<String>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            ping_interval: Duration::from_millis(DEFAULT_PING_INTERVAL_MS),
            auto_reconnect: true,
            reconnect_delay: Duration::from_millis(DEFAULT_RECONNECT_DELAY_MS),
            tls_verify: true,
            web3_provider: None,
        }
    }
}

impl ClientConfig {
    /// Loads configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv().ok()` to optionally load a `.env` file.
    /// Missing or unparsable values fall back to the defaults:
    ///
    /// | Variable                          | Default                              |
    /// |-----------------------------------|--------------------------------------|
    /// | `POLYMARKET_WS_HOST`              | `wss://ws-live-data.polymarket.com`  |
    /// | `POLYMARKET_PING_INTERVAL_MS`     | `5000`                               |
    /// | `POLYMARKET_AUTO_RECONNECT`       | `true`                               |
    /// | `POLYMARKET_RECONNECT_DELAY_MS`   | `5000`                               |
    /// | `POLYMARKET_TLS_VERIFY`           | `true`                               |
    /// | `POLYMARKET_WEB3_PROVIDER`        | unset                                |
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Config`] if the resulting configuration fails
    /// [`ClientConfig::validate`].
    pub fn from_env() -> Result<Self, ClientError> {
        dotenvy::dotenv().ok();

        let host = std::env::var("POLYMARKET_WS_HOST").unwrap_or_else(|_| DEFAULT_HOST.to_string());
        let ping_interval_ms = parse_env("POLYMARKET_PING_INTERVAL_MS", DEFAULT_PING_INTERVAL_MS);
        let auto_reconnect = parse_env_bool("POLYMARKET_AUTO_RECONNECT", true);
        let reconnect_delay_ms =
            parse_env("POLYMARKET_RECONNECT_DELAY_MS", DEFAULT_RECONNECT_DELAY_MS);
        let tls_verify = parse_env_bool("POLYMARKET_TLS_VERIFY", true);
        let web3_provider = std::env::var("POLYMARKET_WEB3_PROVIDER")
            .ok()
            .filter(|v| !v.trim().is_empty());

        let config = Self {
            host,
            ping_interval: Duration::from_millis(ping_interval_ms),
            auto_reconnect,
            reconnect_delay: Duration::from_millis(reconnect_delay_ms),
            tls_verify,
            web3_provider,
        };
        config.validate()?;
        Ok(config)
    }

    /// Sets the feed URL.
    #[must_use]
    pub fn with_host(mut self, host: impl Into<String>) -> Self {
        self.host = host.into();
        self
    }

    /// Sets the keepalive interval from a value in milliseconds.
    #[must_use]
    pub const fn with_ping_interval_ms(mut self, millis: u64) -> Self {
        self.ping_interval = Duration::from_millis(millis);
        self
    }

    /// Enables or disables reconnecting after connection loss.
    #[must_use]
    pub const fn with_auto_reconnect(mut self, enabled: bool) -> Self {
        self.auto_reconnect = enabled;
        self
    }

    /// Sets the fixed pause before each reconnect attempt.
    #[must_use]
    pub const fn with_reconnect_delay(mut self, delay: Duration) -> Self {
        self.reconnect_delay = delay;
        self
    }

    /// Enables or disables server certificate verification.
    #[must_use]
    pub const fn with_tls_verify(mut self, verify: bool) -> Self {
        self.tls_verify = verify;
        self
    }

    /// Sets the blockchain RPC endpoint exposed to hooks.
    #[must_use]
    pub fn with_web3_provider(mut self, url: impl Into<String>) -> Self {
        self.web3_provider = Some(url.into());
        self
    }

    /// Returns `true` when the host requires a TLS handshake.
    #[must_use]
    pub fn is_secure(&self) -> bool {
        self.host.starts_with("wss://")
    }

    /// Checks the configuration for values the client cannot run with.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Config`] if the host is not a `ws://` or
    /// `wss://` URL, or if the ping interval is zero.
    pub fn validate(&self) -> Result<(), ClientError> {
        if !(self.host.starts_with("ws://") || self.host.starts_with("wss://")) {
            return Err(ClientError::Config(format!(
                "host must be a ws:// or wss:// url, got {:?}",
                self.host
            )));
        }
        if self.ping_interval.is_zero() {
            return Err(ClientError::Config(
                "ping interval must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

/// Parses an environment variable as `T`, returning `default` on missing
/// or invalid values.
fn parse_env<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

/// Parses an environment variable as a boolean. Accepts `"true"`, `"1"`,
/// `"false"`, `"0"` (case-insensitive). Returns `default` otherwise.
fn parse_env_bool(key: &str, default: bool) -> bool {
    match std::env::var(key)
        .ok()
        .map(|v| v.trim().to_ascii_lowercase())
        .as_deref()
    {
        Some("true" | "1") => true,
        Some("false" | "0") => false,
        _ => default,
    }
}
