//! Client error types and their classification.
//!
//! [`ClientError`] is the central error type for the client. Each variant
//! maps onto an [`ErrorKind`] that decides how the connection manager
//! reacts: transport failures end the current connection, decode and
//! schema problems only affect a single frame, and usage errors are
//! returned to the caller.

use std::fmt;

use tokio_tungstenite::tungstenite;

/// Coarse category of a [`ClientError`].
///
/// | Kind             | Reaction                                         |
/// |------------------|--------------------------------------------------|
/// | `Transport`      | connection torn down, optional reconnect         |
/// | `Decode`         | frame discarded, receive loop continues          |
/// | `SchemaMismatch` | payload delivered as raw map, warning reported   |
/// | `Usage`          | returned synchronously to the caller             |
/// | `Handler`        | hook failure reported, receive loop continues    |
/// | `Config`         | client construction rejected                     |
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Opening, sending on, or receiving from the transport failed.
    Transport,
    /// An inbound frame could not be decoded.
    Decode,
    /// A recognized payload did not match its structured shape.
    SchemaMismatch,
    /// The API was used in a state that does not allow the operation.
    Usage,
    /// A caller-supplied hook panicked or was cancelled.
    Handler,
    /// The client configuration is invalid.
    Config,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Transport => "transport",
            Self::Decode => "decode",
            Self::SchemaMismatch => "schema_mismatch",
            Self::Usage => "usage",
            Self::Handler => "handler",
            Self::Config => "config",
        };
        f.write_str(name)
    }
}

/// Error enum for every failure the client can observe or report.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// `subscribe`/`unsubscribe`/ping issued without an open transport.
    #[error("not connected to websocket server")]
    NotConnected,

    /// `run` was called while another `run` on the same client is active.
    #[error("client is already running")]
    AlreadyRunning,

    /// WebSocket open, send or receive failure.
    #[error("transport error: {0}")]
    Transport(Box<tungstenite::Error>),

    /// The TLS client configuration could not be built.
    #[error("tls setup failed: {0}")]
    Tls(#[from] rustls::Error),

    /// The outer frame is not valid JSON.
    #[error("failed to parse frame: {0}")]
    Decode(#[from] serde_json::Error),

    /// The outer frame is JSON but cannot carry a data payload.
    #[error("malformed frame: {0}")]
    MalformedFrame(String),

    /// An outbound frame could not be serialized.
    #[error("failed to encode frame: {0}")]
    Encode(String),

    /// A recognized `(topic, type)` payload failed its structured decode.
    #[error("payload for {topic}/{msg_type} does not match {shape}: {source}")]
    SchemaMismatch {
        /// Frame topic.
        topic: String,
        /// Frame type.
        msg_type: String,
        /// Name of the structured shape that was attempted.
        shape: &'static str,
        /// Underlying decode failure.
        source: serde_json::Error,
    },

    /// A hook task panicked or was cancelled before completing.
    #[error("handler failed: {0}")]
    Handler(String),

    /// Configuration rejected by validation.
    #[error("invalid configuration: {0}")]
    Config(String),
}

impl ClientError {
    /// Returns the [`ErrorKind`] for this variant.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::NotConnected | Self::AlreadyRunning | Self::Encode(_) => ErrorKind::Usage,
            Self::Transport(_) | Self::Tls(_) => ErrorKind::Transport,
            Self::Decode(_) | Self::MalformedFrame(_) => ErrorKind::Decode,
            Self::SchemaMismatch { .. } => ErrorKind::SchemaMismatch,
            Self::Handler(_) => ErrorKind::Handler,
            Self::Config(_) => ErrorKind::Config,
        }
    }

    /// Returns `true` if this error ends the connection it occurred on.
    #[must_use]
    pub const fn is_connection_fatal(&self) -> bool {
        matches!(self.kind(), ErrorKind::Transport)
    }
}

impl From<tungstenite::Error> for ClientError {
    fn from(err: tungstenite::Error) -> Self {
        Self::Transport(Box::new(err))
    }
}
