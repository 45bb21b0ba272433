//! Client handles shared between the connection manager and hooks.
//!
//! [`FeedClient`] is the owning entry point: it pairs the caller's
//! [`FeedHandler`] with a [`ClientHandle`] and drives the connection via
//! [`FeedClient::run`]. [`ClientHandle`] is the cheap, cloneable view that
//! hooks receive; it exposes subscription, state and shutdown operations.
//!
//! All mutable connection state (the active transport and the shutdown
//! signal) lives inside one client instance, so several independent
//! clients can run in the same process.

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::AtomicBool;
use std::time::Duration;

use futures_util::SinkExt;
use futures_util::stream::{SplitSink, SplitStream};
use tokio::net::TcpStream;
use tokio::sync::{Mutex, watch};
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::config::ClientConfig;
use crate::domain::{Action, SubscriptionIntent};
use crate::error::{ClientError, ErrorKind};
use crate::ws::codec;
use crate::ws::dispatcher::FeedHandler;

pub(crate) type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;
pub(crate) type WsSink = SplitSink<WsStream, Message>;
pub(crate) type WsSource = SplitStream<WsStream>;

/// Upper bound on waiting for a close handshake to flush.
const CLOSE_TIMEOUT: Duration = Duration::from_secs(2);

/// Lifecycle state of a client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConnectionState {
    /// No transport; a connection attempt may follow.
    Disconnected,
    /// Opening the transport.
    Connecting,
    /// Transport open; frames are being received.
    Connected,
    /// Transport lost or closing; keepalive is being cancelled.
    Draining,
    /// Client finished; no further connection attempts.
    Closed,
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Disconnected => "disconnected",
            Self::Connecting => "connecting",
            Self::Connected => "connected",
            Self::Draining => "draining",
            Self::Closed => "closed",
        };
        f.write_str(name)
    }
}

/// Opaque blockchain RPC endpoint stored for hooks.
///
/// The client never calls it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Web3Provider {
    url: String,
}

impl Web3Provider {
    /// Wraps an RPC endpoint URL.
    #[must_use]
    pub fn new(url: impl Into<String>) -> Self {
        Self { url: url.into() }
    }

    /// Returns the endpoint URL.
    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }
}

/// The write half of the current connection and its teardown signal.
pub(crate) struct ActiveTransport {
    pub(crate) sink: WsSink,
    pub(crate) lost: CancellationToken,
}

pub(crate) struct Shared {
    pub(crate) id: Uuid,
    pub(crate) config: ClientConfig,
    pub(crate) state: watch::Sender<ConnectionState>,
    pub(crate) transport: Mutex<Option<ActiveTransport>>,
    pub(crate) shutdown: CancellationToken,
    pub(crate) running: AtomicBool,
    pub(crate) web3: Option<Web3Provider>,
    on_error: ErrorHook,
}

/// Forwards reported errors to the caller's [`FeedHandler::on_error`].
type ErrorHook = Box<dyn Fn(&ClientHandle, &ClientError) + Send + Sync>;

/// Cloneable handle to a running client.
///
/// Passed to every hook. All clones refer to the same connection.
#[derive(Clone)]
pub struct ClientHandle {
    pub(crate) shared: Arc<Shared>,
}

impl fmt::Debug for ClientHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientHandle")
            .field("id", &self.shared.id)
            .field("host", &self.shared.config.host)
            .field("state", &self.state())
            .finish()
    }
}

impl ClientHandle {
    fn new(config: ClientConfig, on_error: ErrorHook) -> Self {
        let (state, _) = watch::channel(ConnectionState::Disconnected);
        let web3 = config.web3_provider.clone().map(Web3Provider::new);
        Self {
            shared: Arc::new(Shared {
                id: Uuid::new_v4(),
                config,
                state,
                transport: Mutex::new(None),
                shutdown: CancellationToken::new(),
                running: AtomicBool::new(false),
                web3,
                on_error,
            }),
        }
    }

    /// Unique identifier of this client, used in log spans.
    #[must_use]
    pub fn id(&self) -> Uuid {
        self.shared.id
    }

    /// Configuration the client was built with.
    #[must_use]
    pub fn config(&self) -> &ClientConfig {
        &self.shared.config
    }

    /// Current lifecycle state.
    #[must_use]
    pub fn state(&self) -> ConnectionState {
        *self.shared.state.borrow()
    }

    /// Returns a receiver that observes every state transition.
    #[must_use]
    pub fn watch_state(&self) -> watch::Receiver<ConnectionState> {
        self.shared.state.subscribe()
    }

    /// Returns `true` while a transport is open.
    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.state() == ConnectionState::Connected
    }

    /// Returns `true` once [`ClientHandle::stop`] has been called.
    #[must_use]
    pub fn is_stopped(&self) -> bool {
        self.shared.shutdown.is_cancelled()
    }

    /// Blockchain RPC endpoint from the configuration, if any.
    #[must_use]
    pub fn web3_provider(&self) -> Option<&Web3Provider> {
        self.shared.web3.as_ref()
    }

    /// Sends a `subscribe` frame for `intents` on the active transport.
    ///
    /// Nothing is remembered: after a reconnect the connect hook must
    /// subscribe again.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::NotConnected`] without any I/O if no
    /// transport is open, and [`ClientError::Encode`] if the frame cannot
    /// be built. A send failure is not returned: it is reported through
    /// [`FeedHandler::on_error`] and closes the transport, which routes the
    /// connection manager into its reconnect branch.
    pub async fn subscribe(&self, intents: &[SubscriptionIntent]) -> Result<(), ClientError> {
        self.send_subscription(Action::Subscribe, intents).await
    }

    /// Sends an `unsubscribe` frame for `intents` on the active transport.
    ///
    /// # Errors
    ///
    /// Same as [`ClientHandle::subscribe`].
    pub async fn unsubscribe(&self, intents: &[SubscriptionIntent]) -> Result<(), ClientError> {
        self.send_subscription(Action::Unsubscribe, intents).await
    }

    /// Stops the client: no further reconnects, active transport closed.
    ///
    /// Calling it again is a no-op.
    pub async fn stop(&self) {
        if self.shared.shutdown.is_cancelled() {
            return;
        }
        tracing::info!(client_id = %self.shared.id, "stopping client");
        self.shared.shutdown.cancel();
        self.release_transport().await;
    }

    async fn send_subscription(
        &self,
        action: Action,
        intents: &[SubscriptionIntent],
    ) -> Result<(), ClientError> {
        let mut guard = self.shared.transport.lock().await;
        let Some(active) = guard.as_mut() else {
            return Err(ClientError::NotConnected);
        };
        let text = codec::encode_subscription(action, intents)?;

        let Err(err) = active.sink.send(Message::text(text)).await else {
            tracing::info!(%action, count = intents.len(), "subscription frame sent");
            return Ok(());
        };

        active.lost.cancel();
        let failed = guard.take();
        drop(guard);

        tracing::warn!(%action, "subscription send failed, closing transport");
        self.report(&ClientError::from(err));
        if let Some(failed) = failed {
            close_sink(failed).await;
        }
        Ok(())
    }

    /// Logs a non-fatal error and forwards it to the error hook.
    pub(crate) fn report(&self, error: &ClientError) {
        match error.kind() {
            ErrorKind::SchemaMismatch => {
                tracing::warn!(kind = %error.kind(), error = %error, "payload fell back to raw map");
            }
            kind => tracing::error!(%kind, error = %error, "client error"),
        }
        (self.shared.on_error)(self, error);
    }

    /// Sends one protocol-level ping.
    pub(crate) async fn send_ping(&self) -> Result<(), ClientError> {
        let mut guard = self.shared.transport.lock().await;
        let Some(active) = guard.as_mut() else {
            return Err(ClientError::NotConnected);
        };
        active.sink.send(Message::Ping(Default::default())).await?;
        Ok(())
    }

    pub(crate) async fn install_transport(&self, sink: WsSink) -> CancellationToken {
        let lost = self.shared.shutdown.child_token();
        let previous = self.shared.transport.lock().await.replace(ActiveTransport {
            sink,
            lost: lost.clone(),
        });
        if let Some(previous) = previous {
            close_sink(previous).await;
        }
        lost
    }

    /// Takes the active transport, if any, and closes it.
    pub(crate) async fn release_transport(&self) {
        let active = self.shared.transport.lock().await.take();
        if let Some(active) = active {
            close_sink(active).await;
        }
    }

    pub(crate) fn set_state(&self, next: ConnectionState) {
        let previous = self.shared.state.send_replace(next);
        if previous != next {
            tracing::debug!(from = %previous, to = %next, "state transition");
        }
    }
}

async fn close_sink(mut active: ActiveTransport) {
    active.lost.cancel();
    match tokio::time::timeout(CLOSE_TIMEOUT, active.sink.close()).await {
        Ok(Ok(())) => {}
        Ok(Err(err)) => tracing::debug!(error = %err, "transport close failed"),
        Err(_) => tracing::debug!("transport close timed out"),
    }
}

/// Long-lived client for the real-time feed.
///
/// Construct with [`FeedClient::new`], then drive with
/// [`FeedClient::run`]. Cloning is cheap and clones share the connection.
pub struct FeedClient<H> {
    pub(crate) handle: ClientHandle,
    pub(crate) handler: Arc<H>,
}

impl<H> Clone for FeedClient<H> {
    fn clone(&self) -> Self {
        Self {
            handle: self.handle.clone(),
            handler: Arc::clone(&self.handler),
        }
    }
}

impl<H> fmt::Debug for FeedClient<H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FeedClient")
            .field("handle", &self.handle)
            .finish_non_exhaustive()
    }
}

impl<H: FeedHandler> FeedClient<H> {
    /// Creates a client from a configuration and a set of hooks.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Config`] if the configuration is invalid.
    pub fn new(config: ClientConfig, handler: H) -> Result<Self, ClientError> {
        config.validate()?;
        let handler = Arc::new(handler);
        let hooks = Arc::clone(&handler);
        let on_error: ErrorHook = Box::new(move |client, error| hooks.on_error(client, error));
        Ok(Self {
            handle: ClientHandle::new(config, on_error),
            handler,
        })
    }

    /// Handle shared with hooks.
    #[must_use]
    pub const fn handle(&self) -> &ClientHandle {
        &self.handle
    }

    /// The hooks this client dispatches to.
    #[must_use]
    pub fn handler(&self) -> &H {
        &self.handler
    }

    /// Current lifecycle state.
    #[must_use]
    pub fn state(&self) -> ConnectionState {
        self.handle.state()
    }

    /// Stops the client. See [`ClientHandle::stop`].
    pub async fn stop(&self) {
        self.handle.stop().await;
    }

    pub(crate) fn report(&self, error: &ClientError) {
        self.handle.report(error);
    }
}
