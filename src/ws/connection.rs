//! Connection lifecycle state machine.
//!
//! [`FeedClient::run`] drives one transport at a time through
//! connect → dispatch → teardown, and reconnects after a fixed delay when
//! enabled:
//!
//! ```text
//! Disconnected ─► Connecting ─► Connected ─► Draining ─┬─► Disconnected (reconnect)
//!                     │                                └─► Closed
//!                     └── open failed ──────────────────────► (same branch)
//! ```
//!
//! Errors while opening, receiving or pinging are reported and treated as
//! a lost connection; they never escape `run`.

use std::sync::atomic::{AtomicBool, Ordering};

use futures_util::StreamExt;
use tokio_tungstenite::connect_async_tls_with_config;
use tokio_tungstenite::tungstenite::Message;
use tokio_util::sync::CancellationToken;
use tracing::Instrument;

use super::codec;
use super::dispatcher::{self, FeedHandler};
use super::keepalive;
use super::resolver;
use super::tls;
use crate::client::{ConnectionState, FeedClient, WsSource};
use crate::domain::Envelope;
use crate::error::ClientError;

/// Clears the running flag when `run` exits, however it exits.
struct RunningGuard<'a>(&'a AtomicBool);

impl Drop for RunningGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

impl<H: FeedHandler> FeedClient<H> {
    /// Connects and dispatches until the client is done.
    ///
    /// Without auto-reconnect this returns after the first connection ends
    /// (or fails to open). With auto-reconnect it only returns after
    /// [`FeedClient::stop`]. The state is [`ConnectionState::Closed`] on
    /// return.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::AlreadyRunning`] if another `run` on this
    /// client is still active. Connection failures are reported, not
    /// returned.
    pub async fn run(&self) -> Result<(), ClientError> {
        let shared = &self.handle.shared;
        if shared.running.swap(true, Ordering::AcqRel) {
            return Err(ClientError::AlreadyRunning);
        }
        let _running = RunningGuard(&shared.running);

        let span = tracing::info_span!("feed_client", client_id = %shared.id);
        self.run_loop().instrument(span).await;
        Ok(())
    }

    async fn run_loop(&self) {
        let config = self.handle.config();
        let shutdown = &self.handle.shared.shutdown;

        while !shutdown.is_cancelled() {
            if let Err(err) = self.session().await {
                self.report(&err);
            }

            if !config.auto_reconnect || shutdown.is_cancelled() {
                break;
            }

            self.handle.set_state(ConnectionState::Disconnected);
            tracing::info!(
                delay_ms = u64::try_from(config.reconnect_delay.as_millis()).unwrap_or(u64::MAX),
                "reconnecting after delay"
            );
            tokio::select! {
                () = shutdown.cancelled() => break,
                () = tokio::time::sleep(config.reconnect_delay) => {}
            }
        }

        self.handle.set_state(ConnectionState::Closed);
        tracing::info!("client closed");
    }

    /// One connection: open, connect hook, keepalive, receive, teardown.
    async fn session(&self) -> Result<(), ClientError> {
        let config = self.handle.config();
        let shutdown = &self.handle.shared.shutdown;

        self.handle.set_state(ConnectionState::Connecting);
        tracing::info!(host = %config.host, "connecting");

        let connector = tls::connector(config)?;
        let opened = tokio::select! {
            () = shutdown.cancelled() => return Ok(()),
            opened = connect_async_tls_with_config(config.host.as_str(), None, false, connector) => opened,
        };
        let (ws, _response) = opened?;
        let (sink, source) = ws.split();
        let lost = self.handle.install_transport(sink).await;

        self.handle.set_state(ConnectionState::Connected);
        tracing::info!(host = %config.host, "connected");

        if !lost.is_cancelled()
            && let Err(err) = dispatcher::dispatch_connect(&self.handler, self.handle.clone()).await
        {
            self.report(&err);
        }

        let pinger = keepalive::spawn(self.clone(), lost.clone());
        let outcome = self.receive(source, &lost).await;

        self.handle.set_state(ConnectionState::Draining);
        lost.cancel();
        if let Err(err) = pinger.await {
            tracing::debug!(error = %err, "keepalive task ended abnormally");
        }
        self.handle.release_transport().await;
        tracing::info!(host = %config.host, "connection closed");

        outcome
    }

    /// Reads frames until the transport closes, errors, or `lost` fires.
    async fn receive(&self, mut source: WsSource, lost: &CancellationToken) -> Result<(), ClientError> {
        loop {
            let next = tokio::select! {
                biased;
                () = lost.cancelled() => return Ok(()),
                next = source.next() => next,
            };

            match next {
                Some(Ok(Message::Text(text))) => self.handle_frame(text.as_str(), lost).await,
                Some(Ok(Message::Binary(bytes))) => match std::str::from_utf8(&bytes) {
                    Ok(text) => self.handle_frame(text, lost).await,
                    Err(err) => {
                        self.report(&ClientError::MalformedFrame(format!(
                            "binary frame is not utf-8: {err}"
                        )));
                    }
                },
                Some(Ok(Message::Close(frame))) => {
                    tracing::info!(?frame, "server closed connection");
                    return Ok(());
                }
                Some(Ok(_)) => {}
                Some(Err(err)) => return Err(err.into()),
                None => return Ok(()),
            }
        }
    }

    /// Decodes, resolves and dispatches one frame. Never fails the loop.
    async fn handle_frame(&self, text: &str, lost: &CancellationToken) {
        if text.trim().is_empty() {
            return;
        }

        let frame = match codec::decode_frame(text) {
            Ok(Some(frame)) => frame,
            Ok(None) => {
                tracing::debug!(frame = text, "ignoring control frame");
                return;
            }
            Err(err) => {
                self.report(&err);
                return;
            }
        };

        let resolved = resolver::resolve(&frame.topic, &frame.msg_type, frame.payload);
        if let Some(mismatch) = &resolved.mismatch {
            self.report(mismatch);
        }

        let envelope = Envelope {
            topic: frame.topic,
            msg_type: frame.msg_type,
            timestamp: frame.timestamp,
            payload: resolved.payload,
        };

        if lost.is_cancelled() {
            return;
        }
        if let Err(err) =
            dispatcher::dispatch_message(&self.handler, self.handle.clone(), envelope).await
        {
            self.report(&err);
        }
    }
}
