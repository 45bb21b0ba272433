//! # polymarket-ws-client
//!
//! Long-lived client for the Polymarket real-time data feed.
//!
//! The client keeps one WebSocket connection open, sends subscribe and
//! unsubscribe intents, decodes inbound frames into typed [`Envelope`]s
//! and hands them to caller-supplied hooks. Transient network failures
//! are absorbed: the connection is rebuilt after a fixed delay and the
//! connect hook fires again so it can re-subscribe.
//!
//! ## Architecture
//!
//! ```text
//! FeedClient::run (ws/connection)
//!     │
//!     ├── TLS connector (ws/tls)
//!     ├── KeepAlive task (ws/keepalive)
//!     │
//!     └── receive loop
//!           ├── FrameCodec (ws/codec)
//!           ├── PayloadResolver (ws/resolver)
//!           └── Dispatcher → FeedHandler hooks (ws/dispatcher)
//! ```
//!
//! ## Example
//!
//! ```no_run
//! use polymarket_ws_client::{ClientConfig, ClientHandle, Envelope, FeedClient, FeedHandler};
//! use polymarket_ws_client::SubscriptionIntent;
//!
//! struct Printer;
//!
//! impl FeedHandler for Printer {
//!     async fn on_connect(&self, client: ClientHandle) {
//!         let _ = client.subscribe(&[SubscriptionIntent::new("activity", "trades")]).await;
//!     }
//!
//!     async fn on_message(&self, _client: ClientHandle, envelope: Envelope) {
//!         println!("{} {}", envelope.topic, envelope.msg_type);
//!     }
//! }
//!
//! # async fn demo() -> Result<(), polymarket_ws_client::ClientError> {
//! let client = FeedClient::new(ClientConfig::default(), Printer)?;
//! client.run().await?;
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod config;
pub mod domain;
pub mod error;
pub mod ws;

pub use client::{ClientHandle, ConnectionState, FeedClient, Web3Provider};
pub use config::ClientConfig;
pub use domain::{
    Action, ClobAuth, Comment, Credentials, Envelope, GammaAuth, ParentEntityType, Payload,
    Reaction, Side, SubscriptionIntent, Trade,
};
pub use error::{ClientError, ErrorKind};
pub use ws::dispatcher::FeedHandler;
