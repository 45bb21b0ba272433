//! WebSocket layer: framing, payload resolution, hooks and the
//! connection lifecycle.
//!
//! The connection manager in [`connection`] opens the transport, runs the
//! [`keepalive`] task beside the receive loop, and hands each frame to
//! [`codec`] → [`resolver`] → [`dispatcher`].

pub mod codec;
pub mod connection;
pub mod dispatcher;
pub mod keepalive;
pub mod resolver;
pub(crate) mod tls;
