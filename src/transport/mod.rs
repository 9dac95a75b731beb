//! Realtime transport layer
//!
//! The connection manager depends only on the [`Connector`] seam. The
//! WebSocket implementation owns everything below it: socket lifecycle,
//! the auth handshake, heartbeats, and reconnect policy.

mod backoff;
mod handle;
mod websocket;

pub use backoff::ExponentialBackoff;
pub use handle::{ConnectionHandle, TransportEvent, TransportState};
pub use websocket::WebSocketConnector;

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::identity::AuthPayload;

/// Transport mechanisms a connector may use
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransportKind {
    WebSocket,
}

/// Options for establishing one realtime connection
#[derive(Debug, Clone)]
pub struct ConnectOptions {
    pub transports: Vec<TransportKind>,
    pub auth: AuthPayload,
    pub with_credentials: bool,
}

impl ConnectOptions {
    pub fn new(auth: AuthPayload) -> Self {
        Self {
            transports: vec![TransportKind::WebSocket],
            auth,
            with_credentials: true,
        }
    }
}

/// Factory for realtime connections.
///
/// `connect` returns immediately with a live handle; the network
/// connection is established by a background task and observed through
/// the handle's event channel.
pub trait Connector: Send + Sync {
    fn connect(&self, endpoint: &str, options: ConnectOptions) -> Arc<ConnectionHandle>;
}
