//! Identity-scoped connection lifecycle
//!
//! Provides exactly one live realtime connection handle per process,
//! keyed by the caller's identity. A request under a new identity tears
//! down the old connection before creating its replacement; a request
//! under the same identity reuses the live handle without reconnecting.

use std::sync::Arc;

use lazy_static::lazy_static;
use parking_lot::Mutex;

use crate::identity::{AuthMode, AuthPayload, ConnectionParams, IdentityKey};
use crate::transport::{ConnectOptions, ConnectionHandle, Connector, WebSocketConnector};

struct LiveConnection {
    key: IdentityKey,
    handle: Arc<ConnectionHandle>,
}

/// Owns the process-wide `(identity key, handle)` slot.
///
/// `acquire` and `release` are synchronous; the transport connect itself
/// happens in the background after `acquire` returns and is observed
/// through the handle's event channel.
pub struct ConnectionIdentityManager {
    connector: Arc<dyn Connector>,
    live: Mutex<Option<LiveConnection>>,
}

impl ConnectionIdentityManager {
    pub fn new(connector: Arc<dyn Connector>) -> Self {
        Self {
            connector,
            live: Mutex::new(None),
        }
    }

    /// Return the live handle for the caller's identity, creating or
    /// replacing the underlying connection as needed.
    ///
    /// Returns `None` when the endpoint is missing or the identity field
    /// required by `mode` is not available yet. Both are expected
    /// conditions: the caller renders its "not connected" state and
    /// retries once the identity is ready.
    pub fn acquire(
        &self,
        params: &ConnectionParams,
        mode: AuthMode,
        endpoint: &str,
    ) -> Option<Arc<ConnectionHandle>> {
        if endpoint.is_empty() {
            tracing::error!("Realtime endpoint is not configured");
            return None;
        }

        let auth = match AuthPayload::for_mode(params, mode) {
            Some(auth) => auth,
            None => {
                tracing::debug!(auth_mode = ?mode, "Identity not ready, no connection");
                return None;
            }
        };
        let key = auth.identity_key();

        let mut live = self.live.lock();

        if let Some(current) = live.as_ref() {
            if current.key == key {
                return Some(current.handle.clone());
            }
        }

        // Identity changed: the old handle goes down before its
        // replacement exists.
        if let Some(old) = live.take() {
            tracing::info!(
                connection_id = %old.handle.id,
                auth_mode = ?mode,
                "Identity changed, replacing connection"
            );
            old.handle.disconnect();
        }

        let handle = self.connector.connect(endpoint, ConnectOptions::new(auth));
        tracing::info!(
            connection_id = %handle.id,
            endpoint = %endpoint,
            auth_mode = ?mode,
            "Connection created"
        );
        *live = Some(LiveConnection {
            key,
            handle: handle.clone(),
        });

        Some(handle)
    }

    /// Tear down the live connection, if any. Safe to call repeatedly.
    pub fn release(&self) {
        if let Some(old) = self.live.lock().take() {
            tracing::info!(connection_id = %old.handle.id, "Connection released");
            old.handle.disconnect();
        }
    }

    /// Identity key of the live connection, if one exists
    pub fn current_identity(&self) -> Option<IdentityKey> {
        self.live.lock().as_ref().map(|c| c.key.clone())
    }
}

lazy_static! {
    static ref GLOBAL: ConnectionIdentityManager =
        ConnectionIdentityManager::new(Arc::new(WebSocketConnector::default()));
}

/// Process-wide manager instance, wired to the WebSocket connector.
///
/// UI callers go through this accessor; constructing additional
/// managers is reserved for tests and embedding with a custom
/// [`Connector`].
pub fn global() -> &'static ConnectionIdentityManager {
    &GLOBAL
}
