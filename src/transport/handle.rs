//! Connection handle and transport events

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::{broadcast, mpsc, watch};
use uuid::Uuid;

use crate::chat::{ClientFrame, ServerFrame};
use crate::error::{Result, TransportError};
use crate::identity::AuthPayload;

const OUTBOUND_BUFFER_SIZE: usize = 32;
const EVENT_BUFFER_SIZE: usize = 64;

/// Lifecycle state of one transport connection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportState {
    Connecting,
    Connected,
    Closed,
}

/// Events observed on a connection
#[derive(Debug, Clone)]
pub enum TransportEvent {
    Connected,
    Frame(ServerFrame),
    Error(String),
    Closed,
}

/// Handle for a single realtime connection.
///
/// Opaque to callers: the connection manager hands it out, an io task
/// drives the socket behind it. Dropping the handle does not close the
/// connection; [`ConnectionHandle::disconnect`] does.
pub struct ConnectionHandle {
    pub id: Uuid,
    pub endpoint: String,
    pub connected_at: DateTime<Utc>,
    auth: AuthPayload,
    outbound: mpsc::Sender<ClientFrame>,
    events: broadcast::Sender<TransportEvent>,
    state: watch::Sender<TransportState>,
}

impl ConnectionHandle {
    /// Create a detached handle.
    ///
    /// The caller owns the returned outbound receiver and is expected to
    /// drive it from an io task.
    pub fn new(endpoint: &str, auth: AuthPayload) -> (Arc<Self>, mpsc::Receiver<ClientFrame>) {
        let (outbound_tx, outbound_rx) = mpsc::channel(OUTBOUND_BUFFER_SIZE);
        let (events_tx, _) = broadcast::channel(EVENT_BUFFER_SIZE);
        let (state_tx, _) = watch::channel(TransportState::Connecting);

        let handle = Arc::new(Self {
            id: Uuid::new_v4(),
            endpoint: endpoint.to_string(),
            connected_at: Utc::now(),
            auth,
            outbound: outbound_tx,
            events: events_tx,
            state: state_tx,
        });

        (handle, outbound_rx)
    }

    /// The identity payload this connection was created with
    pub fn auth(&self) -> &AuthPayload {
        &self.auth
    }

    /// Queue a frame for the io task. Fails once the handle is closed.
    pub async fn send(&self, frame: ClientFrame) -> Result<()> {
        if self.is_closed() {
            return Err(TransportError::Closed);
        }

        self.outbound
            .send(frame)
            .await
            .map_err(|e| TransportError::Send(e.to_string()))
    }

    /// Subscribe to connection events (connect, inbound frames, errors, close)
    pub fn subscribe(&self) -> broadcast::Receiver<TransportEvent> {
        self.events.subscribe()
    }

    /// Watch lifecycle state changes
    pub fn watch_state(&self) -> watch::Receiver<TransportState> {
        self.state.subscribe()
    }

    pub fn state(&self) -> TransportState {
        *self.state.borrow()
    }

    pub fn is_closed(&self) -> bool {
        self.state() == TransportState::Closed
    }

    /// Tear down the connection. Idempotent; the io task observes the
    /// state change and closes the socket.
    pub fn disconnect(&self) {
        let was_open = self.state.send_if_modified(|state| {
            if *state == TransportState::Closed {
                false
            } else {
                *state = TransportState::Closed;
                true
            }
        });

        if was_open {
            tracing::info!(connection_id = %self.id, "Connection closed");
            self.emit(TransportEvent::Closed);
        }
    }

    /// Move to `next` unless already closed. Closed is terminal.
    pub(crate) fn transition(&self, next: TransportState) -> bool {
        self.state.send_if_modified(|state| {
            if *state == TransportState::Closed || *state == next {
                false
            } else {
                *state = next;
                true
            }
        })
    }

    pub(crate) fn emit(&self, event: TransportEvent) {
        // No subscribers is fine
        let _ = self.events.send(event);
    }
}
