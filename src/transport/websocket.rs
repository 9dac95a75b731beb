//! WebSocket transport
//!
//! One io task per handle: connect, send the auth frame, pump outbound
//! frames and inbound messages, answer pings, and reconnect with
//! exponential backoff until the handle is disconnected.

use std::sync::Arc;
use std::time::Duration;

use futures::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio::sync::{mpsc, watch};
use tokio::time::timeout;
use tokio_tungstenite::{connect_async, tungstenite::Message, MaybeTlsStream, WebSocketStream};

use crate::chat::{ClientFrame, ServerFrame};
use crate::config::{RealtimeConfig, ReconnectConfig};
use crate::error::{Result, TransportError};
use crate::transport::backoff::ExponentialBackoff;
use crate::transport::{
    ConnectOptions, ConnectionHandle, Connector, TransportEvent, TransportKind, TransportState,
};

/// Timeout for a single connection attempt
const CONNECT_TIMEOUT_SECS: u64 = 10;

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// WebSocket-backed connector
#[derive(Debug, Clone, Default)]
pub struct WebSocketConnector {
    realtime: RealtimeConfig,
    reconnect: ReconnectConfig,
}

impl WebSocketConnector {
    pub fn new(realtime: RealtimeConfig, reconnect: ReconnectConfig) -> Self {
        Self {
            realtime,
            reconnect,
        }
    }
}

impl Connector for WebSocketConnector {
    fn connect(&self, endpoint: &str, options: ConnectOptions) -> Arc<ConnectionHandle> {
        let (handle, outbound_rx) = ConnectionHandle::new(endpoint, options.auth.clone());

        if !options.transports.contains(&TransportKind::WebSocket) {
            tracing::warn!(
                connection_id = %handle.id,
                "Websocket not among requested transports, connecting over websocket anyway"
            );
        }

        let task = IoTask {
            handle: handle.clone(),
            options,
            heartbeat_interval: Duration::from_secs(self.realtime.heartbeat_interval.max(1)),
            backoff: ExponentialBackoff::new(self.reconnect.clone()),
        };
        tokio::spawn(task.run(outbound_rx));

        handle
    }
}

/// Map the portal's HTTP(S) endpoint to the websocket scheme
fn websocket_url(endpoint: &str) -> String {
    if let Some(rest) = endpoint.strip_prefix("https://") {
        format!("wss://{}", rest)
    } else if let Some(rest) = endpoint.strip_prefix("http://") {
        format!("ws://{}", rest)
    } else {
        endpoint.to_string()
    }
}

struct IoTask {
    handle: Arc<ConnectionHandle>,
    options: ConnectOptions,
    heartbeat_interval: Duration,
    backoff: ExponentialBackoff,
}

impl IoTask {
    async fn run(mut self, mut outbound: mpsc::Receiver<ClientFrame>) {
        let url = websocket_url(&self.handle.endpoint);
        let mut closed = self.handle.watch_state();

        while !self.handle.is_closed() {
            match self.establish(&url).await {
                Ok(stream) => {
                    self.backoff.reset();
                    if !self.handle.transition(TransportState::Connected) {
                        // disconnected while the handshake was in flight
                        break;
                    }
                    tracing::info!(
                        connection_id = %self.handle.id,
                        endpoint = %self.handle.endpoint,
                        "Connection established"
                    );
                    self.handle.emit(TransportEvent::Connected);

                    match self.pump(stream, &mut outbound, &mut closed).await {
                        // clean return: the handle was disconnected
                        Ok(()) => break,
                        Err(e) => {
                            if self.handle.is_closed() {
                                break;
                            }
                            tracing::warn!(
                                connection_id = %self.handle.id,
                                error = %e,
                                "Connection lost"
                            );
                            self.handle.emit(TransportEvent::Error(e.to_string()));
                            self.handle.transition(TransportState::Connecting);
                        }
                    }
                }
                Err(e) => {
                    if self.handle.is_closed() {
                        break;
                    }
                    tracing::warn!(
                        connection_id = %self.handle.id,
                        error = %e,
                        attempt = self.backoff.attempt(),
                        "Connect failed"
                    );
                    self.handle.emit(TransportEvent::Error(e.to_string()));
                }
            }

            let delay = self.backoff.next_delay();
            tokio::select! {
                _ = tokio::time::sleep(delay) => {}
                _ = closed.wait_for(|s| *s == TransportState::Closed) => break,
            }
        }

        tracing::debug!(connection_id = %self.handle.id, "Transport task stopped");
    }

    async fn establish(&self, url: &str) -> Result<WsStream> {
        match timeout(Duration::from_secs(CONNECT_TIMEOUT_SECS), connect_async(url)).await {
            Ok(Ok((stream, _response))) => Ok(stream),
            Ok(Err(e)) => Err(e.into()),
            Err(_) => Err(TransportError::ConnectTimeout(CONNECT_TIMEOUT_SECS)),
        }
    }

    async fn pump(
        &self,
        stream: WsStream,
        outbound: &mut mpsc::Receiver<ClientFrame>,
        closed: &mut watch::Receiver<TransportState>,
    ) -> Result<()> {
        let (mut sink, mut source) = stream.split();

        // Authenticate before anything else flows
        let auth = serde_json::to_string(&ClientFrame::Auth(self.options.auth.clone()))?;
        sink.send(Message::Text(auth.into())).await?;

        let mut heartbeat = tokio::time::interval(self.heartbeat_interval);
        // Skip immediate first tick
        heartbeat.tick().await;

        loop {
            tokio::select! {
                _ = async {
                    // Await inside a block so the non-`Send` watch guard is dropped
                    // before this branch yields, keeping the task future `Send`.
                    let _ = closed.wait_for(|s| *s == TransportState::Closed).await;
                } => {
                    let _ = sink.send(Message::Close(None)).await;
                    return Ok(());
                }
                _ = heartbeat.tick() => {
                    let ping = serde_json::to_string(&ClientFrame::Ping)?;
                    sink.send(Message::Text(ping.into())).await?;
                }
                frame = outbound.recv() => {
                    match frame {
                        Some(frame) => {
                            let json = serde_json::to_string(&frame)?;
                            sink.send(Message::Text(json.into())).await?;
                        }
                        // all senders gone: nothing left to pump out
                        None => {
                            let _ = sink.send(Message::Close(None)).await;
                            return Ok(());
                        }
                    }
                }
                message = source.next() => {
                    match message {
                        Some(Ok(Message::Text(text))) => self.dispatch(text.as_ref()),
                        Some(Ok(Message::Ping(data))) => {
                            sink.send(Message::Pong(data)).await?;
                        }
                        Some(Ok(Message::Close(_))) | None => {
                            return Err(TransportError::Closed);
                        }
                        Some(Ok(_)) => {}
                        Some(Err(e)) => return Err(e.into()),
                    }
                }
            }
        }
    }

    fn dispatch(&self, text: &str) {
        match serde_json::from_str::<ServerFrame>(text) {
            Ok(frame) => {
                self.handle.emit(TransportEvent::Frame(frame));
            }
            Err(e) => {
                tracing::debug!(
                    connection_id = %self.handle.id,
                    error = %e,
                    "Dropping unparseable frame"
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_websocket_url_mapping() {
        assert_eq!(
            websocket_url("https://rt.example.com"),
            "wss://rt.example.com"
        );
        assert_eq!(websocket_url("http://localhost:8081"), "ws://localhost:8081");
        assert_eq!(
            websocket_url("wss://rt.example.com/chat"),
            "wss://rt.example.com/chat"
        );
    }
}
