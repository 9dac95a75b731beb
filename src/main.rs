use std::sync::Arc;

use anyhow::Result;
use tokio::signal;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use chat_realtime_client::config::Settings;
use chat_realtime_client::identity::ConnectionParams;
use chat_realtime_client::manager::ConnectionIdentityManager;
use chat_realtime_client::transport::{TransportEvent, WebSocketConnector};

/// Connectivity probe: acquires a connection for the identity found in
/// the environment and streams transport events to the log until
/// interrupted.
#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();

    let settings = Settings::new()?;
    tracing::info!("Configuration loaded");

    let params = ConnectionParams {
        token: std::env::var("CHAT_TOKEN").ok(),
        user_id: std::env::var("CHAT_USER_ID").ok(),
    };

    let connector =
        WebSocketConnector::new(settings.realtime.clone(), settings.reconnect.clone());
    let manager = ConnectionIdentityManager::new(Arc::new(connector));

    let handle = match manager.acquire(
        &params,
        settings.realtime.auth_mode,
        &settings.realtime.endpoint,
    ) {
        Some(handle) => handle,
        None => anyhow::bail!(
            "not connectable: set REALTIME_ENDPOINT and CHAT_TOKEN or CHAT_USER_ID"
        ),
    };
    tracing::info!(connection_id = %handle.id, "Probe connection acquired");

    let mut events = handle.subscribe();
    loop {
        tokio::select! {
            _ = signal::ctrl_c() => {
                tracing::info!("Received Ctrl+C, shutting down");
                break;
            }
            event = events.recv() => {
                match event {
                    Ok(TransportEvent::Connected) => tracing::info!("Transport connected"),
                    Ok(TransportEvent::Frame(frame)) => tracing::info!(?frame, "Frame received"),
                    Ok(TransportEvent::Error(e)) => tracing::warn!(error = %e, "Transport error"),
                    Ok(TransportEvent::Closed) => {
                        tracing::info!("Transport closed");
                        break;
                    }
                    Err(e) => {
                        tracing::warn!(error = %e, "Event stream ended");
                        break;
                    }
                }
            }
        }
    }

    manager.release();
    tracing::info!("Probe shutdown complete");
    Ok(())
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}
