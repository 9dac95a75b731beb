//! Connection identity integration tests
//!
//! These tests drive the connection manager end-to-end over a recording
//! connector, without a realtime server. They pin down the contract the
//! chat UI relies on: one live connection per identity, transparent
//! replacement on identity change, and clean teardown.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;

use chat_realtime_client::identity::{AuthMode, AuthPayload, ConnectionParams};
use chat_realtime_client::manager::ConnectionIdentityManager;
use chat_realtime_client::transport::{
    ConnectOptions, ConnectionHandle, Connector, TransportEvent, TransportKind,
};

const ENDPOINT: &str = "https://rt.example.com";

/// Records every connect call so tests can assert on transport traffic
#[derive(Default)]
struct RecordingConnector {
    connects: AtomicUsize,
    last_options: Mutex<Option<ConnectOptions>>,
}

impl RecordingConnector {
    fn connect_count(&self) -> usize {
        self.connects.load(Ordering::SeqCst)
    }

    fn last_auth(&self) -> Option<AuthPayload> {
        self.last_options.lock().as_ref().map(|o| o.auth.clone())
    }
}

impl Connector for RecordingConnector {
    fn connect(&self, endpoint: &str, options: ConnectOptions) -> Arc<ConnectionHandle> {
        self.connects.fetch_add(1, Ordering::SeqCst);
        let (handle, _outbound) = ConnectionHandle::new(endpoint, options.auth.clone());
        *self.last_options.lock() = Some(options);
        handle
    }
}

fn create_test_environment() -> (Arc<RecordingConnector>, ConnectionIdentityManager) {
    let connector = Arc::new(RecordingConnector::default());
    let manager = ConnectionIdentityManager::new(connector.clone());
    (connector, manager)
}

/// Drain the event queue and count teardown notifications
fn closed_events(events: &mut tokio::sync::broadcast::Receiver<TransportEvent>) -> usize {
    let mut count = 0;
    while let Ok(event) = events.try_recv() {
        if matches!(event, TransportEvent::Closed) {
            count += 1;
        }
    }
    count
}

// =============================================================================
// Idempotence under a stable identity
// =============================================================================

#[test]
fn test_acquire_is_idempotent_for_stable_identity() {
    let (connector, manager) = create_test_environment();
    let params = ConnectionParams::with_token("abc123");

    let h1 = manager.acquire(&params, AuthMode::Token, ENDPOINT).unwrap();
    let h2 = manager.acquire(&params, AuthMode::Token, ENDPOINT).unwrap();

    assert!(Arc::ptr_eq(&h1, &h2));
    assert_eq!(connector.connect_count(), 1);
}

// =============================================================================
// Identity-change replacement
// =============================================================================

#[test]
fn test_identity_change_tears_down_old_handle_first() {
    let (connector, manager) = create_test_environment();

    let h1 = manager
        .acquire(&ConnectionParams::with_token("alice"), AuthMode::Token, ENDPOINT)
        .unwrap();
    let mut h1_events = h1.subscribe();

    let h2 = manager
        .acquire(&ConnectionParams::with_token("bob"), AuthMode::Token, ENDPOINT)
        .unwrap();

    assert!(!Arc::ptr_eq(&h1, &h2));
    assert!(h1.is_closed());
    assert!(!h2.is_closed());
    // exactly one teardown on the replaced handle
    assert_eq!(closed_events(&mut h1_events), 1);
    assert_eq!(connector.connect_count(), 2);
    assert_eq!(connector.last_auth(), Some(AuthPayload::Token("bob".to_string())));
}

// =============================================================================
// Missing-field rejection
// =============================================================================

#[test]
fn test_token_mode_rejects_params_without_token() {
    let (connector, manager) = create_test_environment();

    let result = manager.acquire(
        &ConnectionParams::with_user_id("u1"),
        AuthMode::Token,
        ENDPOINT,
    );

    assert!(result.is_none());
    assert_eq!(connector.connect_count(), 0);
}

#[test]
fn test_user_id_mode_rejects_params_without_user_id() {
    let (connector, manager) = create_test_environment();

    let result = manager.acquire(
        &ConnectionParams::with_token("t1"),
        AuthMode::UserId,
        ENDPOINT,
    );

    assert!(result.is_none());
    assert_eq!(connector.connect_count(), 0);
}

// =============================================================================
// Release semantics
// =============================================================================

#[test]
fn test_release_forces_reconnect_for_same_identity() {
    let (connector, manager) = create_test_environment();
    let params = ConnectionParams::with_user_id("42");

    let h1 = manager.acquire(&params, AuthMode::UserId, ENDPOINT).unwrap();
    manager.release();
    assert!(h1.is_closed());
    assert!(manager.current_identity().is_none());

    let h2 = manager.acquire(&params, AuthMode::UserId, ENDPOINT).unwrap();

    assert!(!Arc::ptr_eq(&h1, &h2));
    assert_eq!(connector.connect_count(), 2);
}

#[test]
fn test_release_is_safe_to_repeat() {
    let (_, manager) = create_test_environment();

    manager.release();
    manager.release();

    let _ = manager
        .acquire(&ConnectionParams::with_token("t1"), AuthMode::Token, ENDPOINT)
        .unwrap();
    manager.release();
    manager.release();

    assert!(manager.current_identity().is_none());
}

// =============================================================================
// Connection options
// =============================================================================

#[test]
fn test_connect_options_carry_single_field_payload() {
    let (connector, manager) = create_test_environment();
    // both fields supplied: only the mode's field may reach the wire
    let params = ConnectionParams {
        user_id: Some("42".to_string()),
        token: Some("abc".to_string()),
    };

    manager.acquire(&params, AuthMode::UserId, ENDPOINT).unwrap();

    let options = connector.last_options.lock().clone().unwrap();
    assert_eq!(options.auth, AuthPayload::UserId("42".to_string()));
    assert!(options.transports.contains(&TransportKind::WebSocket));
    assert!(options.with_credentials);

    let payload = serde_json::to_value(&options.auth).unwrap();
    assert_eq!(payload, serde_json::json!({"userId": "42"}));
}

// =============================================================================
// Full user-switch scenario
// =============================================================================

#[test]
fn test_user_switch_scenario() {
    let (connector, manager) = create_test_environment();

    // first login
    let h1 = manager
        .acquire(&ConnectionParams::with_user_id("42"), AuthMode::UserId, ENDPOINT)
        .unwrap();
    assert_eq!(connector.connect_count(), 1);
    assert_eq!(connector.last_auth(), Some(AuthPayload::UserId("42".to_string())));

    // re-render with the same identity: no transport traffic
    let h1_again = manager
        .acquire(&ConnectionParams::with_user_id("42"), AuthMode::UserId, ENDPOINT)
        .unwrap();
    assert!(Arc::ptr_eq(&h1, &h1_again));
    assert_eq!(connector.connect_count(), 1);

    // switch user: old connection down, new one up
    let h2 = manager
        .acquire(&ConnectionParams::with_user_id("99"), AuthMode::UserId, ENDPOINT)
        .unwrap();
    assert!(h1.is_closed());
    assert!(!h2.is_closed());
    assert_eq!(connector.connect_count(), 2);
    assert_eq!(connector.last_auth(), Some(AuthPayload::UserId("99".to_string())));
    assert_eq!(manager.current_identity().unwrap().as_str(), "user:99");
}
