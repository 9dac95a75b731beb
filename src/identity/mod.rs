//! Identity model for realtime connections
//!
//! A connection is authenticated either by a bearer token or by a raw
//! user id, selected by the active [`AuthMode`]. The derived
//! [`IdentityKey`] is the change-detection token the connection manager
//! compares to decide whether an existing connection is reusable.

use serde::{Deserialize, Serialize};

/// Which identity field authenticates the realtime connection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthMode {
    Token,
    UserId,
}

/// Caller-supplied identity fields, gathered on every acquire
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConnectionParams {
    pub user_id: Option<String>,
    pub token: Option<String>,
}

impl ConnectionParams {
    pub fn with_token(token: impl Into<String>) -> Self {
        Self {
            token: Some(token.into()),
            user_id: None,
        }
    }

    pub fn with_user_id(user_id: impl Into<String>) -> Self {
        Self {
            user_id: Some(user_id.into()),
            token: None,
        }
    }
}

/// Single-field authentication payload carried to the transport.
///
/// Serializes to `{"token": "…"}` or `{"userId": "…"}`, matching what
/// the realtime server expects in the connection handshake.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum AuthPayload {
    #[serde(rename = "token")]
    Token(String),
    #[serde(rename = "userId")]
    UserId(String),
}

impl AuthPayload {
    /// Build the payload for the active mode.
    ///
    /// Only the field matching the mode is consulted. Returns `None`
    /// when that field is absent, which callers treat as "identity not
    /// ready yet" rather than an error.
    pub fn for_mode(params: &ConnectionParams, mode: AuthMode) -> Option<Self> {
        match mode {
            AuthMode::Token => params.token.clone().map(Self::Token),
            AuthMode::UserId => params.user_id.clone().map(Self::UserId),
        }
    }

    pub fn identity_key(&self) -> IdentityKey {
        IdentityKey::from_payload(self)
    }
}

/// Equality token derived from the identity that created a connection.
/// Compared, logged, never parsed back.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct IdentityKey(String);

impl IdentityKey {
    pub fn from_payload(payload: &AuthPayload) -> Self {
        match payload {
            AuthPayload::Token(token) => Self(format!("token:{}", token)),
            AuthPayload::UserId(user_id) => Self(format!("user:{}", user_id)),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for IdentityKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_payload_serialization_shapes() {
        let token = AuthPayload::Token("abc123".to_string());
        let json = serde_json::to_value(&token).unwrap();
        assert_eq!(json, serde_json::json!({"token": "abc123"}));

        let user = AuthPayload::UserId("42".to_string());
        let json = serde_json::to_value(&user).unwrap();
        assert_eq!(json, serde_json::json!({"userId": "42"}));
    }

    #[test]
    fn test_for_mode_consults_only_matching_field() {
        // Both fields present: the mode decides, the other is ignored
        let params = ConnectionParams {
            user_id: Some("42".to_string()),
            token: Some("abc".to_string()),
        };

        assert_eq!(
            AuthPayload::for_mode(&params, AuthMode::Token),
            Some(AuthPayload::Token("abc".to_string()))
        );
        assert_eq!(
            AuthPayload::for_mode(&params, AuthMode::UserId),
            Some(AuthPayload::UserId("42".to_string()))
        );
    }

    #[test]
    fn test_for_mode_missing_field() {
        let only_user = ConnectionParams::with_user_id("u1");
        assert_eq!(AuthPayload::for_mode(&only_user, AuthMode::Token), None);

        let only_token = ConnectionParams::with_token("t1");
        assert_eq!(AuthPayload::for_mode(&only_token, AuthMode::UserId), None);
    }

    #[test]
    fn test_identity_key_format() {
        let token_key = AuthPayload::Token("abc".to_string()).identity_key();
        assert_eq!(token_key.as_str(), "token:abc");

        let user_key = AuthPayload::UserId("42".to_string()).identity_key();
        assert_eq!(user_key.as_str(), "user:42");

        assert_ne!(token_key, user_key);
    }

    #[test]
    fn test_auth_mode_config_values() {
        let mode: AuthMode = serde_json::from_str("\"token\"").unwrap();
        assert_eq!(mode, AuthMode::Token);

        let mode: AuthMode = serde_json::from_str("\"user_id\"").unwrap();
        assert_eq!(mode, AuthMode::UserId);
    }
}
