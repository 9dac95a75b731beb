use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::identity::AuthPayload;

/// Frames sent from client to server
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload")]
pub enum ClientFrame {
    Auth(AuthPayload),
    Send {
        conversation_id: String,
        body: String,
    },
    Ping,
}

/// Frames sent from server to client
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ServerFrame {
    #[serde(rename = "message")]
    Message {
        #[serde(flatten)]
        message: ChatMessage,
    },
    #[serde(rename = "pong")]
    Pong,
    #[serde(rename = "heartbeat")]
    Heartbeat,
    #[serde(rename = "error")]
    Error { code: String, message: String },
}

impl ClientFrame {
    pub fn send(conversation_id: impl Into<String>, body: impl Into<String>) -> Self {
        Self::Send {
            conversation_id: conversation_id.into(),
            body: body.into(),
        }
    }
}

impl ServerFrame {
    pub fn error(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Error {
            code: code.into(),
            message: message.into(),
        }
    }
}

/// A single chat message as delivered by the realtime server
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub id: Uuid,
    pub conversation_id: String,
    pub sender_id: String,
    pub body: String,
    pub sent_at: DateTime<Utc>,
}
