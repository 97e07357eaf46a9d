//! SSE event types and definitions
//!
//! Contains the SseEvent enum with every event variant the Goose backend
//! emits on the `/reply` stream.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::models::{Message, TokenState};

/// Typed SSE events from the Goose `/reply` stream.
///
/// Each `data:` payload is a JSON object whose `type` field selects the
/// variant. Tags are matched in snake_case; the PascalCase spelling the Goose
/// server uses is accepted as an alias.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SseEvent {
    /// An assistant message (text, tool requests, tool responses)
    #[serde(alias = "Message")]
    Message {
        message: Message,
        #[serde(default)]
        token_state: Option<TokenState>,
    },
    /// Incremental text delta
    #[serde(alias = "Token")]
    Token {
        #[serde(rename = "v")]
        value: String,
    },
    /// Non-fatal error reported by the agent
    #[serde(alias = "Error")]
    Error { error: String },
    /// Stream completed; the only terminal variant
    #[serde(alias = "Finish")]
    Finish {
        #[serde(default)]
        reason: Option<String>,
        #[serde(default)]
        token_state: Option<TokenState>,
    },
    /// The agent switched model mid-stream
    #[serde(alias = "ModelChange")]
    ModelChange { model: String, mode: String },
    /// Tool/extension notification, kept as raw JSON
    #[serde(alias = "Notification")]
    Notification {
        request_id: String,
        message: serde_json::Value,
    },
    /// The server replaced the conversation history (e.g. after compaction)
    #[serde(alias = "UpdateConversation")]
    UpdateConversation { conversation: Vec<Message> },
    /// Heartbeat
    #[serde(alias = "Ping")]
    Ping,
}

impl SseEvent {
    /// Whether this event ends the useful content of a stream.
    pub fn is_terminal(&self) -> bool {
        matches!(self, SseEvent::Finish { .. })
    }

    /// Returns the event type name as a string for logging.
    pub fn event_type_name(&self) -> &'static str {
        match self {
            SseEvent::Message { .. } => "message",
            SseEvent::Token { .. } => "token",
            SseEvent::Error { .. } => "error",
            SseEvent::Finish { .. } => "finish",
            SseEvent::ModelChange { .. } => "model_change",
            SseEvent::Notification { .. } => "notification",
            SseEvent::UpdateConversation { .. } => "update_conversation",
            SseEvent::Ping => "ping",
        }
    }
}

/// Represents a classified SSE line
#[derive(Debug, Clone, PartialEq)]
pub enum SseLine<'a> {
    /// Payload of a `data: ` line, prefix stripped
    Data(&'a str),
    /// Empty line (event separator)
    Empty,
    /// Comment line (starts with ':')
    Comment(&'a str),
    /// Any other field (`event:`, `id:`, `retry:`, `data:` without a space)
    Other(&'a str),
}

/// Errors that can occur while decoding the SSE stream
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SseParseError {
    /// A `data:` payload did not decode into any known event
    #[error("Invalid JSON in data frame: {reason}")]
    InvalidJson { payload: String, reason: String },

    /// Received bytes are not valid UTF-8
    #[error("Stream bytes are not valid UTF-8 (valid up to byte {valid_up_to})")]
    InvalidUtf8 { valid_up_to: usize },
}

impl SseParseError {
    /// Get a short error code for logging.
    pub fn error_code(&self) -> &'static str {
        match self {
            SseParseError::InvalidJson { .. } => "E_SSE_JSON",
            SseParseError::InvalidUtf8 { .. } => "E_SSE_UTF8",
        }
    }
}
