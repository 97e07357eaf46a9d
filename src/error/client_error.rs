//! The error type surfaced to callers of the client.

use thiserror::Error;

use super::transport::TransportError;
use crate::sse::SseParseError;

/// Every failure a request can end with.
///
/// Delivered through [`EventSink::on_error`](crate::client::EventSink::on_error)
/// at most once per request; the connection probe flattens it into a
/// diagnostic string.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ClientError {
    /// The request could not be built (bad base URL, serialization failure).
    /// No transport was attempted.
    #[error("Invalid request: {message}")]
    InvalidRequest { message: String },

    /// Non-200 response to the request.
    #[error("HTTP {status}: {body}")]
    Http { status: u16, body: String },

    /// The response could not be interpreted as HTTP.
    #[error("Invalid response: {message}")]
    InvalidResponse { message: String },

    /// A frame or chunk could not be decoded.
    #[error("Decode error: {0}")]
    Decode(#[from] SseParseError),

    /// The connection failed.
    #[error(transparent)]
    Transport(TransportError),
}

impl From<TransportError> for ClientError {
    fn from(err: TransportError) -> Self {
        match err {
            TransportError::MalformedResponse { message } => {
                ClientError::InvalidResponse { message }
            }
            other => ClientError::Transport(other),
        }
    }
}

impl From<serde_json::Error> for ClientError {
    fn from(err: serde_json::Error) -> Self {
        ClientError::InvalidRequest {
            message: format!("failed to serialize request: {}", err),
        }
    }
}

impl ClientError {
    /// Check if this error is likely transient and can be retried.
    ///
    /// The client never retries on its own; this is a hint for the caller.
    pub fn is_retryable(&self) -> bool {
        match self {
            ClientError::InvalidRequest { .. } => false,
            ClientError::Http { status, .. } => *status >= 500 || *status == 429 || *status == 408,
            ClientError::InvalidResponse { .. } => false,
            ClientError::Decode(_) => false,
            ClientError::Transport(err) => err.is_retryable(),
        }
    }

    /// Get a short error code for logging.
    pub fn error_code(&self) -> &'static str {
        match self {
            ClientError::InvalidRequest { .. } => "E_REQ_INVALID",
            ClientError::Http { .. } => "E_NET_HTTP",
            ClientError::InvalidResponse { .. } => "E_NET_INVALID",
            ClientError::Decode(err) => err.error_code(),
            ClientError::Transport(err) => err.error_code(),
        }
    }

    /// Get a user-friendly error message.
    pub fn user_message(&self) -> String {
        match self {
            ClientError::InvalidRequest { .. } => {
                "The request could not be sent. Check the server URL in settings.".to_string()
            }
            ClientError::Http { status, .. } => match *status {
                401 | 403 => "The server rejected the secret key. Check your settings.".to_string(),
                404 => "The server does not support this request.".to_string(),
                429 => "Too many requests. Please wait a moment and try again.".to_string(),
                500..=599 => {
                    "The agent is experiencing issues. Please try again later.".to_string()
                }
                _ => format!("The server returned an error (HTTP {}).", status),
            },
            ClientError::InvalidResponse { .. } => {
                "Received an invalid response from the server.".to_string()
            }
            ClientError::Decode(_) => "Received data the client could not read.".to_string(),
            ClientError::Transport(TransportError::Timeout { .. }) => {
                "The server took too long to respond.".to_string()
            }
            ClientError::Transport(TransportError::ConnectionLost { .. }) => {
                "The connection to the agent was lost.".to_string()
            }
            ClientError::Transport(_) => {
                "Unable to reach the agent. Is goosed running?".to_string()
            }
        }
    }
}
