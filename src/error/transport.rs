//! Transport-level error types.
//!
//! Failures below HTTP semantics: connecting, resolving, TLS, timeouts, and
//! connections dropping mid-body.

use thiserror::Error;

/// Transport-specific error variants.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    /// Connection to the server failed.
    #[error("Connection failed to '{url}': {message}")]
    ConnectionFailed { url: String, message: String },

    /// DNS resolution failed.
    #[error("DNS resolution failed for '{host}'")]
    DnsResolutionFailed { host: String },

    /// Request or body read timed out.
    #[error("{operation} timed out: {message}")]
    Timeout { operation: String, message: String },

    /// TLS/SSL error.
    #[error("TLS error: {message}")]
    TlsError { message: String },

    /// Connection dropped while the body was streaming.
    #[error("Connection lost: {message}")]
    ConnectionLost { message: String },

    /// Peer did not speak HTTP.
    #[error("Malformed response: {message}")]
    MalformedResponse { message: String },

    /// Generic transport error.
    #[error("Transport error: {message}")]
    Other { message: String },
}

impl TransportError {
    /// Check if this error is likely transient and can be retried.
    pub fn is_retryable(&self) -> bool {
        match self {
            TransportError::ConnectionFailed { .. } => true,
            TransportError::DnsResolutionFailed { .. } => true,
            TransportError::Timeout { .. } => true,
            TransportError::TlsError { .. } => false,
            TransportError::ConnectionLost { .. } => true,
            TransportError::MalformedResponse { .. } => false,
            TransportError::Other { .. } => false,
        }
    }

    /// Get a short error code for logging.
    pub fn error_code(&self) -> &'static str {
        match self {
            TransportError::ConnectionFailed { .. } => "E_NET_CONN",
            TransportError::DnsResolutionFailed { .. } => "E_NET_DNS",
            TransportError::Timeout { .. } => "E_NET_TIMEOUT",
            TransportError::TlsError { .. } => "E_NET_TLS",
            TransportError::ConnectionLost { .. } => "E_NET_LOST",
            TransportError::MalformedResponse { .. } => "E_NET_INVALID",
            TransportError::Other { .. } => "E_NET_OTHER",
        }
    }
}

/// Classify a reqwest error into a TransportError.
///
/// `streaming` marks errors raised while reading the body, where a plain I/O
/// failure means the connection went away.
pub fn classify_reqwest_error(err: &reqwest::Error, url: &str, streaming: bool) -> TransportError {
    if err.is_timeout() {
        return TransportError::Timeout {
            operation: if streaming { "Body read" } else { "HTTP request" }.to_string(),
            message: err.to_string(),
        };
    }

    if err.is_connect() {
        return TransportError::ConnectionFailed {
            url: url.to_string(),
            message: err.to_string(),
        };
    }

    if err.is_decode() {
        return TransportError::MalformedResponse {
            message: err.to_string(),
        };
    }

    // Check the error chain for TLS/DNS/parse hints
    let err_str = error_chain_text(err).to_lowercase();
    if err_str.contains("tls") || err_str.contains("ssl") || err_str.contains("certificate") {
        TransportError::TlsError {
            message: err.to_string(),
        }
    } else if err_str.contains("dns") || err_str.contains("resolve") {
        TransportError::DnsResolutionFailed {
            host: extract_host_from_url(url),
        }
    } else if err_str.contains("invalid http") || err_str.contains("parse") {
        TransportError::MalformedResponse {
            message: err.to_string(),
        }
    } else if streaming || err.is_body() {
        TransportError::ConnectionLost {
            message: err.to_string(),
        }
    } else {
        TransportError::Other {
            message: err.to_string(),
        }
    }
}

fn error_chain_text(err: &(dyn std::error::Error + 'static)) -> String {
    let mut text = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        text.push_str(": ");
        text.push_str(&cause.to_string());
        source = cause.source();
    }
    text
}

/// Extract the host portion from a URL string.
fn extract_host_from_url(url: &str) -> String {
    reqwest::Url::parse(url)
        .ok()
        .and_then(|parsed| parsed.host_str().map(str::to_string))
        .unwrap_or_else(|| url.to_string())
}
