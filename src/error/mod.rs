//! Error handling for the Goose client.
//!
//! Two layers:
//!
//! - **Transport errors** ([`TransportError`]): what the HTTP seam reports
//!   (connect, DNS, TLS, timeouts, mid-stream disconnects).
//! - **Client errors** ([`ClientError`]): the taxonomy callers see through the
//!   request sink, wrapping transport and decode failures alongside
//!   request-construction and HTTP-status failures.
//!
//! | Kind | Raised when | Retryable |
//! |------|-------------|-----------|
//! | InvalidRequest | bad base URL, serialization failure | No |
//! | Http | non-200 response | 5xx/408/429 |
//! | InvalidResponse | peer did not speak HTTP | No |
//! | Decode | malformed frame or invalid UTF-8 | No |
//! | Transport | connect/DNS/TLS/timeout/disconnect | Mostly |

mod client_error;
mod transport;

pub use client_error::ClientError;
pub use transport::{classify_reqwest_error, TransportError};

/// Result alias for fallible client operations
pub type ClientResult<T> = Result<T, ClientError>;
