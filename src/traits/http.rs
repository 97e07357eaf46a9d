//! HTTP client trait abstraction.
//!
//! Provides a trait-based abstraction for HTTP operations, enabling
//! dependency injection and mocking in tests.

use async_trait::async_trait;
use bytes::Bytes;
use futures::{Stream, StreamExt};
use std::collections::HashMap;
use std::pin::Pin;
use std::time::Duration;

use crate::error::TransportError;

/// HTTP headers represented as a key-value map.
pub type Headers = HashMap<String, String>;

/// Body of a streaming response, chunked as the transport delivers it.
pub type ByteStream = Pin<Box<dyn Stream<Item = Result<Bytes, TransportError>> + Send>>;

/// Fully buffered HTTP response.
#[derive(Debug, Clone)]
pub struct Response {
    /// HTTP status code
    pub status: u16,
    /// Response headers
    pub headers: Headers,
    /// Response body
    pub body: Bytes,
}

impl Response {
    /// Create a new response.
    pub fn new(status: u16, body: Bytes) -> Self {
        Self {
            status,
            headers: HashMap::new(),
            body,
        }
    }

    /// Create a new response with headers.
    pub fn with_headers(status: u16, headers: Headers, body: Bytes) -> Self {
        Self {
            status,
            headers,
            body,
        }
    }

    /// Get the response body as text, replacing invalid UTF-8.
    pub fn text_lossy(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

/// Response whose headers have arrived and whose body is still streaming.
pub struct StreamingResponse {
    /// HTTP status code
    pub status: u16,
    /// Response headers
    pub headers: Headers,
    /// Body chunks
    pub body: ByteStream,
}

impl StreamingResponse {
    pub fn new(status: u16, headers: Headers, body: ByteStream) -> Self {
        Self {
            status,
            headers,
            body,
        }
    }

    /// Read the body as text, stopping at `limit` bytes, the first transport
    /// error, or once `wait` has elapsed. Used to capture error bodies; a body
    /// that never ends yields whatever arrived before the deadline.
    pub async fn collect_body(mut self, limit: usize, wait: Duration) -> String {
        let deadline = tokio::time::Instant::now() + wait;
        let mut collected = Vec::new();
        while collected.len() < limit {
            match tokio::time::timeout_at(deadline, self.body.next()).await {
                Ok(Some(Ok(chunk))) => collected.extend_from_slice(&chunk),
                Ok(Some(Err(_))) | Ok(None) => break,
                Err(_) => {
                    tracing::debug!(
                        bytes = collected.len(),
                        "Error body still open at deadline; keeping what arrived"
                    );
                    break;
                }
            }
        }
        collected.truncate(limit);
        String::from_utf8_lossy(&collected).into_owned()
    }
}

impl std::fmt::Debug for StreamingResponse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StreamingResponse")
            .field("status", &self.status)
            .field("headers", &self.headers)
            .finish_non_exhaustive()
    }
}

/// Trait for HTTP client operations.
///
/// This trait abstracts HTTP operations to enable dependency injection
/// and mocking in tests. Implementations include the production reqwest-based
/// client and a scriptable mock.
#[async_trait]
pub trait HttpClient: Send + Sync {
    /// Perform a GET request and buffer the whole body.
    async fn get(&self, url: &str, headers: &Headers) -> Result<Response, TransportError>;

    /// Perform a POST request and return as soon as the response headers
    /// arrive, whatever the status.
    ///
    /// Dropping the returned body closes the connection.
    async fn post_stream(
        &self,
        url: &str,
        body: String,
        headers: &Headers,
    ) -> Result<StreamingResponse, TransportError>;
}
