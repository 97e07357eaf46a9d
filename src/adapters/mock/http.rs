//! Mock HTTP client for testing.
//!
//! Provides a configurable mock HTTP client that can return predefined
//! responses, scripted body streams, or errors.

use async_trait::async_trait;
use bytes::Bytes;
use futures::{stream, StreamExt};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::error::TransportError;
use crate::traits::{ByteStream, Headers, HttpClient, Response, StreamingResponse};

/// A recorded HTTP request for verification in tests.
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    /// HTTP method (GET or POST)
    pub method: String,
    /// Request URL
    pub url: String,
    /// Request headers
    pub headers: Headers,
    /// Request body (for POST requests)
    pub body: Option<String>,
}

/// Configuration for a mock response.
#[derive(Debug, Clone)]
pub enum MockResponse {
    /// Return a buffered response
    Success(Response),
    /// Fail before any response arrives
    Error(TransportError),
    /// Stream the given chunks, then end the body
    Stream {
        status: u16,
        chunks: Vec<Result<Bytes, TransportError>>,
    },
    /// Stream the given chunks, then hang without ending the body
    PendingStream {
        status: u16,
        chunks: Vec<Result<Bytes, TransportError>>,
    },
}

impl MockResponse {
    /// A 200 stream of text chunks that ends cleanly
    pub fn sse<I, S>(chunks: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        MockResponse::Stream {
            status: 200,
            chunks: chunks
                .into_iter()
                .map(|chunk| Ok(Bytes::from(chunk.into())))
                .collect(),
        }
    }

    /// A buffered response with a text body
    pub fn status(status: u16, body: &str) -> Self {
        MockResponse::Success(Response::new(status, Bytes::from(body.to_string())))
    }
}

impl MockResponse {
    fn into_buffered(self) -> Result<Response, TransportError> {
        match self {
            MockResponse::Success(response) => Ok(response),
            MockResponse::Error(err) => Err(err),
            MockResponse::Stream { status, chunks }
            | MockResponse::PendingStream { status, chunks } => {
                let body = chunks
                    .into_iter()
                    .try_fold(Vec::new(), |mut body, chunk| {
                        body.extend_from_slice(&chunk?);
                        Ok::<_, TransportError>(body)
                    })?;
                Ok(Response::new(status, Bytes::from(body)))
            }
        }
    }

    fn into_streaming(self) -> Result<StreamingResponse, TransportError> {
        let (status, headers, body): (u16, Headers, ByteStream) = match self {
            MockResponse::Success(Response {
                status,
                headers,
                body,
            }) => (
                status,
                headers,
                Box::pin(stream::once(async move { Ok::<_, TransportError>(body) })),
            ),
            MockResponse::Error(err) => return Err(err),
            MockResponse::Stream { status, chunks } => {
                (status, Headers::new(), Box::pin(stream::iter(chunks)))
            }
            MockResponse::PendingStream { status, chunks } => (
                status,
                Headers::new(),
                Box::pin(stream::iter(chunks).chain(stream::pending())),
            ),
        };
        Ok(StreamingResponse::new(status, headers, body))
    }
}

#[derive(Debug, Default)]
struct MockState {
    /// Scripted responses keyed by URL or URL prefix
    routes: HashMap<String, MockResponse>,
    fallback: Option<MockResponse>,
    log: Vec<RecordedRequest>,
}

impl MockState {
    /// Exact match first, then the longest matching prefix, then the fallback.
    fn route(&self, url: &str) -> Option<MockResponse> {
        self.routes
            .get(url)
            .or_else(|| {
                self.routes
                    .iter()
                    .filter(|(prefix, _)| url.starts_with(prefix.as_str()))
                    .max_by_key(|(prefix, _)| prefix.len())
                    .map(|(_, response)| response)
            })
            .or(self.fallback.as_ref())
            .cloned()
    }
}

/// Mock HTTP client for testing.
///
/// Responses are matched by exact URL, then by the longest URL prefix, then
/// the default. Clones share the same script and request log.
///
/// # Example
///
/// ```ignore
/// use goose_client::adapters::mock::{MockHttpClient, MockResponse};
///
/// let client = MockHttpClient::new();
/// client.set_response(
///     "http://127.0.0.1:62996/reply",
///     MockResponse::sse(["data: {\"type\":\"finish\"}\n"]),
/// );
/// ```
#[derive(Debug, Clone, Default)]
pub struct MockHttpClient {
    state: Arc<Mutex<MockState>>,
}

impl MockHttpClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Script the response for a URL or URL prefix.
    pub fn set_response(&self, url: &str, response: MockResponse) {
        self.lock().routes.insert(url.to_string(), response);
    }

    /// Script the response for URLs no route matches.
    pub fn set_default_response(&self, response: MockResponse) {
        self.lock().fallback = Some(response);
    }

    /// Every request made so far, oldest first.
    pub fn get_requests(&self) -> Vec<RecordedRequest> {
        self.lock().log.clone()
    }

    fn lock(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Log the request and look up its scripted response.
    fn exchange(
        &self,
        method: &str,
        url: &str,
        headers: &Headers,
        body: Option<String>,
    ) -> Result<MockResponse, TransportError> {
        let mut state = self.lock();
        state.log.push(RecordedRequest {
            method: method.to_string(),
            url: url.to_string(),
            headers: headers.clone(),
            body,
        });
        state.route(url).ok_or_else(|| TransportError::Other {
            message: format!("No mock response for URL: {}", url),
        })
    }
}

#[async_trait]
impl HttpClient for MockHttpClient {
    async fn get(&self, url: &str, headers: &Headers) -> Result<Response, TransportError> {
        self.exchange("GET", url, headers, None)?.into_buffered()
    }

    async fn post_stream(
        &self,
        url: &str,
        body: String,
        headers: &Headers,
    ) -> Result<StreamingResponse, TransportError> {
        self.exchange("POST", url, headers, Some(body))?
            .into_streaming()
    }
}
