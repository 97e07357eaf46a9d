//! Production [`HttpClient`] backed by reqwest.
//!
//! Failures are classified into [`TransportError`] at the point they happen:
//! while sending (connect, DNS, TLS) or while reading the body.

use async_trait::async_trait;
use futures_util::StreamExt;
use std::time::Duration;

use crate::error::{classify_reqwest_error, TransportError};
use crate::traits::{Headers, HttpClient, Response, StreamingResponse};

/// HTTP client over a shared `reqwest::Client` connection pool.
///
/// # Example
///
/// ```ignore
/// use goose_client::adapters::ReqwestHttpClient;
/// use goose_client::traits::{Headers, HttpClient};
///
/// let client = ReqwestHttpClient::new();
/// let response = client.get("http://127.0.0.1:62996/status", &Headers::new()).await?;
/// println!("Status: {}", response.status);
/// ```
#[derive(Debug, Clone)]
pub struct ReqwestHttpClient {
    client: reqwest::Client,
}

impl ReqwestHttpClient {
    /// Client with reqwest defaults and no timeouts.
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
        }
    }

    /// Create a client with a connect timeout.
    ///
    /// No overall timeout is set: streams stay open as long as the agent
    /// keeps talking.
    pub fn with_connect_timeout(timeout: Duration) -> Result<Self, TransportError> {
        let client = reqwest::Client::builder()
            .connect_timeout(timeout)
            .build()
            .map_err(|e| TransportError::Other {
                message: format!("failed to build HTTP client: {}", e),
            })?;
        Ok(Self { client })
    }

    /// Wrap a preconfigured client (proxies, custom TLS roots).
    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }

    /// Attach `headers` and send, returning once response headers arrive.
    async fn send(
        builder: reqwest::RequestBuilder,
        url: &str,
        headers: &Headers,
    ) -> Result<(u16, Headers, reqwest::Response), TransportError> {
        let response = headers
            .iter()
            .fold(builder, |builder, (name, value)| builder.header(name, value))
            .send()
            .await
            .map_err(|e| classify_reqwest_error(&e, url, false))?;

        // Non-ASCII header values are dropped
        let response_headers = response
            .headers()
            .iter()
            .filter_map(|(name, value)| Some((name.to_string(), value.to_str().ok()?.to_string())))
            .collect();

        Ok((response.status().as_u16(), response_headers, response))
    }
}

impl Default for ReqwestHttpClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl HttpClient for ReqwestHttpClient {
    async fn get(&self, url: &str, headers: &Headers) -> Result<Response, TransportError> {
        let (status, response_headers, response) =
            Self::send(self.client.get(url), url, headers).await?;
        let body = response
            .bytes()
            .await
            .map_err(|e| classify_reqwest_error(&e, url, true))?;

        Ok(Response::with_headers(status, response_headers, body))
    }

    async fn post_stream(
        &self,
        url: &str,
        body: String,
        headers: &Headers,
    ) -> Result<StreamingResponse, TransportError> {
        let (status, response_headers, response) =
            Self::send(self.client.post(url).body(body), url, headers).await?;

        let stream_url = url.to_string();
        let stream = response
            .bytes_stream()
            .map(move |result| result.map_err(|e| classify_reqwest_error(&e, &stream_url, true)));

        Ok(StreamingResponse::new(
            status,
            response_headers,
            Box::pin(stream),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Reserve a port and release it so nothing is listening there.
    fn closed_port_url(path: &str) -> String {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);
        format!("http://127.0.0.1:{}/{}", port, path)
    }

    #[test]
    fn test_with_connect_timeout_builds() {
        assert!(ReqwestHttpClient::with_connect_timeout(Duration::from_secs(3)).is_ok());
    }

    #[tokio::test]
    async fn test_get_connection_refused() {
        let url = closed_port_url("status");
        let result = ReqwestHttpClient::new().get(&url, &Headers::new()).await;
        assert!(matches!(
            result,
            Err(TransportError::ConnectionFailed { url: ref failed, .. }) if *failed == url
        ));
    }

    #[tokio::test]
    async fn test_post_stream_connection_refused() {
        let url = closed_port_url("reply");
        let result = ReqwestHttpClient::new()
            .post_stream(&url, "{}".to_string(), &Headers::new())
            .await;
        assert!(matches!(result, Err(TransportError::ConnectionFailed { .. })));
    }
}
