//! Goose API client.
//!
//! [`GooseClient`] is a stateless facade over an [`HttpClient`]: it holds the
//! configuration and nothing per-request, so it can be cloned and used from
//! many tasks at once. Each [`GooseClient::start`] spawns an independent
//! request with its own decoder and connection.
//!
//! # Example
//!
//! ```ignore
//! use goose_client::client::{ChannelSink, GooseClient, StreamUpdate};
//! use goose_client::config::ApiConfig;
//! use goose_client::models::{ChatRequest, Message};
//!
//! let config = ApiConfig::from_env();
//! let client = GooseClient::from_config(config.clone())?;
//! let request = ChatRequest::new(vec![Message::user("hello")], &config.working_dir);
//!
//! let (handle, mut updates) = client.stream(&request);
//! while let Some(update) = updates.recv().await {
//!     println!("{:?}", update);
//! }
//! ```

mod handle;
mod pump;
mod sink;
mod status;

pub use handle::{RequestHandle, RequestState};
pub use sink::{CallbackSink, ChannelSink, EventSink, StreamUpdate};
pub use status::{ConnectionMonitor, ConnectionStatus};

use std::sync::Arc;
use std::time::Instant;

use tokio::sync::mpsc;
use uuid::Uuid;

use crate::adapters::ReqwestHttpClient;
use crate::config::ApiConfig;
use crate::error::{ClientError, ClientResult, TransportError};
use crate::models::ChatRequest;
use crate::traits::{Headers, HttpClient};
use handle::{Dispatcher, Lifecycle};
use pump::PreparedRequest;

pub const REPLY_PATH: &str = "reply";
pub const STATUS_PATH: &str = "status";
pub const SECRET_KEY_HEADER: &str = "X-Secret-Key";

/// Client for the Goose agent backend.
#[derive(Clone)]
pub struct GooseClient {
    config: ApiConfig,
    http: Arc<dyn HttpClient>,
}

impl GooseClient {
    /// Create a client over any [`HttpClient`].
    pub fn new(config: ApiConfig, http: Arc<dyn HttpClient>) -> Self {
        Self { config, http }
    }

    /// Create a client backed by reqwest.
    pub fn from_config(config: ApiConfig) -> Result<Self, TransportError> {
        let http = ReqwestHttpClient::with_connect_timeout(config.connect_timeout)?;
        Ok(Self::new(config, Arc::new(http)))
    }

    pub fn config(&self) -> &ApiConfig {
        &self.config
    }

    /// Start streaming a reply.
    ///
    /// Returns immediately; callbacks arrive on `sink` from a spawned task.
    /// If the request cannot be built, `on_error` fires before this returns
    /// and the handle is already `Failed`.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn start<S: EventSink>(&self, request: &ChatRequest, sink: S) -> RequestHandle {
        let id = Uuid::new_v4();
        let state = Arc::new(Lifecycle::new());
        let mut dispatcher = Dispatcher::new(id, Arc::clone(&state), sink);

        let prepared = match self.prepare_reply(request) {
            Ok(prepared) => prepared,
            Err(err) => {
                dispatcher.fail(err);
                return RequestHandle::inert(id, state);
            }
        };

        dispatcher.advance(RequestState::Requesting);
        tracing::debug!(
            request_id = %id,
            messages = request.messages.len(),
            session_id = request.session_id.as_deref().unwrap_or("<new>"),
            "Starting reply stream"
        );

        let task = tokio::spawn(pump::run_stream(
            Arc::clone(&self.http),
            prepared,
            dispatcher,
        ));
        RequestHandle::spawned(id, state, task)
    }

    /// Start streaming a reply, delivering updates over a channel.
    pub fn stream(
        &self,
        request: &ChatRequest,
    ) -> (RequestHandle, mpsc::UnboundedReceiver<StreamUpdate>) {
        let (sink, rx) = ChannelSink::channel();
        (self.start(request, sink), rx)
    }

    /// Probe `GET /status`.
    ///
    /// Never fails: every problem is folded into the returned status.
    pub async fn test_connection(&self) -> ConnectionStatus {
        let url = match self.config.endpoint(STATUS_PATH) {
            Ok(url) => url,
            Err(err) => return ConnectionStatus::unreachable(err.to_string()),
        };

        let started = Instant::now();
        let headers = self.auth_headers();
        let probe = self.http.get(&url, &headers);
        let status = match tokio::time::timeout(self.config.probe_timeout, probe).await {
            Ok(Ok(response)) if response.status == 200 => {
                ConnectionStatus::connected(started.elapsed().as_millis() as u64)
            }
            Ok(Ok(response)) => ConnectionStatus::unreachable(
                ClientError::Http {
                    status: response.status,
                    body: response.text_lossy(),
                }
                .to_string(),
            ),
            Ok(Err(err)) => ConnectionStatus::unreachable(ClientError::from(err).to_string()),
            Err(_) => ConnectionStatus::unreachable(format!(
                "Status check timed out after {} ms",
                self.config.probe_timeout.as_millis()
            )),
        };

        tracing::debug!(
            url = %url,
            connected = status.is_connected,
            error = status.error.as_deref().unwrap_or(""),
            "Connection probe finished"
        );
        status
    }

    fn auth_headers(&self) -> Headers {
        let mut headers = Headers::new();
        headers.insert(
            SECRET_KEY_HEADER.to_string(),
            self.config.secret_key.clone(),
        );
        headers
    }

    fn reply_headers(&self) -> Headers {
        let mut headers = self.auth_headers();
        headers.insert("Content-Type".to_string(), "application/json".to_string());
        headers.insert("Accept".to_string(), "text/event-stream".to_string());
        headers.insert("Cache-Control".to_string(), "no-cache".to_string());
        headers
    }

    fn prepare_reply(&self, request: &ChatRequest) -> ClientResult<PreparedRequest> {
        Ok(PreparedRequest {
            url: self.config.endpoint(REPLY_PATH)?,
            headers: self.reply_headers(),
            body: serde_json::to_string(request)?,
            policy: self.config.decode_error_policy,
            error_body_timeout: self.config.error_body_timeout,
        })
    }
}

impl std::fmt::Debug for GooseClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GooseClient")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::mock::{MockHttpClient, MockResponse};
    use crate::config::DecodeErrorPolicy;
    use crate::error::TransportError;
    use crate::models::Message;
    use crate::sse::{SseEvent, SseParseError};
    use bytes::Bytes;
    use std::sync::{Mutex, OnceLock};
    use std::time::Duration;

    const BASE: &str = "http://mock.local";
    const REPLY: &str = "http://mock.local/reply";
    const STATUS: &str = "http://mock.local/status";

    fn client_with(mock: &MockHttpClient) -> GooseClient {
        let config = ApiConfig::default()
            .with_base_url(BASE)
            .with_secret_key("s3cret")
            .with_working_dir("/work");
        GooseClient::new(config, Arc::new(mock.clone()))
    }

    fn request() -> ChatRequest {
        ChatRequest::new(vec![Message::user("hi")], "/work")
    }

    fn token(value: &str) -> SseEvent {
        SseEvent::Token {
            value: value.to_string(),
        }
    }

    async fn drain(mut rx: mpsc::UnboundedReceiver<StreamUpdate>) -> Vec<StreamUpdate> {
        let mut updates = Vec::new();
        while let Some(update) = rx.recv().await {
            updates.push(update);
        }
        updates
    }

    fn finish() -> SseEvent {
        SseEvent::Finish {
            reason: None,
            token_state: None,
        }
    }

    #[tokio::test]
    async fn test_reply_request_shape() {
        let mock = MockHttpClient::new();
        mock.set_response(REPLY, MockResponse::sse(["data: {\"type\":\"finish\"}\n"]));
        let client = client_with(&mock);

        let request = request().with_session_id("sess-1");
        let (handle, rx) = client.stream(&request);
        drain(rx).await;
        assert_eq!(handle.wait().await, RequestState::Completed);

        let recorded = mock.get_requests();
        assert_eq!(recorded.len(), 1);
        let sent = &recorded[0];
        assert_eq!(sent.method, "POST");
        assert_eq!(sent.url, REPLY);
        assert_eq!(sent.headers["Content-Type"], "application/json");
        assert_eq!(sent.headers["X-Secret-Key"], "s3cret");
        assert_eq!(sent.headers["Accept"], "text/event-stream");
        assert_eq!(sent.headers["Cache-Control"], "no-cache");

        let body: serde_json::Value =
            serde_json::from_str(sent.body.as_deref().unwrap()).unwrap();
        assert_eq!(body["session_id"], "sess-1");
        assert_eq!(body["session_working_dir"], "/work");
        assert!(body["scheduled_job_id"].is_null());
        assert_eq!(body["messages"][0]["role"], "user");
    }

    #[tokio::test]
    async fn test_token_split_across_chunks() {
        let mock = MockHttpClient::new();
        mock.set_response(
            REPLY,
            MockResponse::sse(["data: {\"type\":\"tok", "en\",\"v\":\"hi\"}\n"]),
        );
        let client = client_with(&mock);

        let (_handle, rx) = client.stream(&request());
        let updates = drain(rx).await;
        assert_eq!(
            updates,
            vec![StreamUpdate::Event(token("hi")), StreamUpdate::Complete]
        );
    }

    #[tokio::test]
    async fn test_finish_stops_processing() {
        let mock = MockHttpClient::new();
        mock.set_response(
            REPLY,
            MockResponse::sse([
                "data: {\"type\":\"token\",\"v\":\"a\"}\ndata: {\"type\":\"finish\"}\ndata: {\"type\":\"token\",\"v\":\"late\"}\n",
                "data: {\"type\":\"token\",\"v\":\"later\"}\n",
            ]),
        );
        let client = client_with(&mock);

        let (handle, rx) = client.stream(&request());
        let updates = drain(rx).await;
        assert_eq!(
            updates,
            vec![
                StreamUpdate::Event(token("a")),
                StreamUpdate::Event(finish()),
                StreamUpdate::Complete,
            ]
        );
        assert_eq!(handle.state(), RequestState::Completed);
    }

    #[tokio::test]
    async fn test_finish_completes_without_transport_close() {
        let mock = MockHttpClient::new();
        mock.set_response(
            REPLY,
            MockResponse::PendingStream {
                status: 200,
                chunks: vec![Ok(Bytes::from("data: {\"type\":\"finish\"}\n"))],
            },
        );
        let client = client_with(&mock);

        let (handle, rx) = client.stream(&request());
        let updates = tokio::time::timeout(Duration::from_secs(5), drain(rx))
            .await
            .unwrap();
        assert_eq!(updates.last(), Some(&StreamUpdate::Complete));
        assert_eq!(handle.wait().await, RequestState::Completed);
    }

    #[tokio::test]
    async fn test_clean_close_without_finish_completes() {
        let mock = MockHttpClient::new();
        mock.set_response(
            REPLY,
            MockResponse::sse([
                ": keep-alive\n\n",
                "data: {\"type\":\"token\",\"v\":\"x\"}\n",
                "data: {\"type\":\"token\",\"v\":\"dangling",
            ]),
        );
        let client = client_with(&mock);

        let (_handle, rx) = client.stream(&request());
        assert_eq!(
            drain(rx).await,
            vec![StreamUpdate::Event(token("x")), StreamUpdate::Complete]
        );
    }

    #[tokio::test]
    async fn test_non_200_reports_http_error() {
        let mock = MockHttpClient::new();
        mock.set_response(
            REPLY,
            MockResponse::Stream {
                status: 404,
                chunks: vec![
                    Ok(Bytes::from("data: {\"type\":\"token\",\"v\":\"x\"}\n")),
                    Ok(Bytes::from("no such route")),
                ],
            },
        );
        let client = client_with(&mock);

        let (handle, rx) = client.stream(&request());
        let updates = drain(rx).await;
        assert_eq!(
            updates,
            vec![StreamUpdate::Error(ClientError::Http {
                status: 404,
                body: "data: {\"type\":\"token\",\"v\":\"x\"}\nno such route".to_string(),
            })]
        );
        assert_eq!(handle.state(), RequestState::Failed);
    }

    #[tokio::test]
    async fn test_non_200_with_open_body_fails_with_partial_body() {
        let mock = MockHttpClient::new();
        mock.set_response(
            REPLY,
            MockResponse::PendingStream {
                status: 404,
                chunks: vec![Ok(Bytes::from("not found"))],
            },
        );
        let config = ApiConfig::default()
            .with_base_url(BASE)
            .with_error_body_timeout(Duration::from_millis(50));
        let client = GooseClient::new(config, Arc::new(mock));

        let (handle, rx) = client.stream(&request());
        let updates = tokio::time::timeout(Duration::from_secs(5), drain(rx))
            .await
            .expect("non-200 response never failed");
        assert_eq!(
            updates,
            vec![StreamUpdate::Error(ClientError::Http {
                status: 404,
                body: "not found".to_string(),
            })]
        );
        assert_eq!(handle.wait().await, RequestState::Failed);
    }

    #[tokio::test]
    async fn test_callbacks_may_inspect_their_handle() {
        let mock = MockHttpClient::new();
        mock.set_response(REPLY, MockResponse::sse(["data: {\"type\":\"ping\"}\n"]));
        let client = client_with(&mock);

        let cell: Arc<OnceLock<RequestHandle>> = Arc::new(OnceLock::new());
        let (seen_tx, mut seen_rx) = mpsc::unbounded_channel();
        let (on_event_cell, on_complete_cell) = (Arc::clone(&cell), Arc::clone(&cell));
        let on_complete_tx = seen_tx.clone();
        let sink = CallbackSink::new(
            move |_event: SseEvent| {
                let state = on_event_cell.get().map(RequestHandle::state);
                let _ = seen_tx.send(format!("event {:?}", state));
            },
            move || {
                let finished = on_complete_cell.get().map(RequestHandle::is_finished);
                let _ = on_complete_tx.send(format!("complete {:?}", finished));
            },
            |_err: ClientError| panic!("stream should not fail"),
        );

        // The pump cannot run before this test yields
        assert!(cell.set(client.start(&request(), sink)).is_ok());

        let mut seen = Vec::new();
        while let Some(entry) = tokio::time::timeout(Duration::from_secs(5), seen_rx.recv())
            .await
            .expect("callback deadlocked on its own handle")
        {
            seen.push(entry);
        }
        assert_eq!(seen, vec!["event Some(Streaming)", "complete Some(true)"]);
    }

    #[tokio::test]
    async fn test_callback_cancelling_itself_ends_quietly() {
        let mock = MockHttpClient::new();
        mock.set_response(
            REPLY,
            MockResponse::PendingStream {
                status: 200,
                chunks: vec![Ok(Bytes::from(
                    "data: {\"type\":\"ping\"}\ndata: {\"type\":\"ping\"}\n",
                ))],
            },
        );
        let client = client_with(&mock);

        let cell: Arc<OnceLock<RequestHandle>> = Arc::new(OnceLock::new());
        let (seen_tx, mut seen_rx) = mpsc::unbounded_channel();
        let own = Arc::clone(&cell);
        let (complete_tx, error_tx) = (seen_tx.clone(), seen_tx.clone());
        let sink = CallbackSink::new(
            move |_event: SseEvent| {
                let cancelled = own.get().map(RequestHandle::cancel);
                let _ = seen_tx.send(format!("event cancelled={:?}", cancelled));
            },
            move || {
                let _ = complete_tx.send("complete".to_string());
            },
            move |_err: ClientError| {
                let _ = error_tx.send("error".to_string());
            },
        );

        assert!(cell.set(client.start(&request(), sink)).is_ok());

        let mut seen = Vec::new();
        while let Some(entry) = tokio::time::timeout(Duration::from_secs(5), seen_rx.recv())
            .await
            .expect("callback deadlocked cancelling its own handle")
        {
            seen.push(entry);
        }
        assert_eq!(seen, vec!["event cancelled=Some(true)"]);
        assert_eq!(cell.get().unwrap().state(), RequestState::Cancelled);
    }

    #[tokio::test]
    async fn test_success_status_other_than_200_is_error() {
        let mock = MockHttpClient::new();
        mock.set_response(
            REPLY,
            MockResponse::Stream {
                status: 204,
                chunks: Vec::new(),
            },
        );
        let client = client_with(&mock);

        let (_handle, rx) = client.stream(&request());
        let updates = drain(rx).await;
        assert!(matches!(
            updates.as_slice(),
            [StreamUpdate::Error(ClientError::Http { status: 204, .. })]
        ));
    }

    #[tokio::test]
    async fn test_connect_failure_reports_transport_error() {
        let mock = MockHttpClient::new();
        mock.set_response(
            REPLY,
            MockResponse::Error(TransportError::ConnectionFailed {
                url: REPLY.to_string(),
                message: "connection refused".to_string(),
            }),
        );
        let client = client_with(&mock);

        let (handle, rx) = client.stream(&request());
        let updates = drain(rx).await;
        assert!(matches!(
            updates.as_slice(),
            [StreamUpdate::Error(ClientError::Transport(
                TransportError::ConnectionFailed { .. }
            ))]
        ));
        assert_eq!(handle.wait().await, RequestState::Failed);
    }

    #[tokio::test]
    async fn test_mid_stream_disconnect_fails_once() {
        let mock = MockHttpClient::new();
        mock.set_response(
            REPLY,
            MockResponse::Stream {
                status: 200,
                chunks: vec![
                    Ok(Bytes::from("data: {\"type\":\"token\",\"v\":\"a\"}\n")),
                    Err(TransportError::ConnectionLost {
                        message: "reset by peer".to_string(),
                    }),
                    Ok(Bytes::from("data: {\"type\":\"finish\"}\n")),
                ],
            },
        );
        let client = client_with(&mock);

        let (_handle, rx) = client.stream(&request());
        let updates = drain(rx).await;
        assert_eq!(updates.len(), 2);
        assert_eq!(updates[0], StreamUpdate::Event(token("a")));
        assert!(matches!(
            updates[1],
            StreamUpdate::Error(ClientError::Transport(TransportError::ConnectionLost { .. }))
        ));
    }

    #[tokio::test]
    async fn test_malformed_frame_skipped_by_default() {
        let mock = MockHttpClient::new();
        mock.set_response(
            REPLY,
            MockResponse::sse([
                "data: {\"type\":\"token\",\"v\":\"one\"}\n",
                "data: {\"type\":\"token\",\"v\":\n",
                "data: {\"type\":\"token\",\"v\":\"two\"}\n",
            ]),
        );
        let client = client_with(&mock);

        let (_handle, rx) = client.stream(&request());
        let updates = drain(rx).await;
        assert_eq!(updates.len(), 4);
        assert_eq!(updates[0], StreamUpdate::Event(token("one")));
        assert!(matches!(
            updates[1],
            StreamUpdate::DecodeError(SseParseError::InvalidJson { .. })
        ));
        assert_eq!(updates[2], StreamUpdate::Event(token("two")));
        assert_eq!(updates[3], StreamUpdate::Complete);
    }

    #[tokio::test]
    async fn test_malformed_frame_aborts_under_abort_policy() {
        let mock = MockHttpClient::new();
        mock.set_response(
            REPLY,
            MockResponse::sse([
                "data: {\"type\":\"token\",\"v\":\"one\"}\n",
                "data: {\"type\":\"bogus\"}\n",
                "data: {\"type\":\"token\",\"v\":\"two\"}\n",
            ]),
        );
        let config = ApiConfig::default()
            .with_base_url(BASE)
            .with_decode_error_policy(DecodeErrorPolicy::Abort);
        let client = GooseClient::new(config, Arc::new(mock));

        let (handle, rx) = client.stream(&request());
        let updates = drain(rx).await;
        assert_eq!(updates.len(), 2);
        assert_eq!(updates[0], StreamUpdate::Event(token("one")));
        assert!(matches!(
            updates[1],
            StreamUpdate::Error(ClientError::Decode(SseParseError::InvalidJson { .. }))
        ));
        assert_eq!(handle.wait().await, RequestState::Failed);
    }

    #[tokio::test]
    async fn test_invalid_utf8_is_fatal() {
        let mock = MockHttpClient::new();
        mock.set_response(
            REPLY,
            MockResponse::Stream {
                status: 200,
                chunks: vec![
                    Ok(Bytes::from("data: {\"type\":\"ping\"}\n")),
                    Ok(Bytes::from_static(b"data: \xFF\xFE\n")),
                    Ok(Bytes::from("data: {\"type\":\"ping\"}\n")),
                ],
            },
        );
        let client = client_with(&mock);

        let (_handle, rx) = client.stream(&request());
        let updates = drain(rx).await;
        assert_eq!(updates.len(), 2);
        assert_eq!(updates[0], StreamUpdate::Event(SseEvent::Ping));
        assert!(matches!(
            updates[1],
            StreamUpdate::Error(ClientError::Decode(SseParseError::InvalidUtf8 { .. }))
        ));
    }

    #[tokio::test]
    async fn test_code_point_split_across_chunks() {
        let frame = "data: {\"type\":\"token\",\"v\":\"caf\u{e9}\"}\n".as_bytes();
        let split = frame.iter().position(|b| *b == 0xC3).unwrap() + 1;

        let mock = MockHttpClient::new();
        mock.set_response(
            REPLY,
            MockResponse::Stream {
                status: 200,
                chunks: vec![
                    Ok(Bytes::copy_from_slice(&frame[..split])),
                    Ok(Bytes::copy_from_slice(&frame[split..])),
                ],
            },
        );
        let client = client_with(&mock);

        let (_handle, rx) = client.stream(&request());
        assert_eq!(
            drain(rx).await,
            vec![StreamUpdate::Event(token("caf\u{e9}")), StreamUpdate::Complete]
        );
    }

    #[tokio::test]
    async fn test_invalid_base_url_fails_synchronously() {
        let mock = MockHttpClient::new();
        let config = ApiConfig::default().with_base_url("::not a url::");
        let client = GooseClient::new(config, Arc::new(mock.clone()));

        let (handle, mut rx) = client.stream(&request());

        // Delivered before `stream` returned
        assert!(matches!(
            rx.try_recv().unwrap(),
            StreamUpdate::Error(ClientError::InvalidRequest { .. })
        ));
        assert_eq!(handle.state(), RequestState::Failed);
        assert!(!handle.cancel());
        assert!(mock.get_requests().is_empty());
        assert_eq!(handle.wait().await, RequestState::Failed);
    }

    #[tokio::test]
    async fn test_cancel_suppresses_terminal_callbacks() {
        let mock = MockHttpClient::new();
        mock.set_response(
            REPLY,
            MockResponse::PendingStream {
                status: 200,
                chunks: vec![Ok(Bytes::from("data: {\"type\":\"token\",\"v\":\"a\"}\n"))],
            },
        );
        let client = client_with(&mock);

        let (handle, mut rx) = client.stream(&request());
        let first = tokio::time::timeout(Duration::from_secs(5), rx.recv())
            .await
            .unwrap();
        assert_eq!(first, Some(StreamUpdate::Event(token("a"))));

        assert!(handle.cancel());
        assert_eq!(handle.state(), RequestState::Cancelled);

        // Channel closes once the aborted pump drops the sink
        let rest = tokio::time::timeout(Duration::from_secs(5), drain(rx))
            .await
            .unwrap();
        assert!(rest.is_empty());
        assert_eq!(handle.wait().await, RequestState::Cancelled);
    }

    #[tokio::test]
    async fn test_concurrent_requests_are_independent() {
        let mock = MockHttpClient::new();
        mock.set_response(
            REPLY,
            MockResponse::sse([
                "data: {\"type\":\"token\",\"v\":\"par",
                "tial\"}\ndata: {\"type\":\"finish\"}\n",
            ]),
        );
        let client = client_with(&mock);

        let (first, rx_first) = client.stream(&request());
        let (second, rx_second) = client.stream(&request());
        assert_ne!(first.id(), second.id());

        let (a, b) = tokio::join!(drain(rx_first), drain(rx_second));
        assert_eq!(a, b);
        assert_eq!(a[0], StreamUpdate::Event(token("partial")));
        assert_eq!(mock.get_requests().len(), 2);
    }

    #[tokio::test]
    async fn test_callback_sink_receives_triple() {
        let mock = MockHttpClient::new();
        mock.set_response(
            REPLY,
            MockResponse::sse(["data: {\"type\":\"ping\"}\n", "data: {\"type\":\"finish\"}\n"]),
        );
        let client = client_with(&mock);

        let (done_tx, done_rx) = tokio::sync::oneshot::channel();
        let events = Arc::new(Mutex::new(Vec::new()));
        let seen = Arc::clone(&events);
        let sink = CallbackSink::new(
            move |event: SseEvent| seen.lock().unwrap().push(event),
            move || {
                let _ = done_tx.send(Ok(()));
            },
            |_err: ClientError| panic!("stream should not fail"),
        );

        let handle = client.start(&request(), sink);
        let outcome: Result<(), ClientError> = done_rx.await.unwrap();
        assert!(outcome.is_ok());
        assert_eq!(*events.lock().unwrap(), vec![SseEvent::Ping, finish()]);
        assert_eq!(handle.wait().await, RequestState::Completed);
    }

    // Connection probe

    #[tokio::test]
    async fn test_probe_success() {
        let mock = MockHttpClient::new();
        mock.set_response(STATUS, MockResponse::status(200, "ok"));
        let client = client_with(&mock);

        let status = client.test_connection().await;
        assert!(status.is_connected);
        assert!(status.error.is_none());

        let recorded = mock.get_requests();
        assert_eq!(recorded[0].method, "GET");
        assert_eq!(recorded[0].headers["X-Secret-Key"], "s3cret");
    }

    #[tokio::test]
    async fn test_probe_http_error_mentions_status() {
        let mock = MockHttpClient::new();
        mock.set_response(STATUS, MockResponse::status(503, "maintenance"));
        let client = client_with(&mock);

        let status = client.test_connection().await;
        assert!(!status.is_connected);
        assert!(status.error.unwrap().contains("503"));
    }

    #[tokio::test]
    async fn test_probe_transport_error() {
        let mock = MockHttpClient::new();
        mock.set_response(
            STATUS,
            MockResponse::Error(TransportError::DnsResolutionFailed {
                host: "mock.local".to_string(),
            }),
        );
        let client = client_with(&mock);

        let status = client.test_connection().await;
        assert!(!status.is_connected);
        assert!(status.error.unwrap().contains("mock.local"));
    }

    #[tokio::test]
    async fn test_probe_invalid_base_url() {
        let config = ApiConfig::default().with_base_url("nope");
        let client = GooseClient::new(config, Arc::new(MockHttpClient::new()));

        let status = client.test_connection().await;
        assert!(!status.is_connected);
        assert!(status.error.unwrap().contains("Invalid request"));
    }

    #[tokio::test]
    async fn test_connection_monitor_publishes() {
        let mock = MockHttpClient::new();
        mock.set_response(STATUS, MockResponse::status(200, "ok"));
        let client = client_with(&mock);

        let monitor = ConnectionMonitor::spawn(client, Duration::from_millis(20));
        let mut rx = monitor.subscribe();
        tokio::time::timeout(Duration::from_secs(5), rx.changed())
            .await
            .unwrap()
            .unwrap();
        assert!(monitor.current().is_connected);
    }
}
