//! The per-request task: transport in, callbacks out.

use std::sync::Arc;
use std::time::Duration;

use futures_util::StreamExt;

use super::handle::{Dispatcher, RequestState};
use super::sink::EventSink;
use crate::config::DecodeErrorPolicy;
use crate::error::ClientError;
use crate::sse::{FrameDecoder, Utf8Carry};
use crate::traits::{Headers, HttpClient};

/// Cap on how much of a non-200 body is kept for the error.
pub(crate) const MAX_ERROR_BODY_BYTES: usize = 64 * 1024;

/// Everything the pump needs, prepared before it is spawned.
pub(crate) struct PreparedRequest {
    pub url: String,
    pub headers: Headers,
    pub body: String,
    pub policy: DecodeErrorPolicy,
    /// Bound on reading a non-200 body
    pub error_body_timeout: Duration,
}

/// Drive one request to its terminal state.
///
/// Returning drops the body stream, which closes the connection; every exit
/// path after a terminal callback relies on that.
pub(crate) async fn run_stream<S: EventSink>(
    http: Arc<dyn HttpClient>,
    request: PreparedRequest,
    mut dispatcher: Dispatcher<S>,
) {
    let request_id = dispatcher.request_id();
    tracing::debug!(%request_id, url = %request.url, "Opening stream");

    let response = match http
        .post_stream(&request.url, request.body, &request.headers)
        .await
    {
        Ok(response) => response,
        Err(err) => {
            dispatcher.fail(err.into());
            return;
        }
    };

    if response.status != 200 {
        let status = response.status;
        let body = response
            .collect_body(MAX_ERROR_BODY_BYTES, request.error_body_timeout)
            .await;
        dispatcher.fail(ClientError::Http { status, body });
        return;
    }

    if !dispatcher.advance(RequestState::Streaming) {
        return;
    }

    let mut body = response.body;
    let mut decoder = FrameDecoder::new();
    let mut utf8 = Utf8Carry::new();
    let mut frames_seen = 0usize;

    while let Some(chunk) = body.next().await {
        if dispatcher.is_terminal() {
            return;
        }

        let bytes = match chunk {
            Ok(bytes) => bytes,
            Err(err) => {
                dispatcher.fail(err.into());
                return;
            }
        };

        let text = match utf8.decode(&bytes) {
            Ok(text) => text,
            Err(err) => {
                dispatcher.fail(err.into());
                return;
            }
        };

        for frame in decoder.feed(&text) {
            frames_seen += 1;
            match frame {
                Ok(event) => {
                    let terminal = event.is_terminal();
                    if !dispatcher.event(event) {
                        return;
                    }
                    if terminal {
                        tracing::debug!(%request_id, frames_seen, "Finish event received");
                        dispatcher.complete();
                        return;
                    }
                }
                Err(err) => match request.policy {
                    DecodeErrorPolicy::SkipFrame => {
                        if !dispatcher.decode_error(err) {
                            return;
                        }
                    }
                    DecodeErrorPolicy::Abort => {
                        dispatcher.fail(err.into());
                        return;
                    }
                },
            }
        }
    }

    if decoder.has_pending() || utf8.has_pending() {
        tracing::debug!(
            %request_id,
            pending = decoder.pending().len(),
            "Stream closed with an unterminated line; discarding it"
        );
    }

    tracing::debug!(%request_id, frames_seen, "Stream closed by server");
    dispatcher.complete();
}
