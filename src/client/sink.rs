//! Caller-side receivers for stream callbacks.

use tokio::sync::mpsc;

use crate::error::ClientError;
use crate::sse::{SseEvent, SseParseError};

/// Receives the callbacks of one request.
///
/// Calls arrive sequentially from the request's pump task, in stream order.
/// Exactly one of [`on_complete`](Self::on_complete) /
/// [`on_error`](Self::on_error) fires, unless the request is cancelled, in
/// which case neither does. Nothing is called after the terminal callback.
///
/// Callbacks must not block; use [`ChannelSink`] to process updates
/// elsewhere. From inside a callback it is safe to call
/// [`state`](super::RequestHandle::state),
/// [`is_finished`](super::RequestHandle::is_finished) and
/// [`cancel`](super::RequestHandle::cancel) on the request's own handle.
/// The state already reads `Completed` or `Failed` inside the terminal
/// callback. A cancel from inside `on_event` suppresses every later
/// callback. Cancelling a *different* request from a callback waits for any
/// callback that request is running.
pub trait EventSink: Send + 'static {
    /// A decoded event, including the terminal `finish` event.
    fn on_event(&mut self, event: SseEvent);

    /// A malformed frame skipped under
    /// [`DecodeErrorPolicy::SkipFrame`](crate::config::DecodeErrorPolicy::SkipFrame).
    /// Not terminal.
    fn on_decode_error(&mut self, error: SseParseError) {
        tracing::warn!(code = error.error_code(), "Skipping malformed SSE frame: {}", error);
    }

    /// The stream finished successfully.
    fn on_complete(&mut self);

    /// The request failed.
    fn on_error(&mut self, error: ClientError);
}

/// Sink assembled from three closures.
pub struct CallbackSink<E, C, R> {
    on_event: E,
    on_complete: Option<C>,
    on_error: Option<R>,
}

impl<E, C, R> CallbackSink<E, C, R>
where
    E: FnMut(SseEvent) + Send + 'static,
    C: FnOnce() + Send + 'static,
    R: FnOnce(ClientError) + Send + 'static,
{
    pub fn new(on_event: E, on_complete: C, on_error: R) -> Self {
        Self {
            on_event,
            on_complete: Some(on_complete),
            on_error: Some(on_error),
        }
    }
}

impl<E, C, R> EventSink for CallbackSink<E, C, R>
where
    E: FnMut(SseEvent) + Send + 'static,
    C: FnOnce() + Send + 'static,
    R: FnOnce(ClientError) + Send + 'static,
{
    fn on_event(&mut self, event: SseEvent) {
        (self.on_event)(event);
    }

    fn on_complete(&mut self) {
        if let Some(on_complete) = self.on_complete.take() {
            on_complete();
        }
    }

    fn on_error(&mut self, error: ClientError) {
        if let Some(on_error) = self.on_error.take() {
            on_error(error);
        }
    }
}

/// One callback, as a value.
#[derive(Debug, Clone, PartialEq)]
pub enum StreamUpdate {
    Event(SseEvent),
    DecodeError(SseParseError),
    Complete,
    Error(ClientError),
}

impl StreamUpdate {
    /// Whether this is the last update of its request
    pub fn is_terminal(&self) -> bool {
        matches!(self, StreamUpdate::Complete | StreamUpdate::Error(_))
    }
}

/// Sink that posts every callback to an unbounded channel.
///
/// Sending never blocks the pump; the receiver drains updates on whatever
/// task or thread owns it. The channel closes after the terminal update, or
/// without one if the request is cancelled. Updates posted before a cancel
/// stay in the channel.
#[derive(Debug, Clone)]
pub struct ChannelSink {
    tx: mpsc::UnboundedSender<StreamUpdate>,
}

impl ChannelSink {
    /// Create a sink and the receiver for its updates
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<StreamUpdate>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    fn post(&self, update: StreamUpdate) {
        // Receiver dropped: the caller stopped listening
        let _ = self.tx.send(update);
    }
}

impl EventSink for ChannelSink {
    fn on_event(&mut self, event: SseEvent) {
        self.post(StreamUpdate::Event(event));
    }

    fn on_decode_error(&mut self, error: SseParseError) {
        self.post(StreamUpdate::DecodeError(error));
    }

    fn on_complete(&mut self) {
        self.post(StreamUpdate::Complete);
    }

    fn on_error(&mut self, error: ClientError) {
        self.post(StreamUpdate::Error(error));
    }
}
