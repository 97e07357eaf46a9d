//! Lifecycle of a single streaming request.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread::{self, ThreadId};

use tokio::task::JoinHandle;
use uuid::Uuid;

use super::sink::EventSink;
use crate::error::ClientError;
use crate::sse::{SseEvent, SseParseError};

/// Where a request is in its lifecycle.
///
/// `Completed`, `Failed` and `Cancelled` are absorbing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestState {
    Idle,
    Requesting,
    Streaming,
    Completed,
    Failed,
    Cancelled,
}

impl RequestState {
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            RequestState::Completed | RequestState::Failed | RequestState::Cancelled
        )
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Lifecycle shared between a request's pump and its handle.
///
/// `state` is only ever held for a read or a single transition, so readers
/// never wait on a running callback. `delivery` is held for the whole of each
/// sink callback; an outside [`RequestHandle::cancel`] takes it to wait out a
/// callback in progress.
#[derive(Debug)]
pub(crate) struct Lifecycle {
    state: Mutex<RequestState>,
    delivery: Mutex<()>,
    /// Thread currently running a sink callback
    callback_thread: Mutex<Option<ThreadId>>,
}

impl Lifecycle {
    pub(crate) fn new() -> Self {
        Self {
            state: Mutex::new(RequestState::Idle),
            delivery: Mutex::new(()),
            callback_thread: Mutex::new(None),
        }
    }

    fn state(&self) -> RequestState {
        *lock(&self.state)
    }

    /// Move to `next` unless already finished.
    fn transition(&self, next: RequestState) -> Result<RequestState, RequestState> {
        let mut state = lock(&self.state);
        if state.is_terminal() {
            return Err(*state);
        }
        Ok(std::mem::replace(&mut *state, next))
    }

    /// Whether the caller is inside one of this request's callbacks.
    fn in_callback(&self) -> bool {
        *lock(&self.callback_thread) == Some(thread::current().id())
    }

    fn enter_callback(&self) -> CallbackScope<'_> {
        *lock(&self.callback_thread) = Some(thread::current().id());
        CallbackScope(self)
    }
}

/// Clears the callback marker, also when a callback panics.
struct CallbackScope<'a>(&'a Lifecycle);

impl Drop for CallbackScope<'_> {
    fn drop(&mut self) {
        *lock(&self.0.callback_thread) = None;
    }
}

type SharedState = Arc<Lifecycle>;

/// Delivers callbacks to a sink while enforcing the lifecycle.
///
/// Every callback runs under the delivery lock, so an outside
/// [`RequestHandle::cancel`] either lands before it (and suppresses it) or
/// waits for it to return. A callback may itself read or cancel its handle.
pub(crate) struct Dispatcher<S> {
    request_id: Uuid,
    lifecycle: SharedState,
    sink: S,
}

impl<S: EventSink> Dispatcher<S> {
    pub(crate) fn new(request_id: Uuid, lifecycle: SharedState, sink: S) -> Self {
        Self {
            request_id,
            lifecycle,
            sink,
        }
    }

    pub(crate) fn request_id(&self) -> Uuid {
        self.request_id
    }

    pub(crate) fn is_terminal(&self) -> bool {
        self.lifecycle.state().is_terminal()
    }

    /// Move to a non-terminal state. Returns false if already finished.
    pub(crate) fn advance(&self, next: RequestState) -> bool {
        match self.lifecycle.transition(next) {
            Ok(from) => {
                tracing::debug!(request_id = %self.request_id, ?from, to = ?next, "Request state change");
                true
            }
            Err(_) => false,
        }
    }

    /// Run `callback` unless the request is finished, first moving to
    /// `terminal` when given.
    fn deliver(&mut self, terminal: Option<RequestState>, callback: impl FnOnce(&mut S)) -> bool {
        let _delivery = lock(&self.lifecycle.delivery);
        let open = match terminal {
            Some(next) => self.lifecycle.transition(next).is_ok(),
            None => !self.lifecycle.state().is_terminal(),
        };
        if !open {
            return false;
        }

        let _scope = self.lifecycle.enter_callback();
        callback(&mut self.sink);
        true
    }

    /// Deliver an event. Returns false once the request is finished.
    pub(crate) fn event(&mut self, event: SseEvent) -> bool {
        self.deliver(None, |sink| sink.on_event(event))
    }

    /// Report a skipped frame. Returns false once the request is finished.
    pub(crate) fn decode_error(&mut self, error: SseParseError) -> bool {
        self.deliver(None, |sink| sink.on_decode_error(error))
    }

    /// Finish successfully, unless already finished.
    pub(crate) fn complete(&mut self) -> bool {
        let request_id = self.request_id;
        self.deliver(Some(RequestState::Completed), |sink| {
            tracing::debug!(%request_id, "Request completed");
            sink.on_complete();
        })
    }

    /// Fail, unless already finished.
    pub(crate) fn fail(&mut self, error: ClientError) -> bool {
        let request_id = self.request_id;
        self.deliver(Some(RequestState::Failed), |sink| {
            tracing::error!(
                %request_id,
                code = error.error_code(),
                "Request failed: {}",
                error
            );
            sink.on_error(error);
        })
    }
}

/// Handle to one in-flight streaming request.
///
/// Dropping the handle does not cancel the request; the stream runs to its
/// terminal callback in the background.
#[derive(Debug)]
pub struct RequestHandle {
    id: Uuid,
    lifecycle: SharedState,
    task: Option<JoinHandle<()>>,
}

impl RequestHandle {
    pub(crate) fn spawned(id: Uuid, lifecycle: SharedState, task: JoinHandle<()>) -> Self {
        Self {
            id,
            lifecycle,
            task: Some(task),
        }
    }

    /// A handle for a request that never reached the transport.
    pub(crate) fn inert(id: Uuid, lifecycle: SharedState) -> Self {
        Self {
            id,
            lifecycle,
            task: None,
        }
    }

    /// Identifier used in log lines for this request
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Current state; never waits on a callback in progress.
    pub fn state(&self) -> RequestState {
        self.lifecycle.state()
    }

    pub fn is_finished(&self) -> bool {
        self.state().is_terminal()
    }

    /// Cancel the request and close its connection.
    ///
    /// After this returns no further callback runs: neither `on_complete`
    /// nor `on_error` fires for a cancelled request. Returns false if the
    /// request had already finished, in which case nothing changes.
    pub fn cancel(&self) -> bool {
        // From inside one of this request's callbacks the delivery lock is
        // already held by this thread
        let _delivery = (!self.lifecycle.in_callback()).then(|| lock(&self.lifecycle.delivery));
        if self.lifecycle.transition(RequestState::Cancelled).is_err() {
            return false;
        }

        tracing::debug!(request_id = %self.id, "Request cancelled");
        if let Some(task) = &self.task {
            task.abort();
        }
        true
    }

    /// Wait for the request to finish and return its final state.
    pub async fn wait(mut self) -> RequestState {
        if let Some(task) = self.task.take() {
            // Aborted tasks resolve with a cancellation JoinError
            let _ = task.await;
        }
        self.state()
    }
}
