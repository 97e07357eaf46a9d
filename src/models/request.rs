use serde::{Deserialize, Serialize};

use super::message::Message;

/// Request body for `POST /reply`.
///
/// Field names are the backend contract. Absent optionals serialize as
/// `null`, not omitted.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChatRequest {
    /// Conversation so far, oldest first
    pub messages: Vec<Message>,
    /// Session to continue; None starts a new one
    pub session_id: Option<String>,
    /// Working directory the agent operates in
    pub session_working_dir: String,
    /// Set when the reply is driven by a scheduled job
    pub scheduled_job_id: Option<String>,
}

impl ChatRequest {
    /// Create a request for a new session
    pub fn new(messages: Vec<Message>, session_working_dir: impl Into<String>) -> Self {
        Self {
            messages,
            session_id: None,
            session_working_dir: session_working_dir.into(),
            scheduled_job_id: None,
        }
    }

    /// Continue an existing session
    pub fn with_session_id(mut self, session_id: impl Into<String>) -> Self {
        self.session_id = Some(session_id.into());
        self
    }

    pub fn with_scheduled_job_id(mut self, job_id: impl Into<String>) -> Self {
        self.scheduled_job_id = Some(job_id.into());
        self
    }
}
