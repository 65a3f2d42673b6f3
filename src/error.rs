//! Error kinds surfaced to the calling agent.

use std::time::Duration;

use thiserror::Error;

/// Failures talking to NotebookLM or waiting on one of its jobs.
///
/// Remote error bodies are kept as opaque strings; the upstream API is
/// undocumented and its payload shapes are not stable.
#[derive(Debug, Error)]
pub enum NotebookError {
    #[error("NotebookLM authentication required: {0}. Run the login flow again to refresh the session.")]
    AuthenticationRequired(String),

    #[error("remote job {task_id} failed: {message}")]
    RemoteJobFailed { task_id: String, message: String },

    #[error("job {task_id} did not finish within {}s; it may still be running remotely", .waited.as_secs())]
    PollTimeout { task_id: String, waited: Duration },

    #[error("rate limited by NotebookLM{}", retry_hint(.retry_after))]
    RateLimited { retry_after: Option<Duration> },

    #[error("transport error: {0}")]
    TransportError(String),

    #[error("request rejected (HTTP {status}): {body}")]
    Rejected { status: u16, body: String },

    #[error("unreadable session file: {0}")]
    Session(String),

    #[error("'{0}' is not a valid id")]
    InvalidId(String),
}

impl NotebookError {
    /// Short kind label used as the prefix of tool error text.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::AuthenticationRequired(_) => "AuthenticationRequired",
            Self::RemoteJobFailed { .. } => "RemoteJobFailed",
            Self::PollTimeout { .. } => "PollTimeout",
            Self::RateLimited { .. } => "RateLimited",
            Self::TransportError(_) => "TransportError",
            Self::Rejected { .. } => "Rejected",
            Self::Session(_) => "AuthenticationRequired",
            Self::InvalidId(_) => "InvalidArguments",
        }
    }
}

impl From<reqwest::Error> for NotebookError {
    fn from(err: reqwest::Error) -> Self {
        Self::TransportError(err.to_string())
    }
}

fn retry_hint(retry_after: &Option<Duration>) -> String {
    match retry_after {
        Some(wait) => format!("; retry after {}s", wait.as_secs()),
        None => "; retry after a cooldown".to_string(),
    }
}
