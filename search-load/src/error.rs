use std::time::Duration;

use hyper::StatusCode;

/// Rejected before any request is sent. Fatal to the run.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum InputError {
    #[error("invalid selection {0:?}, choose 1 (artist) or 2 (album)")]
    InvalidSelection(String),
    #[error("query text is empty")]
    EmptyQuery,
    #[error("number of clients must be at least 1")]
    ZeroReplication,
    #[error("max in-flight requests must be at least 1")]
    ZeroConcurrencyLimit,
}

/// Failure of a single request. Never leaves the task that produced it.
#[derive(Debug, thiserror::Error)]
pub enum RequestError {
    #[error("transport failure: {0:#}")]
    Transport(anyhow::Error),
    #[error("no response within {0:?}")]
    Timeout(Duration),
    #[error("server answered {status}: {body}")]
    Status { status: StatusCode, body: String },
    #[error("task terminated abnormally: {0}")]
    Aborted(String),
}

impl RequestError {
    /// Connection, timeout and malformed-response failures.
    #[must_use]
    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Transport(_) | Self::Timeout(_))
    }
}
