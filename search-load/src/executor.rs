use std::fmt;
use std::future::Future;
use std::time::{Duration, Instant};

use crate::client::HttpClient;
use crate::error::RequestError;
use crate::query::{build_url, SearchRequest, SearchTarget};

/// What one request produced. The body is opaque text.
#[derive(Debug)]
pub struct RequestOutcome {
    pub request: SearchRequest,
    pub url: String,
    pub latency: Duration,
    pub result: Result<String, RequestError>,
}

impl RequestOutcome {
    #[inline]
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.result.is_ok()
    }

    /// A task that never got to report its own outcome.
    #[must_use]
    pub fn aborted(request: SearchRequest, target: &SearchTarget, reason: String) -> Self {
        Self {
            url: build_url(target, &request),
            request,
            latency: Duration::ZERO,
            result: Err(RequestError::Aborted(reason)),
        }
    }
}

impl fmt::Display for RequestOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let query = self.request.query();
        let field = self.request.field();
        match &self.result {
            Ok(body) => write!(f, "Result for search '{query}' ({field}): {body}"),
            Err(e) => write!(f, "Search '{query}' ({field}) failed: {e}"),
        }
    }
}

/// Issues exactly one GET for `request` and prints the outcome.
///
/// Failures come back inside the outcome, this never panics on network errors.
pub async fn execute(
    client: &HttpClient,
    target: &SearchTarget,
    request: SearchRequest,
    timeout: Option<Duration>,
) -> RequestOutcome {
    let url = build_url(target, &request);
    let (latency, result) = run_timed(fetch(client, &url, timeout)).await;
    let outcome = RequestOutcome {
        request,
        url,
        latency,
        result,
    };
    match &outcome.result {
        Ok(_) => tracing::debug!(
            field = %outcome.request.field(),
            latency_us = outcome.latency.as_micros() as u64,
            "search answered"
        ),
        Err(e) => tracing::warn!(url = %outcome.url, error = %e, "search failed"),
    }
    println!("{outcome}");
    outcome
}

async fn fetch(
    client: &HttpClient,
    url: &str,
    timeout: Option<Duration>,
) -> Result<String, RequestError> {
    let response = match timeout {
        Some(limit) => tokio::time::timeout(limit, client.get(url))
            .await
            .map_err(|_| RequestError::Timeout(limit))?,
        None => client.get(url).await,
    }
    .map_err(RequestError::Transport)?;
    let body = String::from_utf8_lossy(&response.body).into_owned();
    if response.status.is_success() {
        Ok(body)
    } else {
        Err(RequestError::Status {
            status: response.status,
            body,
        })
    }
}

#[inline]
async fn run_timed<T, F: Future<Output = T>>(fut: F) -> (Duration, T) {
    let start = Instant::now();
    let res = fut.await;
    (start.elapsed(), res)
}
