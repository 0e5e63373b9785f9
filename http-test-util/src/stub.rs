//! In-process search endpoint that records what clients ask for.
//!
//! The stub answers `GET /?q=<term>` with a plain-text body and remembers every
//! decoded `q` value in arrival order. Tests use it to count requests, compare
//! the exact query terms a client sent, and observe how many requests were in
//! flight at once. Individual terms can be scripted to fail, stall, or break
//! the connection mid-response.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::pin::Pin;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::task::{Context as TaskContext, Poll};
use std::time::Duration;

use anyhow::Context;
use axum::body::Body as AxumBody;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::Router;
use bytes::Bytes;
use hyper::body::{Body, Frame};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

#[derive(Debug, serde::Deserialize)]
struct SearchParams {
    q: String,
}

/// How the stub answers one scripted term.
#[derive(Debug, Clone)]
enum Reply {
    Status(StatusCode),
    Delay(Duration),
    Broken,
}

#[derive(Clone)]
struct StubState {
    hits: Arc<Mutex<Vec<String>>>,
    in_flight: Arc<AtomicUsize>,
    peak_in_flight: Arc<AtomicUsize>,
    replies: Arc<HashMap<String, Reply>>,
    latency: Duration,
}

pub struct SearchStub {
    addr: SocketAddr,
    state: StubState,
    server: JoinHandle<()>,
}

#[derive(Default)]
pub struct SearchStubBuilder {
    latency: Duration,
    replies: HashMap<String, Reply>,
}

impl SearchStubBuilder {
    /// Hold every response for `latency` before answering.
    #[must_use]
    pub fn latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    /// Answer the exact decoded term `q` with `status` instead of 200.
    #[must_use]
    pub fn fail_query(mut self, q: impl Into<String>, status: StatusCode) -> Self {
        self.replies.insert(q.into(), Reply::Status(status));
        self
    }

    /// Hold answers to the exact decoded term `q` for `delay`, on top of
    /// the general latency.
    #[must_use]
    pub fn delay_query(mut self, q: impl Into<String>, delay: Duration) -> Self {
        self.replies.insert(q.into(), Reply::Delay(delay));
        self
    }

    /// Answer `q` with a 200 head whose body errors before any data, which
    /// makes the server drop the connection.
    #[must_use]
    pub fn break_query(mut self, q: impl Into<String>) -> Self {
        self.replies.insert(q.into(), Reply::Broken);
        self
    }

    pub async fn spawn(self) -> anyhow::Result<SearchStub> {
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .context("Failed to bind stub listener")?;
        let addr = listener
            .local_addr()
            .context("Failed to read stub address")?;
        let state = StubState {
            hits: Arc::new(Mutex::new(Vec::new())),
            in_flight: Arc::new(AtomicUsize::new(0)),
            peak_in_flight: Arc::new(AtomicUsize::new(0)),
            replies: Arc::new(self.replies),
            latency: self.latency,
        };
        let router = Router::new()
            .route("/", get(search))
            .with_state(state.clone());
        let server = tokio::spawn(async move {
            let _ = axum::serve(listener, router).await;
        });
        Ok(SearchStub {
            addr,
            state,
            server,
        })
    }
}

impl SearchStub {
    #[must_use]
    pub fn builder() -> SearchStubBuilder {
        SearchStubBuilder::default()
    }

    pub async fn spawn() -> anyhow::Result<Self> {
        Self::builder().spawn().await
    }

    #[must_use]
    pub fn host(&self) -> String {
        self.addr.ip().to_string()
    }

    #[must_use]
    pub fn port(&self) -> u16 {
        self.addr.port()
    }

    /// Every decoded `q` received so far, in arrival order.
    #[must_use]
    pub fn hits(&self) -> Vec<String> {
        self.state
            .hits
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    #[must_use]
    pub fn peak_in_flight(&self) -> usize {
        self.state.peak_in_flight.load(Ordering::Acquire)
    }
}

impl Drop for SearchStub {
    fn drop(&mut self) {
        self.server.abort();
    }
}

/// A local port nothing listens on.
pub async fn closed_port() -> anyhow::Result<u16> {
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .context("Failed to bind probe listener")?;
    let port = listener
        .local_addr()
        .context("Failed to read probe address")?
        .port();
    drop(listener);
    Ok(port)
}

async fn search(State(state): State<StubState>, Query(params): Query<SearchParams>) -> Response {
    let now = state.in_flight.fetch_add(1, Ordering::AcqRel) + 1;
    state.peak_in_flight.fetch_max(now, Ordering::AcqRel);
    state
        .hits
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
        .push(params.q.clone());
    let reply = state.replies.get(&params.q);
    let mut delay = state.latency;
    if let Some(Reply::Delay(extra)) = reply {
        delay += *extra;
    }
    if !delay.is_zero() {
        tokio::time::sleep(delay).await;
    }
    state.in_flight.fetch_sub(1, Ordering::AcqRel);
    match reply {
        Some(Reply::Status(status)) => {
            (*status, format!("no results for {}", params.q)).into_response()
        }
        Some(Reply::Broken) => (StatusCode::OK, AxumBody::new(BrokenBody)).into_response(),
        Some(Reply::Delay(_)) | None => {
            (StatusCode::OK, format!("results for {}", params.q)).into_response()
        }
    }
}

/// A body that fails on its first frame.
struct BrokenBody;

impl Body for BrokenBody {
    type Data = Bytes;
    type Error = std::io::Error;

    fn poll_frame(
        self: Pin<&mut Self>,
        _cx: &mut TaskContext<'_>,
    ) -> Poll<Option<Result<Frame<Bytes>, std::io::Error>>> {
        Poll::Ready(Some(Err(std::io::Error::new(
            std::io::ErrorKind::ConnectionAborted,
            "stub broke the response",
        ))))
    }
}
