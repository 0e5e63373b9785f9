//! Fan-out of one round of requests and the barrier that waits for all of them.

use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::Semaphore;
use tokio::task::JoinHandle;

use crate::client::HttpClient;
use crate::config::LoadConfig;
use crate::executor::{self, RequestOutcome};
use crate::query::{SearchRequest, SearchTarget};
use crate::statistics::RoundStatistics;

/// The in-flight tasks of one round.
///
/// Tasks start running as soon as they are launched. [`DispatchBatch::join`]
/// is the only way to get outcomes back and it does not return until every
/// launched task has terminated.
pub struct DispatchBatch {
    target: Arc<SearchTarget>,
    tasks: Vec<(SearchRequest, JoinHandle<RequestOutcome>)>,
}

impl DispatchBatch {
    #[must_use]
    pub fn with_capacity(target: Arc<SearchTarget>, capacity: usize) -> Self {
        Self {
            target,
            tasks: Vec::with_capacity(capacity),
        }
    }

    pub fn launch<F>(&mut self, request: SearchRequest, task: F)
    where
        F: Future<Output = RequestOutcome> + Send + 'static,
    {
        self.tasks.push((request, tokio::spawn(task)));
    }

    #[inline]
    #[must_use]
    pub fn launched(&self) -> usize {
        self.tasks.len()
    }

    /// One outcome per launched task. A task that panicked is reported as
    /// aborted against its own request.
    pub async fn join(self) -> Vec<RequestOutcome> {
        let mut outcomes = Vec::with_capacity(self.tasks.len());
        for (request, handle) in self.tasks {
            match handle.await {
                Ok(outcome) => outcomes.push(outcome),
                Err(e) => {
                    tracing::error!(query = request.query(), error = %e, "search task died");
                    outcomes.push(RequestOutcome::aborted(request, &self.target, e.to_string()));
                }
            }
        }
        outcomes
    }
}

#[derive(Debug)]
pub struct RoundReport {
    pub launched: usize,
    pub outcomes: Vec<RequestOutcome>,
    pub started: Instant,
    pub finished: Instant,
}

impl RoundReport {
    #[inline]
    #[must_use]
    pub fn elapsed(&self) -> Duration {
        self.finished.duration_since(self.started)
    }

    #[must_use]
    pub fn statistics(&self) -> RoundStatistics {
        RoundStatistics::from_outcomes(&self.outcomes, self.elapsed())
    }
}

#[derive(Clone)]
pub struct Dispatcher {
    client: HttpClient,
    target: Arc<SearchTarget>,
    request_timeout: Option<Duration>,
    limiter: Option<Arc<Semaphore>>,
}

impl Dispatcher {
    #[must_use]
    pub fn new(client: HttpClient, config: &LoadConfig) -> Self {
        Self {
            client,
            target: Arc::new(config.target.clone()),
            request_timeout: config.request_timeout,
            limiter: config
                .max_in_flight
                .map(|permits| Arc::new(Semaphore::new(permits))),
        }
    }

    /// Runs `replication` copies of every request concurrently and returns
    /// once all `replication * requests.len()` of them are done.
    pub async fn dispatch(&self, requests: &[SearchRequest], replication: usize) -> RoundReport {
        let started = Instant::now();
        let mut batch =
            DispatchBatch::with_capacity(self.target.clone(), replication * requests.len());
        for _ in 0..replication {
            for request in requests {
                batch.launch(request.clone(), self.task(request.clone()));
            }
        }
        let launched = batch.launched();
        tracing::info!(launched, "round launched");
        let outcomes = batch.join().await;
        let finished = Instant::now();
        tracing::info!(
            launched,
            succeeded = outcomes.iter().filter(|o| o.is_success()).count(),
            elapsed_ms = finished.duration_since(started).as_millis() as u64,
            "round joined"
        );
        RoundReport {
            launched,
            outcomes,
            started,
            finished,
        }
    }

    fn task(
        &self,
        request: SearchRequest,
    ) -> impl Future<Output = RequestOutcome> + Send + 'static {
        let client = self.client.clone();
        let target = self.target.clone();
        let limiter = self.limiter.clone();
        let timeout = self.request_timeout;
        async move {
            // Held until the request is done. The semaphore is never closed.
            let _permit = match limiter {
                Some(semaphore) => semaphore.acquire_owned().await.ok(),
                None => None,
            };
            executor::execute(&client, &target, request, timeout).await
        }
    }
}
