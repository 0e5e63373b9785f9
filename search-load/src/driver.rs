//! Cold round, pause, warm round.
//!
//! The same request slice is handed to both rounds, so the warm round asks for
//! byte-for-byte what the cold round asked for. The pause only gives the server
//! time to finish filling its cache; nothing here knows about caching.

use std::fmt;
use std::sync::Arc;

use tracing::Instrument;

use crate::config::LoadConfig;
use crate::dispatch::{Dispatcher, RoundReport};
use crate::query::SearchRequest;

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Phase {
    Cold,
    Warm,
}

impl Phase {
    fn banner(self, clients: usize) -> String {
        match self {
            Self::Cold => {
                format!("First requests, expecting data from the API for {clients} clients:")
            }
            Self::Warm => {
                format!("\nSending requests again, expecting data from the cache for {clients} clients:")
            }
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Cold => f.write_str("cold"),
            Self::Warm => f.write_str("warm"),
        }
    }
}

#[derive(Debug)]
pub struct DemonstrationReport {
    pub requests: Arc<[SearchRequest]>,
    pub cold: RoundReport,
    pub warm: RoundReport,
}

pub async fn run_demonstration(
    dispatcher: &Dispatcher,
    requests: Arc<[SearchRequest]>,
    config: &LoadConfig,
) -> DemonstrationReport {
    let cold = run_round(dispatcher, Phase::Cold, &requests, config.replication).await;
    tokio::time::sleep(config.round_delay).await;
    let warm = run_round(dispatcher, Phase::Warm, &requests, config.replication).await;
    DemonstrationReport {
        requests,
        cold,
        warm,
    }
}

async fn run_round(
    dispatcher: &Dispatcher,
    phase: Phase,
    requests: &[SearchRequest],
    replication: usize,
) -> RoundReport {
    println!("{}", phase.banner(replication));
    let report = dispatcher
        .dispatch(requests, replication)
        .instrument(tracing::info_span!("round", %phase))
        .await;
    println!("{}", report.statistics());
    report
}
