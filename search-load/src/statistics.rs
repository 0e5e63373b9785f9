use std::fmt;
use std::time::Duration;

use crate::executor::RequestOutcome;

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct RoundStatistics {
    pub requests: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub min_rtt_us: u128,
    pub mean_rtt_us: f64,
    pub max_rtt_us: u128,
    pub wall_time: Duration,
}

impl RoundStatistics {
    /// Latency over every outcome, failed ones included.
    #[must_use]
    pub fn from_outcomes(outcomes: &[RequestOutcome], wall_time: Duration) -> Self {
        let mut min = u128::MAX;
        let mut max = u128::MIN;
        let mut total = 0;
        let mut succeeded = 0;
        for outcome in outcomes {
            update_stats(outcome.latency.as_micros(), &mut min, &mut max, &mut total);
            if outcome.is_success() {
                succeeded += 1;
            }
        }
        let requests = outcomes.len();
        if requests == 0 {
            min = 0;
        }
        let mean = if requests == 0 {
            0.0
        } else {
            total as f64 / requests as f64
        };
        Self {
            requests,
            succeeded,
            failed: requests - succeeded,
            min_rtt_us: min,
            mean_rtt_us: mean,
            max_rtt_us: max,
            wall_time,
        }
    }
}

impl fmt::Display for RoundStatistics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "\
Results:
    requests            [total, ok, failed] = [{}, {}, {}]
    rtt my s            [min, mean, max]    = [{}, {:.2}, {}]
    round wall time                         = {:.2?}",
            self.requests,
            self.succeeded,
            self.failed,
            self.min_rtt_us,
            self.mean_rtt_us,
            self.max_rtt_us,
            self.wall_time
        )
    }
}

fn update_stats(cur: u128, min: &mut u128, max: &mut u128, total: &mut u128) {
    if cur < *min {
        *min = cur;
    }
    if cur > *max {
        *max = cur;
    }
    *total += cur;
}
