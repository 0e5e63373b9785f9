use std::time::Duration;

use crate::error::InputError;
use crate::query::SearchTarget;

/// Simulated clients per round.
pub const DEFAULT_REPLICATION: usize = 50;
/// Pause between the cold and the warm round.
pub const DEFAULT_ROUND_DELAY: Duration = Duration::from_secs(2);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadConfig {
    pub target: SearchTarget,
    pub replication: usize,
    pub round_delay: Duration,
    /// Applied to every request alike. `None` waits indefinitely.
    pub request_timeout: Option<Duration>,
    /// `None` starts every request of a round at once.
    pub max_in_flight: Option<usize>,
}

impl Default for LoadConfig {
    fn default() -> Self {
        Self {
            target: SearchTarget::default(),
            replication: DEFAULT_REPLICATION,
            round_delay: DEFAULT_ROUND_DELAY,
            request_timeout: None,
            max_in_flight: None,
        }
    }
}

impl LoadConfig {
    pub fn validate(&self) -> Result<(), InputError> {
        if self.replication == 0 {
            return Err(InputError::ZeroReplication);
        }
        if self.max_in_flight == Some(0) {
            return Err(InputError::ZeroConcurrencyLimit);
        }
        Ok(())
    }
}
