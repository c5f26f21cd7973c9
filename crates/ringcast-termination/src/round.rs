use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One completed traversal of the token, as measured by the leader.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoundRecord {
    /// 1-based round number.
    pub index: u64,
    pub started_at: DateTime<Utc>,
    pub duration: Duration,
    /// Whether any event was observed during the round.
    pub eventful: bool,
}

impl RoundRecord {
    pub fn duration_ms(&self) -> f64 {
        self.duration.as_secs_f64() * 1000.0
    }
}
