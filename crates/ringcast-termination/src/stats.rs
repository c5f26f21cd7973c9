//! Aggregate round statistics and the leader's summary line.
//!
//! Line format (one line, no spaces):
//!   `DATA_OUTPUT:n_processes=3,total_rounds=12,min_round_time_ms=301.22,avg_round_time_ms=612.40,max_round_time_ms=901.03`

use serde::{Deserialize, Serialize};

use ringcast_protocol::SUMMARY_PREFIX;

use crate::{RoundRecord, TerminationError};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RoundStats {
    pub process_count: u32,
    pub total_rounds: u64,
    pub min_round_ms: f64,
    pub avg_round_ms: f64,
    pub max_round_ms: f64,
}

impl RoundStats {
    /// Aggregate over `records`; all durations are zero when nothing was recorded.
    pub fn from_records(process_count: u32, records: &[RoundRecord]) -> Self {
        if records.is_empty() {
            return Self {
                process_count,
                total_rounds: 0,
                min_round_ms: 0.0,
                avg_round_ms: 0.0,
                max_round_ms: 0.0,
            };
        }

        let durations: Vec<f64> = records.iter().map(RoundRecord::duration_ms).collect();
        let min = durations.iter().copied().fold(f64::INFINITY, f64::min);
        let max = durations.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let avg = durations.iter().sum::<f64>() / durations.len() as f64;

        Self {
            process_count,
            total_rounds: records.len() as u64,
            min_round_ms: min,
            // Summation error must not push the mean outside [min, max].
            avg_round_ms: avg.clamp(min, max),
            max_round_ms: max,
        }
    }

    /// The machine-parsable line the leader prints on shutdown.
    pub fn summary_line(&self) -> String {
        self.to_string()
    }
}

impl std::fmt::Display for RoundStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{SUMMARY_PREFIX}n_processes={},total_rounds={},min_round_time_ms={:.2},avg_round_time_ms={:.2},max_round_time_ms={:.2}",
            self.process_count,
            self.total_rounds,
            self.min_round_ms,
            self.avg_round_ms,
            self.max_round_ms
        )
    }
}

impl std::str::FromStr for RoundStats {
    type Err = TerminationError;

    /// Accepts the summary line anywhere in `s`, so log prefixes are tolerated.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let start = s
            .find(SUMMARY_PREFIX)
            .ok_or_else(|| TerminationError::MalformedSummary(format!("missing {SUMMARY_PREFIX}")))?;
        let body = s[start + SUMMARY_PREFIX.len()..].trim();

        let fields: std::collections::HashMap<&str, &str> = body
            .split(',')
            .filter_map(|kv| kv.split_once('='))
            .collect();

        fn field<T: std::str::FromStr>(
            fields: &std::collections::HashMap<&str, &str>,
            key: &str,
        ) -> Result<T, TerminationError> {
            let raw = fields
                .get(key)
                .ok_or_else(|| TerminationError::MalformedSummary(format!("missing '{key}'")))?;
            raw.parse::<T>()
                .map_err(|_| TerminationError::MalformedSummary(format!("invalid '{key}={raw}'")))
        }

        Ok(Self {
            process_count: field(&fields, "n_processes")?,
            total_rounds: field(&fields, "total_rounds")?,
            min_round_ms: field(&fields, "min_round_time_ms")?,
            avg_round_ms: field(&fields, "avg_round_time_ms")?,
            max_round_ms: field(&fields, "max_round_time_ms")?,
        })
    }
}
