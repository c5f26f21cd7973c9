//! Termination detection by consecutive quiet-round counting.
//!
//! The coordinator is driven once per token arrival at the leader:
//! - the very first possession only opens round 1;
//! - every later arrival closes the open round, folds its "event seen" flag
//!   into the quiet counter, and either opens the next round or decides to
//!   terminate.

use std::time::Instant;

use chrono::{DateTime, Utc};

use crate::{QuietCounter, RoundRecord, RoundStats, TerminationError};

/// What the leader does after a round has been closed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoundDecision {
    /// Keep circulating: process and forward the token.
    Continue,
    /// Broadcast TERMINATE and do not forward the token again.
    Terminate,
}

/// Outcome of closing one round.
#[derive(Debug, Clone, PartialEq)]
pub struct RoundClosure {
    pub record: RoundRecord,
    pub quiet_rounds: u32,
    pub decision: RoundDecision,
}

/// Result of handing a token arrival to the coordinator.
#[derive(Debug, Clone, PartialEq)]
pub enum TokenArrival {
    /// Initial possession: no round has elapsed yet; round 1 is now open.
    FirstPossession,
    Closed(RoundClosure),
}

#[derive(Debug, Clone, Copy)]
struct OpenRound {
    started: Instant,
    started_at: DateTime<Utc>,
}

/// Capability held only by the leader agent.
pub struct TerminationCoordinator {
    process_count: u32,
    quiet: QuietCounter,
    records: Vec<RoundRecord>,
    open: Option<OpenRound>,
    terminated: bool,
}

impl TerminationCoordinator {
    pub fn new(process_count: u32, quiet_threshold: u32) -> Result<Self, TerminationError> {
        Ok(Self {
            process_count,
            quiet: QuietCounter::new(quiet_threshold)?,
            records: Vec::new(),
            open: None,
            terminated: false,
        })
    }

    /// Handle the token arriving at the leader at `now`.
    ///
    /// `event_seen` is the "event seen this round" flag, already consumed by
    /// the caller, covering everything observed since the previous arrival.
    pub fn on_token_arrival(
        &mut self,
        now: Instant,
        event_seen: bool,
    ) -> Result<TokenArrival, TerminationError> {
        if self.terminated {
            return Err(TerminationError::AlreadyTerminated {
                rounds: self.rounds_completed(),
            });
        }

        let Some(open) = self.open.take() else {
            self.open_round(now);
            tracing::info!("Leader holds the token for the first time; round 1 opened");
            return Ok(TokenArrival::FirstPossession);
        };

        let record = RoundRecord {
            index: self.rounds_completed() + 1,
            started_at: open.started_at,
            duration: now.saturating_duration_since(open.started),
            eventful: event_seen,
        };
        self.records.push(record.clone());

        let quiet_rounds = self.quiet.observe(event_seen);
        if event_seen {
            tracing::info!(
                round = record.index,
                duration_ms = record.duration_ms(),
                "Round ended with an event; quiet count reset"
            );
        } else {
            tracing::info!(
                round = record.index,
                duration_ms = record.duration_ms(),
                quiet = quiet_rounds,
                threshold = self.quiet.threshold(),
                "Round ended quietly ({}/{})",
                quiet_rounds,
                self.quiet.threshold()
            );
        }

        let decision = if self.quiet.reached() {
            self.terminated = true;
            tracing::info!(
                rounds = self.rounds_completed(),
                quiet = quiet_rounds,
                "Termination condition met"
            );
            RoundDecision::Terminate
        } else {
            self.open_round(now);
            RoundDecision::Continue
        };

        Ok(TokenArrival::Closed(RoundClosure {
            record,
            quiet_rounds,
            decision,
        }))
    }

    pub fn rounds_completed(&self) -> u64 {
        self.records.len() as u64
    }

    pub fn quiet_rounds(&self) -> u32 {
        self.quiet.count()
    }

    pub fn records(&self) -> &[RoundRecord] {
        &self.records
    }

    pub fn is_terminated(&self) -> bool {
        self.terminated
    }

    pub fn stats(&self) -> RoundStats {
        RoundStats::from_records(self.process_count, &self.records)
    }

    fn open_round(&mut self, now: Instant) {
        self.open = Some(OpenRound {
            started: now,
            started_at: Utc::now(),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn closure(arrival: TokenArrival) -> RoundClosure {
        match arrival {
            TokenArrival::Closed(closure) => closure,
            TokenArrival::FirstPossession => panic!("expected a closed round"),
        }
    }

    #[test]
    fn test_first_possession_closes_nothing() {
        let mut coordinator = TerminationCoordinator::new(3, 2).unwrap();
        let arrival = coordinator.on_token_arrival(Instant::now(), true).unwrap();
        assert_eq!(arrival, TokenArrival::FirstPossession);
        assert_eq!(coordinator.rounds_completed(), 0);
        assert_eq!(coordinator.quiet_rounds(), 0);
    }

    #[test]
    fn test_round_duration_measured_between_arrivals() {
        let mut coordinator = TerminationCoordinator::new(2, 5).unwrap();
        let t0 = Instant::now();
        coordinator.on_token_arrival(t0, false).unwrap();
        let closed = closure(
            coordinator
                .on_token_arrival(t0 + Duration::from_millis(40), false)
                .unwrap(),
        );
        assert_eq!(closed.record.index, 1);
        assert_eq!(closed.record.duration, Duration::from_millis(40));

        let closed = closure(
            coordinator
                .on_token_arrival(t0 + Duration::from_millis(100), false)
                .unwrap(),
        );
        assert_eq!(closed.record.index, 2);
        assert_eq!(closed.record.duration, Duration::from_millis(60));
    }

    #[test]
    fn test_terminates_on_threshold() {
        let mut coordinator = TerminationCoordinator::new(1, 1).unwrap();
        let t0 = Instant::now();
        coordinator.on_token_arrival(t0, false).unwrap();
        let closed = closure(coordinator.on_token_arrival(t0, false).unwrap());
        assert_eq!(closed.decision, RoundDecision::Terminate);
        assert!(coordinator.is_terminated());
        assert!(matches!(
            coordinator.on_token_arrival(t0, false),
            Err(TerminationError::AlreadyTerminated { rounds: 1 })
        ));
    }

    #[test]
    fn test_clock_going_backwards_saturates_to_zero() {
        let mut coordinator = TerminationCoordinator::new(2, 3).unwrap();
        let t1 = Instant::now() + Duration::from_secs(1);
        coordinator.on_token_arrival(t1, false).unwrap();
        let closed = closure(coordinator.on_token_arrival(Instant::now(), false).unwrap());
        assert_eq!(closed.record.duration, Duration::ZERO);
    }
}
