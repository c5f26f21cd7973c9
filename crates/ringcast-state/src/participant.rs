//! The ring participant: behavior shared by every agent, leader included.
//!
//! Lifecycle:
//! 1. `accept_token()` - `WaitingForToken -> HoldingToken`
//! 2. `process_token()` - event trial, probability decay, pacing delay
//! 3. `release_token()` - `HoldingToken -> WaitingForToken`, yields the successor
//! 4. `terminate()` - from any phase to `Terminated`
//!
//! Round bookkeeping is not done here; the leader composes a
//! termination coordinator next to its participant.

use std::time::Duration;

use ringcast_protocol::{AgentId, RingTopology};

use crate::{Pacing, Probability, RandomSource, StateError};

/// Where an agent stands with respect to the token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AgentPhase {
    WaitingForToken,
    HoldingToken,
    Terminated,
}

/// Result of processing one token hold.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HoldOutcome {
    /// Whether the Bernoulli trial triggered an event.
    pub fired: bool,
    /// Probability the trial was run with (before decay).
    pub probability: f64,
    /// Processing delay to apply before forwarding the token.
    pub delay: Duration,
}

pub struct RingParticipant {
    id: AgentId,
    successor: AgentId,
    probability: Probability,
    phase: AgentPhase,
    pacing: Pacing,
    random: Box<dyn RandomSource>,
    /// Completed holds (trial + decay), i.e. the number of decays applied.
    holds: u64,
    events_fired: u64,
}

impl RingParticipant {
    /// The leader starts out holding the token; everybody else waits for it.
    pub fn new(
        id: AgentId,
        topology: RingTopology,
        initial: Probability,
        pacing: Pacing,
        random: Box<dyn RandomSource>,
    ) -> Self {
        let phase = if id.is_leader() {
            AgentPhase::HoldingToken
        } else {
            AgentPhase::WaitingForToken
        };
        Self {
            id,
            successor: topology.successor(id),
            probability: initial,
            phase,
            pacing,
            random,
            holds: 0,
            events_fired: 0,
        }
    }

    pub fn id(&self) -> AgentId {
        self.id
    }

    pub fn successor(&self) -> AgentId {
        self.successor
    }

    pub fn phase(&self) -> AgentPhase {
        self.phase
    }

    pub fn probability(&self) -> f64 {
        self.probability.value()
    }

    pub fn holds(&self) -> u64 {
        self.holds
    }

    pub fn events_fired(&self) -> u64 {
        self.events_fired
    }

    pub fn is_holding(&self) -> bool {
        self.phase == AgentPhase::HoldingToken
    }

    pub fn is_terminated(&self) -> bool {
        self.phase == AgentPhase::Terminated
    }

    pub fn accept_token(&mut self) -> Result<(), StateError> {
        self.expect_phase(AgentPhase::WaitingForToken, "accept the token")?;
        self.phase = AgentPhase::HoldingToken;
        tracing::debug!(agent = %self.id, "Token acquired");
        Ok(())
    }

    /// Run the event trial, decay the probability and draw the pacing delay.
    pub fn process_token(&mut self) -> Result<HoldOutcome, StateError> {
        self.expect_phase(AgentPhase::HoldingToken, "process the token")?;

        let probability = self.probability.value();
        let fired = self.probability.trial(self.random.as_mut());
        if fired {
            self.events_fired += 1;
        }
        self.probability.decay();
        self.holds += 1;

        let delay = self.pacing.delay(self.random.as_mut());

        tracing::debug!(
            agent = %self.id,
            p = probability,
            fired,
            next_p = self.probability.value(),
            "Token processed"
        );

        Ok(HoldOutcome { fired, probability, delay })
    }

    /// Give up the token; the caller sends it to the returned successor.
    pub fn release_token(&mut self) -> Result<AgentId, StateError> {
        self.expect_phase(AgentPhase::HoldingToken, "release the token")?;
        self.phase = AgentPhase::WaitingForToken;
        Ok(self.successor)
    }

    pub fn terminate(&mut self) {
        if self.phase != AgentPhase::Terminated {
            tracing::debug!(agent = %self.id, from = ?self.phase, "Participant terminated");
        }
        self.phase = AgentPhase::Terminated;
    }

    fn expect_phase(&self, expected: AgentPhase, action: &'static str) -> Result<(), StateError> {
        if self.phase != expected {
            return Err(StateError::InvalidTransition {
                agent: self.id,
                phase: self.phase,
                action,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ScriptedSource;

    fn participant(id: u32, n: u32, p0: f64, script: ScriptedSource) -> RingParticipant {
        RingParticipant::new(
            AgentId::new(id),
            RingTopology::new(n).unwrap(),
            Probability::new(p0).unwrap(),
            Pacing::immediate(),
            Box::new(script),
        )
    }

    #[test]
    fn test_initial_phases() {
        let leader = participant(0, 3, 0.5, ScriptedSource::constant(0.9));
        let follower = participant(2, 3, 0.5, ScriptedSource::constant(0.9));
        assert_eq!(leader.phase(), AgentPhase::HoldingToken);
        assert_eq!(follower.phase(), AgentPhase::WaitingForToken);
        assert_eq!(follower.successor(), AgentId::new(0));
    }

    #[test]
    fn test_full_hold_cycle() {
        let mut agent = participant(1, 3, 1.0, ScriptedSource::constant(0.3));
        agent.accept_token().unwrap();

        let outcome = agent.process_token().unwrap();
        assert!(outcome.fired);
        assert_eq!(outcome.probability, 1.0);
        assert_eq!(outcome.delay, Duration::ZERO);
        assert_eq!(agent.probability(), 0.5);

        assert_eq!(agent.release_token().unwrap(), AgentId::new(2));
        assert_eq!(agent.phase(), AgentPhase::WaitingForToken);
        assert_eq!(agent.holds(), 1);
        assert_eq!(agent.events_fired(), 1);
    }

    #[test]
    fn test_cannot_accept_twice() {
        let mut agent = participant(1, 2, 0.5, ScriptedSource::constant(0.9));
        agent.accept_token().unwrap();
        assert!(matches!(
            agent.accept_token(),
            Err(StateError::InvalidTransition { phase: AgentPhase::HoldingToken, .. })
        ));
    }

    #[test]
    fn test_cannot_process_without_token() {
        let mut agent = participant(1, 2, 0.5, ScriptedSource::constant(0.9));
        assert!(agent.process_token().is_err());
        assert!(agent.release_token().is_err());
    }

    #[test]
    fn test_terminated_is_final() {
        let mut agent = participant(0, 2, 0.5, ScriptedSource::constant(0.9));
        agent.terminate();
        assert!(agent.is_terminated());
        assert!(agent.process_token().is_err());
        assert!(agent.accept_token().is_err());
        agent.terminate();
        assert!(agent.is_terminated());
    }

    #[test]
    fn test_decay_law_over_many_holds() {
        let p0 = 0.8;
        let mut agent = participant(0, 1, p0, ScriptedSource::constant(0.99));
        for r in 1..=64u32 {
            agent.process_token().unwrap();
            agent.release_token().unwrap();
            agent.accept_token().unwrap();
            assert_eq!(agent.probability(), Probability::after_holds(p0, r), "after {r} holds");
        }
    }
}
