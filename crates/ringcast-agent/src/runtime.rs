//! The agent runtime: one main loop plus one listener task.
//!
//! Main loop, per token possession:
//! 1. leader only: close the open round, maybe terminate
//! 2. Bernoulli trial; on success log and broadcast EVENT
//! 3. decay, pacing delay
//! 4. forward the token and wait for it to come back
//!
//! Every wait races the agent's cancellation token, so TERMINATE (seen by the
//! listener) or an outside stop is observed within one poll interval.

use std::sync::Arc;
use std::time::{Duration, Instant};

use serde::Serialize;
use tokio_util::sync::CancellationToken;

use ringcast_network::{EventChannel, Received, TokenLink};
use ringcast_protocol::{AgentId, EventNotification, GroupNotice, EVENT_MARKER};
use ringcast_state::{RingParticipant, RoundSignal};
use ringcast_termination::{RoundDecision, RoundStats, TerminationCoordinator, TokenArrival};

use crate::config::AgentTiming;
use crate::listener::Listener;
use crate::AgentError;

/// What an agent did over its lifetime.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AgentReport {
    pub agent: AgentId,
    pub holds: u64,
    pub events_fired: u64,
    pub final_probability: f64,
    /// Leader only.
    pub stats: Option<RoundStats>,
}

pub struct Agent {
    participant: RingParticipant,
    coordinator: Option<TerminationCoordinator>,
    link: Arc<dyn TokenLink>,
    channel: Arc<dyn EventChannel>,
    signal: RoundSignal,
    timing: AgentTiming,
    cancel: CancellationToken,
}

impl Agent {
    /// The coordinator must be present for the leader and absent otherwise.
    pub fn new(
        participant: RingParticipant,
        coordinator: Option<TerminationCoordinator>,
        link: Arc<dyn TokenLink>,
        channel: Arc<dyn EventChannel>,
        timing: AgentTiming,
        cancel: CancellationToken,
    ) -> Result<Self, AgentError> {
        let id = participant.id();
        if id.is_leader() != coordinator.is_some() {
            return Err(AgentError::Config(format!(
                "{id}: termination coordinator must be held by the leader only"
            )));
        }
        Ok(Self {
            participant,
            coordinator,
            link,
            channel,
            signal: RoundSignal::new(),
            timing,
            cancel,
        })
    }

    pub fn id(&self) -> AgentId {
        self.participant.id()
    }

    /// Run until termination or cancellation, then release both endpoints.
    pub async fn run(mut self) -> Result<AgentReport, AgentError> {
        let id = self.id();
        let listener = Listener::new(
            id,
            self.channel.clone(),
            self.signal.clone(),
            self.cancel.clone(),
            self.timing.poll_timeout,
        );
        let listener = tokio::spawn(listener.run());

        tracing::info!(agent = %id, successor = %self.participant.successor(), "Agent started");
        let outcome = self.main_loop().await;

        self.cancel.cancel();
        let listened = listener.await;
        self.participant.terminate();
        self.link.close();
        self.channel.close();

        if let Err(e) = &outcome {
            tracing::error!(agent = %id, error = %e, "Agent stopped on error");
        }
        outcome?;
        listened??;

        tracing::info!(
            agent = %id,
            holds = self.participant.holds(),
            events = self.participant.events_fired(),
            "Agent terminated"
        );
        Ok(AgentReport {
            agent: id,
            holds: self.participant.holds(),
            events_fired: self.participant.events_fired(),
            final_probability: self.participant.probability(),
            stats: self.coordinator.as_ref().map(TerminationCoordinator::stats),
        })
    }

    async fn main_loop(&mut self) -> Result<(), AgentError> {
        if self.participant.is_holding() && !self.timing.leader_settle.is_zero() {
            tracing::info!(
                agent = %self.id(),
                settle_ms = self.timing.leader_settle.as_millis() as u64,
                "Waiting for the ring to come up"
            );
            if !self.pause(self.timing.leader_settle).await {
                return Ok(());
            }
        }

        loop {
            if !self.participant.is_holding() {
                if !self.wait_for_token().await? {
                    return Ok(());
                }
                self.participant.accept_token()?;
            }

            if self.close_round().await? == RoundDecision::Terminate {
                self.announce_termination().await;
                return Ok(());
            }
            if self.cancel.is_cancelled() {
                return Ok(());
            }

            if !self.hold_and_forward().await? {
                return Ok(());
            }
        }
    }

    /// Leader bookkeeping on token arrival. Followers always continue.
    async fn close_round(&mut self) -> Result<RoundDecision, AgentError> {
        let Some(mut coordinator) = self.coordinator.take() else {
            return Ok(RoundDecision::Continue);
        };

        let arrived = Instant::now();
        let settled =
            self.timing.round_settle.is_zero() || self.pause(self.timing.round_settle).await;
        // Cancelled during the settle: the main loop notices before holding.
        let arrival = settled.then(|| coordinator.on_token_arrival(arrived, self.signal.take()));
        self.coordinator = Some(coordinator);

        match arrival.transpose()? {
            None | Some(TokenArrival::FirstPossession) => Ok(RoundDecision::Continue),
            Some(TokenArrival::Closed(closure)) => Ok(closure.decision),
        }
    }

    /// Trial, decay, delay, forward. Returns `false` if cancelled while holding.
    async fn hold_and_forward(&mut self) -> Result<bool, AgentError> {
        let id = self.id();
        let outcome = self.participant.process_token()?;

        if outcome.fired {
            tracing::info!(agent = %id, p = outcome.probability, "{id}: {EVENT_MARKER} (p={:.6})", outcome.probability);
            // The listener skips our own notice.
            self.signal.mark();
            let notice = GroupNotice::Event(EventNotification { origin: id });
            if let Err(e) = self.channel.broadcast(notice).await {
                tracing::warn!(agent = %id, error = %e, "EVENT broadcast failed");
            }
        }

        if !outcome.delay.is_zero() && !self.pause(outcome.delay).await {
            return Ok(false);
        }
        if self.cancel.is_cancelled() {
            return Ok(false);
        }

        let successor = self.participant.release_token()?;
        match self.link.send_token().await {
            Ok(()) => tracing::debug!(agent = %id, to = %successor, "Token forwarded"),
            Err(e) => {
                tracing::warn!(agent = %id, to = %successor, error = %e, "Token send failed; token lost")
            }
        }
        Ok(true)
    }

    /// Block until the token arrives (`true`) or the agent is cancelled (`false`).
    async fn wait_for_token(&self) -> Result<bool, AgentError> {
        loop {
            let received = tokio::select! {
                biased;
                _ = self.cancel.cancelled() => return Ok(false),
                received = self.link.receive_token(self.timing.poll_timeout) => received?,
            };
            if let Received::Message(_) = received {
                return Ok(true);
            }
        }
    }

    async fn announce_termination(&mut self) {
        let id = self.id();
        if let Err(e) = self.channel.broadcast(GroupNotice::Terminate).await {
            tracing::warn!(agent = %id, error = %e, "TERMINATE broadcast failed");
        }
        tracing::info!(agent = %id, "TERMINATE broadcast; token retired");
        self.participant.terminate();
        // Not raced against cancellation: our own TERMINATE cancels this agent
        // as soon as it loops back, and the ring is finished either way.
        tokio::time::sleep(self.timing.terminate_linger).await;
    }

    /// Sleep for `duration` unless cancelled first. Returns `false` on cancellation.
    async fn pause(&self, duration: Duration) -> bool {
        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => false,
            _ = tokio::time::sleep(duration) => true,
        }
    }
}
