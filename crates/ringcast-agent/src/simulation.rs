//! A whole ring inside one process, on in-memory transports.
//!
//! Every agent runs the same runtime as in a networked deployment. A
//! supervision deadline plays the part of the outside collaborator that stops
//! a stalled ring (e.g. after a token loss).

use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tokio_util::sync::CancellationToken;

use ringcast_network::{MemoryRing, TokenLoss};
use ringcast_protocol::{AgentId, RingTopology};
use ringcast_state::{Probability, RandomSource, RingParticipant, SeededSource};
use ringcast_termination::{RoundStats, TerminationCoordinator};

use crate::config::{AgentConfig, RingParameters};
use crate::runtime::{Agent, AgentReport};
use crate::AgentError;

pub const DEFAULT_SUPERVISION_DEADLINE: Duration = Duration::from_secs(60);

/// Builds the random source of each agent.
pub type SourceFactory = Box<dyn FnMut(AgentId) -> Box<dyn RandomSource> + Send>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SimulationOutcome {
    /// The leader detected termination and every agent shut down.
    Terminated,
    /// The deadline expired first and every agent was cancelled.
    SupervisionTimeout,
}

#[derive(Debug, Clone, Serialize)]
pub struct SimulationReport {
    pub outcome: SimulationOutcome,
    pub stats: RoundStats,
    pub total_events: u64,
    pub dropped_tokens: u64,
    /// Indexed by agent id.
    pub agents: Vec<AgentReport>,
}

pub struct Simulation {
    topology: RingTopology,
    quiet_threshold: u32,
    initial: Probability,
    config: AgentConfig,
    deadline: Duration,
    loss: Option<TokenLoss>,
    sources: SourceFactory,
}

impl Simulation {
    pub fn new(params: RingParameters, config: AgentConfig) -> Result<Self, AgentError> {
        let (topology, initial) = params.validate()?;
        config.validate_for_ring(topology.size())?;
        let seed = config.run.seed;
        Ok(Self {
            topology,
            quiet_threshold: params.quiet_threshold,
            initial,
            config,
            deadline: DEFAULT_SUPERVISION_DEADLINE,
            loss: None,
            sources: Box::new(move |agent| Box::new(SeededSource::for_agent(seed, agent))),
        })
    }

    pub fn with_deadline(mut self, deadline: Duration) -> Self {
        self.deadline = deadline;
        self
    }

    pub fn with_token_loss(mut self, loss: TokenLoss) -> Self {
        self.loss = Some(loss);
        self
    }

    pub fn with_sources(mut self, sources: SourceFactory) -> Self {
        self.sources = sources;
        self
    }

    pub async fn run(mut self) -> Result<SimulationReport, AgentError> {
        let size = self.topology.size();
        let supervision = CancellationToken::new();
        let ring = MemoryRing::new(self.topology, self.loss);
        let dropped = ring.drop_counter();
        let pacing = self.config.timing.pacing();

        tracing::info!(
            n = size,
            k = self.quiet_threshold,
            p0 = self.initial.value(),
            deadline_ms = self.deadline.as_millis() as u64,
            "Simulation starting"
        );

        let mut handles = Vec::with_capacity(size as usize);
        for (index, (link, channel)) in ring.into_parts().into_iter().enumerate() {
            let id = AgentId::new(index as u32);
            let participant = RingParticipant::new(
                id,
                self.topology,
                self.initial,
                pacing,
                (self.sources)(id),
            );
            let coordinator = if id.is_leader() {
                Some(TerminationCoordinator::new(size, self.quiet_threshold)?)
            } else {
                None
            };
            let agent = Agent::new(
                participant,
                coordinator,
                Arc::new(link),
                Arc::new(channel),
                self.config.timing.for_agent(id, size),
                supervision.child_token(),
            )?;
            handles.push(tokio::spawn(agent.run()));
        }

        let deadline = tokio::time::Instant::now() + self.deadline;
        let mut outcome = SimulationOutcome::Terminated;
        let mut results = Vec::with_capacity(handles.len());
        for mut handle in handles {
            let joined = if outcome == SimulationOutcome::SupervisionTimeout {
                handle.await
            } else {
                tokio::select! {
                    joined = &mut handle => joined,
                    _ = tokio::time::sleep_until(deadline) => {
                        tracing::warn!("Supervision deadline expired; stopping every agent");
                        outcome = SimulationOutcome::SupervisionTimeout;
                        supervision.cancel();
                        handle.await
                    }
                }
            };
            results.push(joined);
        }
        supervision.cancel();

        let mut agents = Vec::with_capacity(results.len());
        for result in results {
            agents.push(result??);
        }

        let stats = agents
            .first()
            .and_then(|leader| leader.stats)
            .unwrap_or_else(|| RoundStats::from_records(size, &[]));
        let total_events = agents.iter().map(|a| a.events_fired).sum();
        let report = SimulationReport {
            outcome,
            stats,
            total_events,
            dropped_tokens: dropped.load(Ordering::Relaxed),
            agents,
        };

        tracing::info!(
            outcome = ?report.outcome,
            rounds = report.stats.total_rounds,
            events = report.total_events,
            "Simulation finished"
        );
        Ok(report)
    }
}
