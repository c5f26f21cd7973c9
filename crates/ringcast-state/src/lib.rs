//! ringcast state - the per-agent token state machine.
//!
//! Everything here is free of I/O: the agent runtime feeds token arrivals in
//! and carries the resulting sends and broadcasts out to the network.

pub mod error;
pub mod pacing;
pub mod participant;
pub mod probability;
pub mod random;
pub mod signal;

pub use error::StateError;
pub use pacing::Pacing;
pub use participant::{AgentPhase, HoldOutcome, RingParticipant};
pub use probability::Probability;
pub use random::{RandomSource, ScriptedSource, SeededSource};
pub use signal::RoundSignal;
