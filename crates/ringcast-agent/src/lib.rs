//! ringcast agent - runtime for one ring member.
//!
//! - [`runtime`]: main loop (token possession) plus listener task
//! - [`process`]: one agent per process on UDP and multicast
//! - [`simulation`]: a whole ring in one process on in-memory transports
//! - [`config`]: TOML configuration with compiled defaults

pub mod config;
pub mod error;
pub mod listener;
pub mod process;
pub mod runtime;
pub mod simulation;

pub use config::{AgentConfig, AgentTiming, NetworkConfig, RingParameters, RunConfig, TimingConfig};
pub use error::AgentError;
pub use listener::Listener;
pub use process::run_process;
pub use runtime::{Agent, AgentReport};
pub use simulation::{
    Simulation, SimulationOutcome, SimulationReport, SourceFactory, DEFAULT_SUPERVISION_DEADLINE,
};
