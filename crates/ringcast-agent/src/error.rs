use std::io;
use std::path::PathBuf;

use thiserror::Error;

use ringcast_network::NetworkError;
use ringcast_protocol::ProtocolError;
use ringcast_state::StateError;
use ringcast_termination::TerminationError;

#[derive(Debug, Error)]
pub enum AgentError {
    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("cannot read config file {path}: {source}")]
    ConfigRead { path: PathBuf, source: io::Error },

    #[error("cannot parse config file {path}: {source}")]
    ConfigParse { path: PathBuf, source: toml::de::Error },

    #[error("cannot resolve {host}:{port}: {reason}")]
    AddressResolution { host: String, port: u16, reason: String },

    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    #[error(transparent)]
    Network(#[from] NetworkError),

    #[error(transparent)]
    State(#[from] StateError),

    #[error(transparent)]
    Termination(#[from] TerminationError),

    #[error("agent task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}
