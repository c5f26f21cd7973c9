use ringcast_protocol::ProtocolError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TerminationError {
    #[error("termination already decided after {rounds} rounds")]
    AlreadyTerminated { rounds: u64 },

    #[error("malformed summary line: {0}")]
    MalformedSummary(String),

    #[error(transparent)]
    Protocol(#[from] ProtocolError),
}
