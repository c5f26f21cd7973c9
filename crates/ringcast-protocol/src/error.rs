use thiserror::Error;

#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("ring size must be at least 1")]
    EmptyRing,

    #[error("agent id {id} is outside the ring of {size} agents")]
    AgentOutOfRange { id: u32, size: u32 },

    #[error("probability {0} is outside [0, 1]")]
    InvalidProbability(f64),

    #[error("quiet-round threshold must be at least 1")]
    ZeroThreshold,

    #[error("malformed message: {0}")]
    MalformedMessage(String),
}
