use ringcast_protocol::AgentId;
use thiserror::Error;

use crate::AgentPhase;

#[derive(Debug, Error)]
pub enum StateError {
    #[error("{agent} cannot {action} while {phase:?}")]
    InvalidTransition {
        agent: AgentId,
        phase: AgentPhase,
        action: &'static str,
    },
}
