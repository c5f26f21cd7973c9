use serde::{Deserialize, Serialize};

use crate::constants::LEADER_ID;

/// Position of an agent in the ring, in `[0, N)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct AgentId(u32);

impl AgentId {
    pub const LEADER: AgentId = AgentId(LEADER_ID);

    pub fn new(id: u32) -> Self {
        Self(id)
    }

    pub fn as_u32(&self) -> u32 {
        self.0
    }

    pub fn index(&self) -> usize {
        self.0 as usize
    }

    pub fn is_leader(&self) -> bool {
        self.0 == LEADER_ID
    }
}

impl std::fmt::Display for AgentId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "P{}", self.0)
    }
}

impl From<u32> for AgentId {
    fn from(id: u32) -> Self {
        Self(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_leader_is_agent_zero() {
        assert!(AgentId::LEADER.is_leader());
        assert!(AgentId::new(0).is_leader());
        assert!(!AgentId::new(3).is_leader());
    }

    #[test]
    fn test_display_uses_process_prefix() {
        assert_eq!(AgentId::new(7).to_string(), "P7");
    }
}
