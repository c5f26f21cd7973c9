//! Static ring topology: every agent forwards the token to `(id + 1) mod N`.

use crate::{AgentId, ProtocolError};

/// Successor of `id` in a ring of `n` agents.
///
/// A ring of size zero has no successors; `n == 0` is treated as a ring of one.
pub fn successor(id: u32, n: u32) -> u32 {
    let n = u64::from(n.max(1));
    ((u64::from(id) + 1) % n) as u32
}

/// A fixed-size ring of agents `0..size`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RingTopology {
    size: u32,
}

impl RingTopology {
    pub fn new(size: u32) -> Result<Self, ProtocolError> {
        if size == 0 {
            return Err(ProtocolError::EmptyRing);
        }
        Ok(Self { size })
    }

    pub fn size(&self) -> u32 {
        self.size
    }

    /// Check that `id` names a member of this ring.
    pub fn member(&self, id: u32) -> Result<AgentId, ProtocolError> {
        if id >= self.size {
            return Err(ProtocolError::AgentOutOfRange { id, size: self.size });
        }
        Ok(AgentId::new(id))
    }

    pub fn successor(&self, id: AgentId) -> AgentId {
        AgentId::new(successor(id.as_u32(), self.size))
    }

    pub fn predecessor(&self, id: AgentId) -> AgentId {
        let size = u64::from(self.size);
        AgentId::new(((u64::from(id.as_u32()) + size - 1) % size) as u32)
    }

    /// One full traversal of the token starting at `start`: `start`,
    /// `start + 1`, ... wrapping around, `size` agents in total.
    pub fn traversal(&self, start: AgentId) -> impl Iterator<Item = AgentId> {
        let ring = *self;
        let mut current = start;
        (0..ring.size).map(move |_| {
            let visited = current;
            current = ring.successor(current);
            visited
        })
    }
}
