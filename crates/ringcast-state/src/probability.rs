use ringcast_protocol::{ProtocolError, EPSILON_PROBABILITY};

use crate::RandomSource;

/// Event probability owned by an agent. Halved after every token hold and
/// never allowed below [`EPSILON_PROBABILITY`] once it has decayed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Probability(f64);

impl Probability {
    pub fn new(p: f64) -> Result<Self, ProtocolError> {
        if !(0.0..=1.0).contains(&p) {
            return Err(ProtocolError::InvalidProbability(p));
        }
        Ok(Self(p))
    }

    pub fn value(&self) -> f64 {
        self.0
    }

    /// `p := max(p / 2, epsilon)`
    pub fn decay(&mut self) {
        self.0 = (self.0 / 2.0).max(EPSILON_PROBABILITY);
    }

    /// Bernoulli trial: succeeds with probability `p`.
    pub fn trial(&self, source: &mut dyn RandomSource) -> bool {
        source.next_unit() < self.0
    }

    /// Closed form of `holds` decays applied to `initial`.
    pub fn after_holds(initial: f64, holds: u32) -> f64 {
        if holds == 0 {
            return initial;
        }
        let halvings = i32::try_from(holds).unwrap_or(i32::MAX);
        (initial * 0.5_f64.powi(halvings)).max(EPSILON_PROBABILITY)
    }
}
