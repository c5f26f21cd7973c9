use ringcast_protocol::ProtocolError;

/// Consecutive rounds without any observed event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuietCounter {
    count: u32,
    threshold: u32,
}

impl QuietCounter {
    pub fn new(threshold: u32) -> Result<Self, ProtocolError> {
        if threshold == 0 {
            return Err(ProtocolError::ZeroThreshold);
        }
        Ok(Self { count: 0, threshold })
    }

    /// Fold one closed round into the counter and return the new count.
    pub fn observe(&mut self, event_seen: bool) -> u32 {
        if event_seen {
            self.count = 0;
        } else {
            self.count = self.count.saturating_add(1);
        }
        self.count
    }

    pub fn count(&self) -> u32 {
        self.count
    }

    pub fn threshold(&self) -> u32 {
        self.threshold
    }

    pub fn reached(&self) -> bool {
        self.count >= self.threshold
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_threshold_rejected() {
        assert!(matches!(QuietCounter::new(0), Err(ProtocolError::ZeroThreshold)));
    }

    #[test]
    fn test_counts_quiet_rounds() {
        let mut counter = QuietCounter::new(3).unwrap();
        assert_eq!(counter.observe(false), 1);
        assert_eq!(counter.observe(false), 2);
        assert!(!counter.reached());
        assert_eq!(counter.observe(false), 3);
        assert!(counter.reached());
    }

    #[test]
    fn test_event_resets() {
        let mut counter = QuietCounter::new(3).unwrap();
        counter.observe(false);
        counter.observe(false);
        assert_eq!(counter.observe(true), 0);
        assert_eq!(counter.observe(false), 1);
    }
}
