use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// "Event seen this round" flag shared between an agent's listener and its
/// main loop. Set with [`mark`](Self::mark), consumed with an atomic exchange
/// in [`take`](Self::take).
#[derive(Debug, Clone, Default)]
pub struct RoundSignal(Arc<AtomicBool>);

impl RoundSignal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mark(&self) {
        self.0.store(true, Ordering::Release);
    }

    /// Read and reset in one step.
    pub fn take(&self) -> bool {
        self.0.swap(false, Ordering::AcqRel)
    }

    pub fn is_marked(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_take_resets() {
        let signal = RoundSignal::new();
        assert!(!signal.take());
        signal.mark();
        assert!(signal.is_marked());
        assert!(signal.take());
        assert!(!signal.take());
    }

    #[test]
    fn test_clones_share_the_flag() {
        let listener_side = RoundSignal::new();
        let main_side = listener_side.clone();
        listener_side.mark();
        assert!(main_side.take());
        assert!(!listener_side.is_marked());
    }

    #[test]
    fn test_marks_from_other_threads_are_observed() {
        let signal = RoundSignal::new();
        let writer = signal.clone();
        std::thread::spawn(move || writer.mark()).join().unwrap();
        assert!(signal.take());
    }
}
