//! ringcast termination - leader-only round bookkeeping.
//!
//! The leader measures one round per full traversal of the token and counts
//! consecutive rounds in which nobody in the ring triggered an event. Once
//! that count reaches the configured threshold the ring is declared quiet and
//! the leader broadcasts TERMINATE.

pub mod coordinator;
pub mod error;
pub mod quiet;
pub mod round;
pub mod stats;

pub use coordinator::{RoundClosure, RoundDecision, TerminationCoordinator, TokenArrival};
pub use error::TerminationError;
pub use quiet::QuietCounter;
pub use round::RoundRecord;
pub use stats::RoundStats;
