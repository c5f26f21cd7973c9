//! ringcast protocol - core types and message definitions
//!
//! Defines agent identities, the ring topology and the three wire messages
//! (TOKEN, EVENT, TERMINATE) exchanged between ring agents.

pub mod constants;
pub mod error;
pub mod identity;
pub mod messages;
pub mod topology;

pub use constants::*;
pub use error::*;
pub use identity::*;
pub use messages::*;
pub use topology::*;
