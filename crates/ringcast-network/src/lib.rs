//! ringcast network - unreliable transports for the token ring.
//!
//! Two seams, both best-effort and without acknowledgments:
//! - [`TokenLink`]: point-to-point delivery of the token to the successor
//! - [`EventChannel`]: group broadcast of EVENT and TERMINATE notices
//!
//! Implementations:
//! - [`udp`]: one UDP socket per agent plus an IPv4 multicast group
//! - [`memory`]: in-process channels with optional token-loss injection

pub mod error;
pub mod link;
pub mod memory;
pub mod udp;

pub use error::NetworkError;
pub use link::{EventChannel, LinkFuture, Received, TokenLink};
pub use memory::{MemoryEventChannel, MemoryRing, MemoryTokenLink, TokenLoss};
pub use udp::{MulticastConfig, UdpEventChannel, UdpTokenLink};
