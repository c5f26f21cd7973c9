use std::net::Ipv4Addr;

/// Lower bound for an agent's event probability after decay.
pub const EPSILON_PROBABILITY: f64 = 1e-9;

/// Marker contained in every log line announcing an event.
pub const EVENT_MARKER: &str = "Launching event";

/// Prefix of the leader's machine-parsable summary line.
pub const SUMMARY_PREFIX: &str = "DATA_OUTPUT:";

/// Id of the agent that starts with the token and detects termination.
pub const LEADER_ID: u32 = 0;

pub const DEFAULT_TOKEN_BASE_PORT: u16 = 6000;
pub const DEFAULT_MULTICAST_GROUP: Ipv4Addr = Ipv4Addr::new(224, 1, 1, 1);
pub const DEFAULT_MULTICAST_PORT: u16 = 5007;
pub const DEFAULT_MULTICAST_TTL: u32 = 2;

pub const DEFAULT_POLL_TIMEOUT_MS: u64 = 500;
/// Listeners and token receivers never wait longer than this per poll.
pub const MAX_POLL_TIMEOUT_MS: u64 = 1_000;

pub const DEFAULT_JITTER_MIN_MS: u64 = 100;
pub const DEFAULT_JITTER_MAX_MS: u64 = 300;
pub const DEFAULT_STARTUP_STAGGER_MS: u64 = 50;
pub const DEFAULT_LEADER_SETTLE_PER_AGENT_MS: u64 = 750;
pub const DEFAULT_ROUND_SETTLE_MS: u64 = 5;
pub const DEFAULT_TERMINATE_LINGER_MS: u64 = 500;

/// Largest datagram any ring message can occupy.
pub const MAX_FRAME_LEN: usize = 1024;
