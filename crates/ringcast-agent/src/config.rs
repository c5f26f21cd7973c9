//! Agent configuration.
//!
//! Layering: compiled defaults, then an optional TOML file, then whatever the
//! command line overrides. Every section is `#[serde(default)]`, so a file only
//! needs the keys it changes:
//!
//! ```toml
//! [network]
//! bind_host = "127.0.0.1"
//! token_base_port = 6000
//!
//! [timing]
//! jitter_min_ms = 100
//! jitter_max_ms = 300
//!
//! [run]
//! seed = 42
//! ```

use std::net::Ipv4Addr;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use ringcast_network::MulticastConfig;
use ringcast_protocol::{
    AgentId, RingTopology, DEFAULT_JITTER_MAX_MS, DEFAULT_JITTER_MIN_MS,
    DEFAULT_LEADER_SETTLE_PER_AGENT_MS, DEFAULT_MULTICAST_PORT, DEFAULT_MULTICAST_TTL,
    DEFAULT_POLL_TIMEOUT_MS, DEFAULT_ROUND_SETTLE_MS, DEFAULT_STARTUP_STAGGER_MS,
    DEFAULT_TERMINATE_LINGER_MS, DEFAULT_TOKEN_BASE_PORT, MAX_POLL_TIMEOUT_MS,
};
use ringcast_state::{Pacing, Probability};

use crate::AgentError;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentConfig {
    pub network: NetworkConfig,
    pub timing: TimingConfig,
    pub run: RunConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NetworkConfig {
    /// Host this agent binds its token socket on.
    pub bind_host: String,
    /// Host of the successor's token socket. Defaults to `bind_host`.
    pub next_host: Option<String>,
    /// Agent `i` listens on `token_base_port + i`.
    pub token_base_port: u16,
    pub multicast_group: Ipv4Addr,
    pub multicast_port: u16,
    pub multicast_ttl: u32,
    pub multicast_interface: Ipv4Addr,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        let multicast = MulticastConfig::default();
        Self {
            bind_host: "127.0.0.1".to_string(),
            next_host: None,
            token_base_port: DEFAULT_TOKEN_BASE_PORT,
            multicast_group: multicast.group,
            multicast_port: DEFAULT_MULTICAST_PORT,
            multicast_ttl: DEFAULT_MULTICAST_TTL,
            multicast_interface: Ipv4Addr::UNSPECIFIED,
        }
    }
}

impl NetworkConfig {
    pub fn next_host(&self) -> &str {
        self.next_host.as_deref().unwrap_or(&self.bind_host)
    }

    /// Token port of `agent`.
    pub fn token_port(&self, agent: AgentId) -> Result<u16, AgentError> {
        u32::from(self.token_base_port)
            .checked_add(agent.as_u32())
            .and_then(|port| u16::try_from(port).ok())
            .ok_or_else(|| {
                AgentError::Config(format!(
                    "token port {} + {} is out of range",
                    self.token_base_port,
                    agent.as_u32()
                ))
            })
    }

    pub fn multicast(&self) -> MulticastConfig {
        MulticastConfig {
            group: self.multicast_group,
            port: self.multicast_port,
            interface: self.multicast_interface,
            ttl: self.multicast_ttl,
        }
    }
}

/// All values in milliseconds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimingConfig {
    pub poll_timeout_ms: u64,
    pub jitter_min_ms: u64,
    pub jitter_max_ms: u64,
    pub startup_stagger_ms: u64,
    pub leader_settle_per_agent_ms: u64,
    pub round_settle_ms: u64,
    pub terminate_linger_ms: u64,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            poll_timeout_ms: DEFAULT_POLL_TIMEOUT_MS,
            jitter_min_ms: DEFAULT_JITTER_MIN_MS,
            jitter_max_ms: DEFAULT_JITTER_MAX_MS,
            startup_stagger_ms: DEFAULT_STARTUP_STAGGER_MS,
            leader_settle_per_agent_ms: DEFAULT_LEADER_SETTLE_PER_AGENT_MS,
            round_settle_ms: DEFAULT_ROUND_SETTLE_MS,
            terminate_linger_ms: DEFAULT_TERMINATE_LINGER_MS,
        }
    }
}

impl TimingConfig {
    pub fn pacing(&self) -> Pacing {
        Pacing::new(
            Duration::from_millis(self.jitter_min_ms),
            Duration::from_millis(self.jitter_max_ms),
        )
    }

    /// Concrete waits for `agent` in a ring of `size`.
    pub fn for_agent(&self, agent: AgentId, size: u32) -> AgentTiming {
        let shared_ring = size > 1;
        AgentTiming {
            poll_timeout: Duration::from_millis(self.poll_timeout_ms),
            startup_delay: Duration::from_millis(self.startup_stagger_ms)
                .saturating_mul(agent.as_u32()),
            leader_settle: if agent.is_leader() && shared_ring {
                Duration::from_millis(self.leader_settle_per_agent_ms).saturating_mul(size)
            } else {
                Duration::ZERO
            },
            round_settle: if shared_ring {
                Duration::from_millis(self.round_settle_ms)
            } else {
                Duration::ZERO
            },
            terminate_linger: Duration::from_millis(self.terminate_linger_ms),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    /// Seed for the agents' random sources; fresh entropy when absent.
    pub seed: Option<u64>,
}

/// Waits applied by one agent's runtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AgentTiming {
    pub poll_timeout: Duration,
    pub startup_delay: Duration,
    pub leader_settle: Duration,
    pub round_settle: Duration,
    pub terminate_linger: Duration,
}

/// The positional startup parameters shared by every agent of a run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RingParameters {
    pub size: u32,
    pub quiet_threshold: u32,
    pub initial_probability: f64,
}

impl RingParameters {
    pub fn new(size: u32, quiet_threshold: u32, initial_probability: f64) -> Self {
        Self {
            size,
            quiet_threshold,
            initial_probability,
        }
    }

    /// Check N, K and p₀ and return the typed ring and probability.
    pub fn validate(&self) -> Result<(RingTopology, Probability), AgentError> {
        let topology = RingTopology::new(self.size)?;
        if self.quiet_threshold == 0 {
            return Err(ringcast_protocol::ProtocolError::ZeroThreshold.into());
        }
        let initial = Probability::new(self.initial_probability)?;
        Ok((topology, initial))
    }
}

impl AgentConfig {
    /// Default location: `<config_dir>/ringcast/config.toml`.
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("ringcast").join("config.toml"))
    }

    /// Load from `path`, or from the default location if it exists, or fall
    /// back to compiled defaults. An explicit path that cannot be read is an error.
    pub fn load(path: Option<&Path>) -> Result<Self, AgentError> {
        match path {
            Some(path) => Self::from_file(path),
            None => match Self::default_path().filter(|p| p.is_file()) {
                Some(path) => Self::from_file(&path),
                None => Ok(Self::default()),
            },
        }
    }

    pub fn from_file(path: &Path) -> Result<Self, AgentError> {
        let text = std::fs::read_to_string(path).map_err(|source| AgentError::ConfigRead {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Self = toml::from_str(&text).map_err(|source| AgentError::ConfigParse {
            path: path.to_path_buf(),
            source,
        })?;
        tracing::debug!(path = %path.display(), "Configuration file loaded");
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), AgentError> {
        let timing = &self.timing;
        if timing.poll_timeout_ms == 0 || timing.poll_timeout_ms > MAX_POLL_TIMEOUT_MS {
            return Err(AgentError::Config(format!(
                "poll_timeout_ms must be in 1..={MAX_POLL_TIMEOUT_MS}, got {}",
                timing.poll_timeout_ms
            )));
        }
        if timing.jitter_min_ms > timing.jitter_max_ms {
            return Err(AgentError::Config(format!(
                "jitter_min_ms ({}) exceeds jitter_max_ms ({})",
                timing.jitter_min_ms, timing.jitter_max_ms
            )));
        }
        if !self.network.multicast_group.is_multicast() {
            return Err(AgentError::Config(format!(
                "{} is not a multicast address",
                self.network.multicast_group
            )));
        }
        if self.network.bind_host.trim().is_empty() {
            return Err(AgentError::Config("bind_host is empty".to_string()));
        }
        Ok(())
    }

    /// [`validate`](Self::validate) plus the checks that depend on the ring size.
    ///
    /// With more than one agent the last EVENT of a round reaches the leader
    /// through its listener, racing the token; a zero round settle lets the
    /// leader close the round before the notice is marked.
    pub fn validate_for_ring(&self, size: u32) -> Result<(), AgentError> {
        self.validate()?;
        if size > 1 && self.timing.round_settle_ms == 0 {
            return Err(AgentError::Config(format!(
                "round_settle_ms must be at least 1 for a ring of {size} agents"
            )));
        }
        Ok(())
    }
}
