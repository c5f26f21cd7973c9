//! One agent per OS process, on UDP and IPv4 multicast.

use std::net::SocketAddr;
use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use ringcast_network::{UdpEventChannel, UdpTokenLink};
use ringcast_state::{RingParticipant, SeededSource};
use ringcast_termination::TerminationCoordinator;

use crate::config::{AgentConfig, RingParameters};
use crate::runtime::{Agent, AgentReport};
use crate::AgentError;

/// Set up agent `id` on the network and run it to completion.
///
/// Any bind, group-join or validation failure is returned before the agent
/// touches the token.
pub async fn run_process(
    id: u32,
    params: RingParameters,
    config: &AgentConfig,
    cancel: CancellationToken,
) -> Result<AgentReport, AgentError> {
    let (topology, initial) = params.validate()?;
    config.validate_for_ring(topology.size())?;
    let id = topology.member(id)?;
    let timing = config.timing.for_agent(id, topology.size());

    if !timing.startup_delay.is_zero() {
        tokio::time::sleep(timing.startup_delay).await;
    }

    let network = &config.network;
    let listen = resolve(&network.bind_host, network.token_port(id)?).await?;
    let successor = topology.successor(id);
    let next = resolve(network.next_host(), network.token_port(successor)?).await?;

    let link = UdpTokenLink::bind(listen, next).await?;
    let channel = UdpEventChannel::join(network.multicast()).await?;

    let participant = RingParticipant::new(
        id,
        topology,
        initial,
        config.timing.pacing(),
        Box::new(SeededSource::for_agent(config.run.seed, id)),
    );
    let coordinator = if id.is_leader() {
        Some(TerminationCoordinator::new(
            topology.size(),
            params.quiet_threshold,
        )?)
    } else {
        None
    };

    tracing::info!(
        agent = %id,
        n = topology.size(),
        k = params.quiet_threshold,
        p0 = initial.value(),
        "Agent configured"
    );

    let agent = Agent::new(
        participant,
        coordinator,
        Arc::new(link),
        Arc::new(channel),
        timing,
        cancel,
    )?;
    agent.run().await
}

/// Resolve `host:port`, preferring IPv4 since the event channel is IPv4-only.
async fn resolve(host: &str, port: u16) -> Result<SocketAddr, AgentError> {
    let failed = |reason: String| AgentError::AddressResolution {
        host: host.to_string(),
        port,
        reason,
    };
    let addrs: Vec<SocketAddr> = tokio::net::lookup_host((host, port))
        .await
        .map_err(|e| failed(e.to_string()))?
        .collect();
    addrs
        .iter()
        .find(|addr| addr.is_ipv4())
        .or_else(|| addrs.first())
        .copied()
        .ok_or_else(|| failed("no addresses".to_string()))
}
