//! UDP transports.
//!
//! - Token link: agent `i` owns a datagram socket on `base_port + i` and sends
//!   `TOKEN` frames to its successor's socket.
//! - Event channel: every agent joins one IPv4 multicast group. The receive
//!   port is shared between agents on the same host, so it is bound with
//!   address (and, where available, port) reuse.

use std::net::{Ipv4Addr, SocketAddr, SocketAddrV4};
use std::time::Duration;

use socket2::{Domain, Protocol, Socket, Type};
use tokio::net::UdpSocket;

use ringcast_protocol::{
    GroupNotice, RingMessage, Token, DEFAULT_MULTICAST_GROUP, DEFAULT_MULTICAST_PORT,
    DEFAULT_MULTICAST_TTL, MAX_FRAME_LEN,
};

use crate::{EventChannel, LinkFuture, NetworkError, Received, TokenLink};

// ---------------------------------------------------------------------------
// Token link
// ---------------------------------------------------------------------------

pub struct UdpTokenLink {
    socket: UdpSocket,
    local: SocketAddr,
    successor: SocketAddr,
}

impl UdpTokenLink {
    /// Bind the inbound token socket. Fails if the address is already in use.
    pub async fn bind(listen: SocketAddr, successor: SocketAddr) -> Result<Self, NetworkError> {
        let socket = UdpSocket::bind(listen)
            .await
            .map_err(|source| NetworkError::Bind { addr: listen, source })?;
        let local = socket
            .local_addr()
            .map_err(|source| NetworkError::Bind { addr: listen, source })?;

        tracing::info!(%local, %successor, "Token socket bound");
        Ok(Self { socket, local, successor })
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.local
    }

    async fn send(&self) -> Result<(), NetworkError> {
        self.socket
            .send_to(&RingMessage::Token.encode(), self.successor)
            .await
            .map_err(NetworkError::Send)?;
        tracing::debug!(to = %self.successor, "Token sent");
        Ok(())
    }

    async fn receive(&self, timeout: Duration) -> Result<Received<Token>, NetworkError> {
        let mut buf = [0u8; MAX_FRAME_LEN];
        let (len, from) = match tokio::time::timeout(timeout, self.socket.recv_from(&mut buf)).await
        {
            Err(_) => return Ok(Received::Nothing),
            Ok(result) => result.map_err(NetworkError::Receive)?,
        };

        match RingMessage::decode(&buf[..len]) {
            Ok(RingMessage::Token) => Ok(Received::Message(Token)),
            Ok(other) => {
                tracing::warn!(%from, message = %other, "Unexpected message on token socket");
                Ok(Received::Nothing)
            }
            Err(e) => {
                tracing::warn!(%from, error = %e, "Discarding malformed datagram on token socket");
                Ok(Received::Nothing)
            }
        }
    }
}

impl TokenLink for UdpTokenLink {
    fn send_token(&self) -> LinkFuture<'_, ()> {
        Box::pin(self.send())
    }

    fn receive_token(&self, timeout: Duration) -> LinkFuture<'_, Received<Token>> {
        Box::pin(self.receive(timeout))
    }
}

// ---------------------------------------------------------------------------
// Multicast event channel
// ---------------------------------------------------------------------------

/// Multicast group settings for the event channel.
#[derive(Debug, Clone)]
pub struct MulticastConfig {
    pub group: Ipv4Addr,
    pub port: u16,
    /// Local interface used to join the group (`0.0.0.0` lets the OS pick).
    pub interface: Ipv4Addr,
    pub ttl: u32,
}

impl Default for MulticastConfig {
    fn default() -> Self {
        Self {
            group: DEFAULT_MULTICAST_GROUP,
            port: DEFAULT_MULTICAST_PORT,
            interface: Ipv4Addr::UNSPECIFIED,
            ttl: DEFAULT_MULTICAST_TTL,
        }
    }
}

impl MulticastConfig {
    pub fn group_addr(&self) -> SocketAddr {
        SocketAddr::V4(SocketAddrV4::new(self.group, self.port))
    }
}

pub struct UdpEventChannel {
    socket: UdpSocket,
    config: MulticastConfig,
}

impl UdpEventChannel {
    /// Bind the shared group port and join the multicast group.
    pub async fn join(config: MulticastConfig) -> Result<Self, NetworkError> {
        let bind_addr = SocketAddr::V4(SocketAddrV4::new(Ipv4Addr::UNSPECIFIED, config.port));

        let socket = Socket::new(Domain::IPV4, Type::DGRAM, Some(Protocol::UDP))
            .map_err(|source| NetworkError::Bind { addr: bind_addr, source })?;
        socket
            .set_reuse_address(true)
            .map_err(|source| NetworkError::SocketOption { option: "SO_REUSEADDR", source })?;
        #[cfg(all(unix, not(any(target_os = "solaris", target_os = "illumos"))))]
        socket
            .set_reuse_port(true)
            .map_err(|source| NetworkError::SocketOption { option: "SO_REUSEPORT", source })?;
        socket
            .set_nonblocking(true)
            .map_err(|source| NetworkError::SocketOption { option: "O_NONBLOCK", source })?;
        socket
            .bind(&bind_addr.into())
            .map_err(|source| NetworkError::Bind { addr: bind_addr, source })?;
        socket
            .join_multicast_v4(&config.group, &config.interface)
            .map_err(|source| NetworkError::JoinGroup { group: config.group, source })?;
        socket
            .set_multicast_ttl_v4(config.ttl)
            .map_err(|source| NetworkError::SocketOption { option: "IP_MULTICAST_TTL", source })?;
        socket
            .set_multicast_loop_v4(true)
            .map_err(|source| NetworkError::SocketOption { option: "IP_MULTICAST_LOOP", source })?;

        let socket = UdpSocket::from_std(socket.into())
            .map_err(|source| NetworkError::Bind { addr: bind_addr, source })?;

        tracing::info!(group = %config.group, port = config.port, "Joined multicast group");
        Ok(Self { socket, config })
    }

    async fn send(&self, notice: GroupNotice) -> Result<(), NetworkError> {
        let frame = RingMessage::from(notice).encode();
        self.socket
            .send_to(&frame, self.config.group_addr())
            .await
            .map_err(NetworkError::Send)?;
        Ok(())
    }

    async fn receive(&self, timeout: Duration) -> Result<Received<GroupNotice>, NetworkError> {
        let mut buf = [0u8; MAX_FRAME_LEN];
        let (len, from) = match tokio::time::timeout(timeout, self.socket.recv_from(&mut buf)).await
        {
            Err(_) => return Ok(Received::Nothing),
            Ok(result) => result.map_err(NetworkError::Receive)?,
        };

        match RingMessage::decode(&buf[..len]).map(RingMessage::into_notice) {
            Ok(Some(notice)) => Ok(Received::Message(notice)),
            Ok(None) => {
                tracing::warn!(%from, "Unexpected TOKEN on the multicast group");
                Ok(Received::Nothing)
            }
            Err(e) => {
                tracing::warn!(%from, error = %e, "Discarding malformed multicast datagram");
                Ok(Received::Nothing)
            }
        }
    }
}

impl EventChannel for UdpEventChannel {
    fn broadcast(&self, notice: GroupNotice) -> LinkFuture<'_, ()> {
        Box::pin(self.send(notice))
    }

    fn poll(&self, timeout: Duration) -> LinkFuture<'_, Received<GroupNotice>> {
        Box::pin(self.receive(timeout))
    }

    fn close(&self) {
        if let Err(e) = self
            .socket
            .leave_multicast_v4(self.config.group, self.config.interface)
        {
            tracing::debug!(error = %e, group = %self.config.group, "Leaving multicast group failed");
        }
    }
}
