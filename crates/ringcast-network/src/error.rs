use std::io;
use std::net::{Ipv4Addr, SocketAddr};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum NetworkError {
    #[error("cannot bind {addr}: {source}")]
    Bind { addr: SocketAddr, source: io::Error },

    #[error("cannot join multicast group {group}: {source}")]
    JoinGroup { group: Ipv4Addr, source: io::Error },

    #[error("socket option {option} failed: {source}")]
    SocketOption { option: &'static str, source: io::Error },

    #[error("send failed: {0}")]
    Send(#[source] io::Error),

    #[error("receive failed: {0}")]
    Receive(#[source] io::Error),
}
