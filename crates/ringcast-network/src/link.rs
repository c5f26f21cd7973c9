use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use ringcast_protocol::{GroupNotice, Token};

use crate::NetworkError;

pub type LinkFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, NetworkError>> + Send + 'a>>;

/// Result of a bounded wait on a channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Received<T> {
    Message(T),
    /// Nothing usable arrived before the timeout. Only a cue to re-check
    /// shutdown; never a reason to resend anything.
    Nothing,
}

/// Point-to-point channel from an agent to its successor.
///
/// Sends are fire-and-forget. A token lost in transit is lost for good.
pub trait TokenLink: Send + Sync {
    fn send_token(&self) -> LinkFuture<'_, ()>;

    /// Wait at most `timeout` for the token to arrive.
    fn receive_token(&self, timeout: Duration) -> LinkFuture<'_, Received<Token>>;

    /// Release the inbound endpoint. Called once, on termination.
    fn close(&self) {}
}

/// Best-effort group broadcast reaching every agent, the sender included.
pub trait EventChannel: Send + Sync {
    fn broadcast(&self, notice: GroupNotice) -> LinkFuture<'_, ()>;

    /// Wait at most `timeout` for the next notice.
    fn poll(&self, timeout: Duration) -> LinkFuture<'_, Received<GroupNotice>>;

    /// Leave the group. Called once, on termination.
    fn close(&self) {}
}
