//! Per-agent listener task on the event channel.
//!
//! - EVENT from another agent: mark the round signal.
//! - TERMINATE: cancel the agent.
//! - Poll timeout: loop, which re-checks cancellation.

use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use ringcast_network::{EventChannel, Received};
use ringcast_protocol::{AgentId, GroupNotice};
use ringcast_state::RoundSignal;

use crate::AgentError;

pub struct Listener {
    agent: AgentId,
    channel: Arc<dyn EventChannel>,
    signal: RoundSignal,
    cancel: CancellationToken,
    poll_timeout: Duration,
}

impl Listener {
    pub fn new(
        agent: AgentId,
        channel: Arc<dyn EventChannel>,
        signal: RoundSignal,
        cancel: CancellationToken,
        poll_timeout: Duration,
    ) -> Self {
        Self {
            agent,
            channel,
            signal,
            cancel,
            poll_timeout,
        }
    }

    /// Run until cancelled or a TERMINATE notice arrives.
    pub async fn run(self) -> Result<(), AgentError> {
        loop {
            let received = tokio::select! {
                biased;
                _ = self.cancel.cancelled() => break,
                received = self.channel.poll(self.poll_timeout) => received,
            };

            match received {
                Ok(Received::Message(GroupNotice::Event(event))) => {
                    // The agent marks its own events directly.
                    if event.origin == self.agent {
                        continue;
                    }
                    self.signal.mark();
                    tracing::debug!(agent = %self.agent, origin = %event.origin, "Event notice received");
                }
                Ok(Received::Message(GroupNotice::Terminate)) => {
                    tracing::info!(agent = %self.agent, "TERMINATE received");
                    self.cancel.cancel();
                    break;
                }
                Ok(Received::Nothing) => {}
                Err(e) => {
                    tracing::error!(agent = %self.agent, error = %e, "Event channel failed");
                    self.cancel.cancel();
                    return Err(e.into());
                }
            }
        }

        tracing::debug!(agent = %self.agent, "Listener stopped");
        Ok(())
    }
}
