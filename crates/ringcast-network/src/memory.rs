//! In-process transports for a whole ring.
//!
//! Every agent gets a token inbox (unbounded mpsc) and a subscription to a
//! shared broadcast bus. A [`TokenLoss`] can be injected to drop one specific
//! token send, which is how token loss is reproduced without a network.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{broadcast, mpsc, Mutex};

use ringcast_protocol::{AgentId, GroupNotice, RingTopology, Token};

use crate::{EventChannel, LinkFuture, Received, TokenLink};

const BUS_CAPACITY: usize = 1024;

/// Drop the `send_number`-th token send (1-based) made by agent `from`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TokenLoss {
    pub from: AgentId,
    pub send_number: u64,
}

/// Factory for the per-agent endpoints of an in-process ring.
pub struct MemoryRing {
    links: Vec<MemoryTokenLink>,
    channels: Vec<MemoryEventChannel>,
    dropped: Arc<AtomicU64>,
}

impl MemoryRing {
    pub fn new(topology: RingTopology, loss: Option<TokenLoss>) -> Self {
        let size = topology.size() as usize;
        let (bus, _) = broadcast::channel(BUS_CAPACITY);
        let dropped = Arc::new(AtomicU64::new(0));

        let (senders, inboxes): (Vec<_>, Vec<_>) =
            (0..size).map(|_| mpsc::unbounded_channel::<Token>()).unzip();

        let links = inboxes
            .into_iter()
            .enumerate()
            .map(|(index, inbox)| {
                let id = AgentId::new(index as u32);
                let successor = topology.successor(id);
                MemoryTokenLink {
                    id,
                    outbox: senders[successor.index()].clone(),
                    inbox: Mutex::new(inbox),
                    sends: AtomicU64::new(0),
                    drop_send: loss.filter(|l| l.from == id).map(|l| l.send_number),
                    dropped: dropped.clone(),
                }
            })
            .collect();

        let channels = (0..size)
            .map(|_| MemoryEventChannel {
                bus: bus.clone(),
                inbox: Mutex::new(bus.subscribe()),
            })
            .collect();

        Self { links, channels, dropped }
    }

    /// Number of token sends swallowed by the injected loss, still readable
    /// once the endpoints have been handed out.
    pub fn drop_counter(&self) -> Arc<AtomicU64> {
        self.dropped.clone()
    }

    /// Hand out the endpoints, indexed by agent id.
    pub fn into_parts(self) -> Vec<(MemoryTokenLink, MemoryEventChannel)> {
        self.links.into_iter().zip(self.channels).collect()
    }
}

pub struct MemoryTokenLink {
    id: AgentId,
    outbox: mpsc::UnboundedSender<Token>,
    inbox: Mutex<mpsc::UnboundedReceiver<Token>>,
    sends: AtomicU64,
    drop_send: Option<u64>,
    dropped: Arc<AtomicU64>,
}

impl TokenLink for MemoryTokenLink {
    fn send_token(&self) -> LinkFuture<'_, ()> {
        Box::pin(async move {
            let number = self.sends.fetch_add(1, Ordering::Relaxed) + 1;
            if self.drop_send == Some(number) {
                self.dropped.fetch_add(1, Ordering::Relaxed);
                tracing::warn!(agent = %self.id, send = number, "Token dropped in transit");
                return Ok(());
            }
            // The successor may already be gone; the token is lost like any datagram.
            if self.outbox.send(Token).is_err() {
                tracing::debug!(agent = %self.id, "Successor inbox closed");
            }
            Ok(())
        })
    }

    fn receive_token(&self, timeout: Duration) -> LinkFuture<'_, Received<Token>> {
        Box::pin(async move {
            let mut inbox = self.inbox.lock().await;
            match tokio::time::timeout(timeout, inbox.recv()).await {
                Ok(Some(token)) => Ok(Received::Message(token)),
                Ok(None) => {
                    drop(inbox);
                    tokio::time::sleep(timeout).await;
                    Ok(Received::Nothing)
                }
                Err(_) => Ok(Received::Nothing),
            }
        })
    }

    fn close(&self) {
        if let Ok(mut inbox) = self.inbox.try_lock() {
            inbox.close();
        }
    }
}

pub struct MemoryEventChannel {
    bus: broadcast::Sender<GroupNotice>,
    inbox: Mutex<broadcast::Receiver<GroupNotice>>,
}

impl EventChannel for MemoryEventChannel {
    fn broadcast(&self, notice: GroupNotice) -> LinkFuture<'_, ()> {
        Box::pin(async move {
            // No subscribers left means nobody is listening; same as a lost datagram.
            let _ = self.bus.send(notice);
            Ok(())
        })
    }

    fn poll(&self, timeout: Duration) -> LinkFuture<'_, Received<GroupNotice>> {
        Box::pin(async move {
            let mut inbox = self.inbox.lock().await;
            match tokio::time::timeout(timeout, inbox.recv()).await {
                Ok(Ok(notice)) => Ok(Received::Message(notice)),
                Ok(Err(broadcast::error::RecvError::Lagged(missed))) => {
                    tracing::warn!(missed, "Event bus lagged; notices lost");
                    Ok(Received::Nothing)
                }
                Ok(Err(broadcast::error::RecvError::Closed)) => {
                    drop(inbox);
                    tokio::time::sleep(timeout).await;
                    Ok(Received::Nothing)
                }
                Err(_) => Ok(Received::Nothing),
            }
        })
    }
}
