//! Wire messages exchanged on the token link and the event channel.
//!
//! Frames are short ASCII tags so they stay readable in packet captures:
//! - `TOKEN`
//! - `EVENT <sender id>`
//! - `TERMINATE`

use serde::{Deserialize, Serialize};

use crate::{AgentId, ProtocolError};

const TOKEN_TAG: &str = "TOKEN";
const EVENT_TAG: &str = "EVENT";
const TERMINATE_TAG: &str = "TERMINATE";

/// The circulating permission to act. Carries no data; possession is the point.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Token;

/// Notice that an agent triggered an event while holding the token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventNotification {
    pub origin: AgentId,
}

/// Messages carried by the group broadcast channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GroupNotice {
    Event(EventNotification),
    Terminate,
}

/// Every message kind that can appear on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RingMessage {
    Token,
    Event { sender: AgentId },
    Terminate,
}

impl RingMessage {
    pub fn encode(&self) -> Vec<u8> {
        self.to_string().into_bytes()
    }

    pub fn decode(bytes: &[u8]) -> Result<Self, ProtocolError> {
        let text = std::str::from_utf8(bytes)
            .map_err(|e| ProtocolError::MalformedMessage(format!("not utf-8: {e}")))?;
        text.parse()
    }

    /// The broadcast view of this message, if it belongs on the group channel.
    pub fn into_notice(self) -> Option<GroupNotice> {
        match self {
            Self::Token => None,
            Self::Event { sender } => Some(GroupNotice::Event(EventNotification { origin: sender })),
            Self::Terminate => Some(GroupNotice::Terminate),
        }
    }
}

impl From<GroupNotice> for RingMessage {
    fn from(notice: GroupNotice) -> Self {
        match notice {
            GroupNotice::Event(event) => Self::Event { sender: event.origin },
            GroupNotice::Terminate => Self::Terminate,
        }
    }
}

impl std::fmt::Display for RingMessage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Token => write!(f, "{TOKEN_TAG}"),
            Self::Event { sender } => write!(f, "{EVENT_TAG} {}", sender.as_u32()),
            Self::Terminate => write!(f, "{TERMINATE_TAG}"),
        }
    }
}

impl std::str::FromStr for RingMessage {
    type Err = ProtocolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut parts = s.split_whitespace();
        let tag = parts
            .next()
            .ok_or_else(|| ProtocolError::MalformedMessage("empty frame".into()))?;

        let message = match tag {
            TOKEN_TAG => Self::Token,
            TERMINATE_TAG => Self::Terminate,
            EVENT_TAG => {
                let sender = parts
                    .next()
                    .ok_or_else(|| ProtocolError::MalformedMessage("EVENT without sender".into()))?;
                let sender = sender.parse::<u32>().map_err(|e| {
                    ProtocolError::MalformedMessage(format!("invalid sender '{sender}': {e}"))
                })?;
                Self::Event { sender: AgentId::new(sender) }
            }
            other => {
                return Err(ProtocolError::MalformedMessage(format!(
                    "unknown tag '{other}'"
                )))
            }
        };

        if let Some(extra) = parts.next() {
            return Err(ProtocolError::MalformedMessage(format!(
                "trailing data '{extra}' after {tag}"
            )));
        }
        Ok(message)
    }
}
