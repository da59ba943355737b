//! Outbound queue between the scheduler thread and the link thread.
//!
//! A bounded `embassy-sync` channel decouples the uplink actor from the
//! broker connection: the actor only ever does a non-blocking `try_send`,
//! and the link thread drains the queue at its own pace.
//!
//! ```text
//! ┌────────────────┐  OutboundMsg  ┌──────────────┐  publish  ┌────────┐
//! │ Uplink (tick)  │─────────────▶│  Link thread │─────────▶│ Broker │
//! └────────────────┘  try_send     └──────────────┘           └────────┘
//! ```

use std::sync::Arc;

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::Channel;
use heapless::{String, Vec};

use crate::app::ports::OutboundPort;
use crate::error::CommsError;

/// Channel depth for outbound messages.
pub const OUTBOUND_DEPTH: usize = 16;

/// Longest accepted topic.
pub const MAX_TOPIC_LEN: usize = 96;

/// Largest accepted payload.
pub const MAX_PAYLOAD_LEN: usize = 256;

/// A message waiting for the broker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundMsg {
    pub topic: String<MAX_TOPIC_LEN>,
    pub payload: Vec<u8, MAX_PAYLOAD_LEN>,
}

impl OutboundMsg {
    pub fn new(topic: &str, payload: &[u8]) -> Result<Self, CommsError> {
        Ok(Self {
            topic: String::try_from(topic).map_err(|_| CommsError::EncodeFailed)?,
            payload: Vec::from_slice(payload).map_err(|_| CommsError::EncodeFailed)?,
        })
    }
}

type OutboundChannel = Channel<CriticalSectionRawMutex, OutboundMsg, OUTBOUND_DEPTH>;

/// Cloneable handle to a shared outbound channel.
#[derive(Clone)]
pub struct OutboundQueue {
    channel: Arc<OutboundChannel>,
}

impl Default for OutboundQueue {
    fn default() -> Self {
        Self::new()
    }
}

impl OutboundQueue {
    pub fn new() -> Self {
        Self {
            channel: Arc::new(Channel::new()),
        }
    }

    /// Take the oldest queued message, if any.
    pub fn try_recv(&self) -> Option<OutboundMsg> {
        self.channel.try_receive().ok()
    }

    pub fn len(&self) -> usize {
        self.channel.len()
    }

    pub fn is_empty(&self) -> bool {
        self.channel.is_empty()
    }
}

impl OutboundPort for OutboundQueue {
    fn publish(&mut self, topic: &str, payload: &[u8]) -> Result<(), CommsError> {
        let msg = OutboundMsg::new(topic, payload)?;
        self.channel.try_send(msg).map_err(|_| CommsError::QueueFull)
    }
}
