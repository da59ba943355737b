//! Broker transport.
//!
//! [`LoopbackBroker`] is an in-process publish/subscribe hub with MQTT-style
//! topic filters.  It stands in for the network broker in the simulation
//! binary and in tests; each participant gets a [`BrokerClient`] which
//! implements both [`OutboundPort`] and [`InboundSource`].

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use log::{debug, info};

use crate::app::ports::{InboundMessage, InboundSource, OutboundPort};
use crate::error::CommsError;

/// `true` if `topic` matches `filter`.  `+` matches one level, a trailing
/// `#` matches any remainder (including none).
pub fn topic_matches(filter: &str, topic: &str) -> bool {
    let mut f = filter.split('/');
    let mut t = topic.split('/');
    loop {
        match (f.next(), t.next()) {
            (Some("#"), _) => return true,
            (Some("+"), Some(_)) => {}
            (Some(a), Some(b)) if a == b => {}
            (None, None) => return true,
            _ => return false,
        }
    }
}

struct Subscription {
    filter: String,
    tx: Sender<InboundMessage>,
}

#[derive(Default)]
struct Hub {
    subscriptions: Mutex<Vec<Subscription>>,
    offline: AtomicBool,
}

/// Cloneable handle to the in-process broker.
#[derive(Clone, Default)]
pub struct LoopbackBroker {
    hub: Arc<Hub>,
}

impl LoopbackBroker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a client connection.
    pub fn connect(&self, client_id: &str) -> BrokerClient {
        info!("Broker: client '{}' connected", client_id);
        let (tx, rx) = mpsc::channel();
        BrokerClient {
            hub: Arc::clone(&self.hub),
            client_id: client_id.to_owned(),
            tx,
            rx,
        }
    }

    /// Simulate a connection loss: publishes fail with
    /// [`CommsError::Disconnected`] until brought back online.
    pub fn set_online(&self, online: bool) {
        self.hub.offline.store(!online, Ordering::Release);
    }

    /// Publish without a client.  Returns the number of receivers.
    pub fn inject(&self, topic: &str, payload: &[u8]) -> Result<usize, CommsError> {
        deliver(&self.hub, topic, payload)
    }
}

fn deliver(hub: &Hub, topic: &str, payload: &[u8]) -> Result<usize, CommsError> {
    if hub.offline.load(Ordering::Acquire) {
        return Err(CommsError::Disconnected);
    }

    let mut subs = hub
        .subscriptions
        .lock()
        .unwrap_or_else(PoisonError::into_inner);
    let mut delivered = 0;
    // Dropped clients are pruned on the way.
    subs.retain(|sub| {
        if !topic_matches(&sub.filter, topic) {
            return true;
        }
        let msg = InboundMessage {
            topic: topic.to_owned(),
            payload: payload.to_vec(),
        };
        match sub.tx.send(msg) {
            Ok(()) => {
                delivered += 1;
                true
            }
            Err(_) => false,
        }
    });
    Ok(delivered)
}

/// One participant's connection to a [`LoopbackBroker`].
pub struct BrokerClient {
    hub: Arc<Hub>,
    client_id: String,
    tx: Sender<InboundMessage>,
    rx: Receiver<InboundMessage>,
}

impl BrokerClient {
    pub fn subscribe(&mut self, filter: &str) {
        info!("Broker: '{}' subscribed to {}", self.client_id, filter);
        self.hub
            .subscriptions
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(Subscription {
                filter: filter.to_owned(),
                tx: self.tx.clone(),
            });
    }

    pub fn client_id(&self) -> &str {
        &self.client_id
    }
}

impl OutboundPort for BrokerClient {
    fn publish(&mut self, topic: &str, payload: &[u8]) -> Result<(), CommsError> {
        let n = deliver(&self.hub, topic, payload)?;
        debug!("Broker: '{}' -> {} ({} subscriber(s))", self.client_id, topic, n);
        Ok(())
    }
}

impl InboundSource for BrokerClient {
    fn poll(&mut self, timeout: Duration) -> Option<InboundMessage> {
        if timeout.is_zero() {
            self.rx.try_recv().ok()
        } else {
            self.rx.recv_timeout(timeout).ok()
        }
    }
}
