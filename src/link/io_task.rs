//! Device link thread.
//!
//! Bridges the scheduler side and the broker connection:
//!
//! 1. **Flush**: drains the [`OutboundQueue`] to the transport, oldest
//!    first.  A message the transport refuses is held and retried before
//!    anything newer, so ordering survives a broker outage.
//! 2. **Receive**: waits up to `poll_interval` for an inbound message,
//!    parses it as a [`ControlCommand`] and applies it to the device
//!    parameters.
//!
//! ```text
//!  ┌────────────────────────────────────────────┐
//!  │  Link thread                               │
//!  │   OutboundQueue ──▶ transport.publish()    │
//!  │   transport.poll() ──▶ ControlCommand      │
//!  │                        └─▶ ParameterStore  │
//!  └────────────────────────────────────────────┘
//! ```

use std::io;
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;

use log::{info, warn};

use crate::app::commands::ControlCommand;
use crate::app::events::AppEvent;
use crate::app::ports::{EventSink, InboundSource, OutboundPort};
use crate::device::Device;
use crate::link::channels::{OutboundMsg, OutboundQueue};
use crate::shutdown::Shutdown;
use crate::task::{spawn_named, DEFAULT_STACK_KB};

/// Longest wait for inbound traffic before re-checking the queue.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(50);

pub struct DeviceLink<T, S> {
    transport: T,
    queue: OutboundQueue,
    device: Arc<Device>,
    sink: S,
    poll_interval: Duration,
    /// Message refused by the transport, sent before anything newer.
    held: Option<OutboundMsg>,
}

impl<T, S> DeviceLink<T, S>
where
    T: OutboundPort + InboundSource,
    S: EventSink,
{
    pub fn new(transport: T, queue: OutboundQueue, device: Arc<Device>, sink: S) -> Self {
        Self {
            transport,
            queue,
            device,
            sink,
            poll_interval: DEFAULT_POLL_INTERVAL,
            held: None,
        }
    }

    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    /// Run until `shutdown` fires, then make one last flush attempt.
    pub fn run(&mut self, shutdown: &Shutdown) {
        info!("Link: running (poll {:?})", self.poll_interval);
        while !shutdown.is_triggered() {
            self.pump();
        }
        let pending = self.flush();
        info!("Link: stopped ({} message(s) left undelivered)", pending);
    }

    /// One flush + receive cycle.
    pub fn pump(&mut self) {
        self.flush();
        if let Some(msg) = self.transport.poll(self.poll_interval) {
            match ControlCommand::parse(&msg.payload) {
                Some(cmd) => {
                    info!("Link: {:?} received on {}", cmd, msg.topic);
                    cmd.apply(self.device.parameters());
                    self.sink.emit(&AppEvent::CommandApplied(cmd));
                }
                None => warn!("Link: ignoring message on {}", msg.topic),
            }
        }
    }

    /// Deliver queued messages.  Returns how many are still waiting.
    pub fn flush(&mut self) -> usize {
        loop {
            let Some(msg) = self.held.take().or_else(|| self.queue.try_recv()) else {
                return 0;
            };
            if let Err(e) = self.transport.publish(&msg.topic, &msg.payload) {
                warn!("Link: publish to {} failed: {}", msg.topic, e);
                self.held = Some(msg);
                return 1 + self.queue.len();
            }
        }
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }
}

impl<T, S> DeviceLink<T, S>
where
    T: OutboundPort + InboundSource + Send + 'static,
    S: EventSink + Send + 'static,
{
    /// Move the link onto its own thread.
    pub fn spawn(mut self, shutdown: Shutdown) -> io::Result<JoinHandle<()>> {
        spawn_named("device-link", DEFAULT_STACK_KB, move || self.run(&shutdown))
    }
}
