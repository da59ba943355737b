//! In-process backend: receives device measurements, stores them, and
//! raises/clears the global alarm.
//!
//! | Handler          | Reacts to          | Effect                            |
//! |------------------|--------------------|-----------------------------------|
//! | `IngestHandler`  | `MEASUREMENT`      | document stored in repository     |
//! | `AlarmHandler`   | every message      | `ALARM_ON`/`ALARM_OFF` broadcast  |
//!
//! Every inbound payload is parsed once by the [`BackendRouter`] and handed
//! to each handler in registration order.  A failing handler is logged and
//! does not keep the others from seeing the message.

pub mod alarm;
pub mod ingest;

use std::io;
use std::thread::JoinHandle;
use std::time::Duration;

use log::{info, warn};

use crate::app::ports::{InboundMessage, InboundSource, StorageError};
use crate::error::CommsError;
use crate::shutdown::Shutdown;
use crate::task::{spawn_named, DEFAULT_STACK_KB};

/// Errors a handler can report for a single message.
#[derive(Debug)]
pub enum BackendError {
    Comms(CommsError),
    Storage(StorageError),
}

impl core::fmt::Display for BackendError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Comms(e) => write!(f, "comms: {}", e),
            Self::Storage(e) => write!(f, "storage: {}", e),
        }
    }
}

impl std::error::Error for BackendError {}

impl From<CommsError> for BackendError {
    fn from(e: CommsError) -> Self {
        Self::Comms(e)
    }
}

impl From<StorageError> for BackendError {
    fn from(e: StorageError) -> Self {
        Self::Storage(e)
    }
}

/// A consumer of decoded backend messages.
pub trait MessageHandler {
    fn name(&self) -> &'static str;

    fn handle(&mut self, topic: &str, message: &serde_json::Value) -> Result<(), BackendError>;
}

// ───────────────────────────────────────────────────────────────
// Router
// ───────────────────────────────────────────────────────────────

#[derive(Default)]
pub struct BackendRouter {
    handlers: Vec<Box<dyn MessageHandler + Send>>,
}

impl BackendRouter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_handler(&mut self, handler: impl MessageHandler + Send + 'static) {
        info!("Backend: handler '{}' added", handler.name());
        self.handlers.push(Box::new(handler));
    }

    /// Deliver one message to every handler.  Returns how many handled it
    /// without error; malformed payloads reach none.
    pub fn dispatch(&mut self, msg: &InboundMessage) -> usize {
        let value: serde_json::Value = match serde_json::from_slice(&msg.payload) {
            Ok(v) => v,
            Err(e) => {
                warn!("Backend: dropping malformed message on {}: {}", msg.topic, e);
                return 0;
            }
        };

        let mut ok = 0;
        for handler in &mut self.handlers {
            match handler.handle(&msg.topic, &value) {
                Ok(()) => ok += 1,
                Err(e) => warn!("Backend: handler '{}' failed: {}", handler.name(), e),
            }
        }
        ok
    }
}

// ───────────────────────────────────────────────────────────────
// Service thread
// ───────────────────────────────────────────────────────────────

pub struct BackendService<I> {
    inbound: I,
    router: BackendRouter,
    poll_interval: Duration,
    received: u64,
}

impl<I: InboundSource> BackendService<I> {
    pub fn new(inbound: I, router: BackendRouter) -> Self {
        Self {
            inbound,
            router,
            poll_interval: Duration::from_millis(50),
            received: 0,
        }
    }

    /// Handle at most one message, waiting up to the poll interval.
    pub fn poll_once(&mut self) -> bool {
        match self.inbound.poll(self.poll_interval) {
            Some(msg) => {
                self.received += 1;
                self.router.dispatch(&msg);
                true
            }
            None => false,
        }
    }

    /// Run until `shutdown` fires.  Returns the number of messages seen.
    pub fn run(&mut self, shutdown: &Shutdown) -> u64 {
        info!("Backend: running");
        while !shutdown.is_triggered() {
            self.poll_once();
        }
        info!("Backend: stopped after {} message(s)", self.received);
        self.received
    }
}

impl<I: InboundSource + Send + 'static> BackendService<I> {
    pub fn spawn(mut self, shutdown: Shutdown) -> io::Result<JoinHandle<u64>> {
        spawn_named("backend", DEFAULT_STACK_KB, move || self.run(&shutdown))
    }
}
