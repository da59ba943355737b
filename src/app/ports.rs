//! Port traits: the hexagonal boundary between domain logic and the outside world.
//!
//! ```text
//!   Adapter ──▶ Port trait ──▶ units / scheduler / backend (domain)
//! ```
//!
//! Driven adapters (GPIO inputs, broker link, event sinks, storage) implement
//! these traits.  Units and services consume them via generics, so the
//! domain core never touches hardware or sockets directly.

use std::time::{Duration, Instant};

use crate::app::events::AppEvent;
use crate::backend::ingest::MeasurementDocument;
use crate::error::{CommsError, SensorError};

// ───────────────────────────────────────────────────────────────
// Sensor ports (driven adapter: hardware → domain)
// ───────────────────────────────────────────────────────────────

/// Physical button level as reported by the input driver.  Electrical
/// bounce is already filtered at this level.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ButtonLevel {
    NotPressed,
    Pressed,
    /// Pressed for longer than the configured hold time.
    Held,
}

impl ButtonLevel {
    pub fn is_down(self) -> bool {
        !matches!(self, Self::NotPressed)
    }
}

/// A momentary push button.
pub trait ButtonInput {
    fn read(&mut self) -> Result<ButtonLevel, SensorError>;
}

/// An ultrasonic (or similar) distance sensor.
pub trait DistanceInput {
    /// Distance to the nearest obstacle in metres.
    fn measure_m(&mut self) -> Result<f64, SensorError>;
}

// ───────────────────────────────────────────────────────────────
// Broker ports (driven adapter: domain ↔ network)
// ───────────────────────────────────────────────────────────────

/// Hand a message to the outward channel.  `Ok` means the channel accepted
/// it; delivery to the broker is the channel's concern.
pub trait OutboundPort {
    fn publish(&mut self, topic: &str, payload: &[u8]) -> Result<(), CommsError>;
}

/// A message received from the broker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundMessage {
    pub topic: String,
    pub payload: Vec<u8>,
}

/// Receive side of the broker connection.
pub trait InboundSource {
    /// Wait up to `timeout` for the next message.
    fn poll(&mut self, timeout: Duration) -> Option<InboundMessage>;
}

// ───────────────────────────────────────────────────────────────
// Event sink port (driven adapter: domain → logging / telemetry)
// ───────────────────────────────────────────────────────────────

/// The domain emits structured [`AppEvent`]s through this port.
pub trait EventSink {
    fn emit(&mut self, event: &AppEvent);
}

// ───────────────────────────────────────────────────────────────
// Time port
// ───────────────────────────────────────────────────────────────

/// Monotonic time source with a cancellable sleep.
///
/// The scheduler reads all time through this port so its drift behaviour
/// can be tested against a virtual clock.
pub trait Clock {
    fn now(&self) -> Instant;

    /// Sleep for `duration`.  Returns `false` if the sleep was cut short by
    /// cancellation.
    fn sleep(&self, duration: Duration) -> bool;
}

// ───────────────────────────────────────────────────────────────
// Storage port (backend: measurements → database)
// ───────────────────────────────────────────────────────────────

/// Persists ingested measurement documents.
pub trait MeasurementRepository {
    /// Store a document and return its id.
    fn insert(&mut self, document: &MeasurementDocument) -> Result<u64, StorageError>;
}

// ───────────────────────────────────────────────────────────────
// Error types
// ───────────────────────────────────────────────────────────────

/// Errors from configuration loading and validation.
#[derive(Debug)]
pub enum ConfigError {
    /// A config field failed range validation.
    /// The `&'static str` describes which field and why.
    ValidationFailed(&'static str),
}

/// Errors from [`MeasurementRepository`] operations.
#[derive(Debug)]
pub enum StorageError {
    /// Storage is full.
    Full,
    /// Generic I/O error.
    IoError,
}

impl core::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::ValidationFailed(msg) => write!(f, "validation failed: {}", msg),
        }
    }
}

impl core::fmt::Display for StorageError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Full => write!(f, "storage full"),
            Self::IoError => write!(f, "I/O error"),
        }
    }
}

impl std::error::Error for ConfigError {}
impl std::error::Error for StorageError {}
