//! Outbound application events.
//!
//! The scheduler and units emit these through the
//! [`EventSink`](super::ports::EventSink) port.  Adapters on the other side
//! decide what to do with them: log to the console, count them in tests.

use crate::app::commands::ControlCommand;
use crate::error::Error;

/// Structured events emitted by the application core.
#[derive(Debug, Clone, PartialEq)]
pub enum AppEvent {
    /// The scheduler loop started (carries unit count and tick rate).
    Started { units: usize, frequency_hz: f32 },

    /// A unit failed during a tick and was skipped for that tick.
    UnitFailed {
        unit: &'static str,
        tick: u64,
        error: Error,
    },

    /// The scheduler loop exited after cancellation.
    Stopped { ticks: u64 },

    /// A backend command was applied to the device parameters.
    CommandApplied(ControlCommand),
}
