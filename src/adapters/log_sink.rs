//! Log-based event sink adapter.
//!
//! Implements [`EventSink`] by writing structured application events as
//! one-line log records.  A broker-backed telemetry adapter would
//! implement the same trait.

use log::{info, warn};

use crate::app::events::AppEvent;
use crate::app::ports::EventSink;

/// Adapter that logs every [`AppEvent`] to the console.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogEventSink;

impl LogEventSink {
    pub fn new() -> Self {
        Self
    }
}

impl EventSink for LogEventSink {
    fn emit(&mut self, event: &AppEvent) {
        match event {
            AppEvent::Started { units, frequency_hz } => {
                info!("START | units={} | tick={:.2}Hz", units, frequency_hz);
            }
            AppEvent::UnitFailed { unit, tick, error } => {
                warn!("UNIT  | {} failed on tick {} | {}", unit, tick, error);
            }
            AppEvent::Stopped { ticks } => {
                info!("STOP  | after {} tick(s)", ticks);
            }
            AppEvent::CommandApplied(cmd) => {
                info!("CMD   | {:?} applied", cmd);
            }
        }
    }
}
