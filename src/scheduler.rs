//! Fixed-frequency tick loop.
//!
//! Runs every registered [`Unit`] once per tick, in registration order,
//! against the shared [`Device`].  Sensors are registered first so actors
//! in the same tick see that tick's readings.
//!
//! ```text
//!  ┌──────────┐  sleep(period - elapsed)  ┌──────────────────────────────┐
//!  │  Clock   │──────────────────────────▶│ tick n                       │
//!  └──────────┘                           │  button ─▶ distance ─▶       │
//!       ▲                                 │  beeper ─▶ uplink            │
//!       │        next tick                └──────────────┬───────────────┘
//!       └────────────────────────────────────────────────┘
//! ```
//!
//! ## Drift compensation
//!
//! `prev_tick` is set to `now + sleep`, the instant the tick is scheduled
//! to start, rather than to `now`; the next sleep then shrinks by however
//! long the units took.  A tick whose units overrun the period is followed immediately by
//! the next one; missed ticks are dropped, never replayed in a burst.

use std::time::{Duration, Instant};

use log::{debug, info, warn};

use crate::app::events::AppEvent;
use crate::app::ports::{Clock, EventSink};
use crate::device::Device;
use crate::error::Result;

// ═══════════════════════════════════════════════════════════════
//  Unit contract
// ═══════════════════════════════════════════════════════════════

/// A sensor or actor invoked once per tick.
pub trait Unit {
    /// Short label used in logs and failure events.
    fn name(&self) -> &'static str;

    /// Read or write device state for this tick.  An error skips the rest
    /// of this unit's work for the tick only.
    fn invoke(&mut self, device: &Device) -> Result<()>;
}

/// Time left to sleep before the next tick.  Never negative.
pub fn compute_sleep(period: Duration, elapsed: Duration) -> Duration {
    period.saturating_sub(elapsed)
}

// ═══════════════════════════════════════════════════════════════
//  Scheduler engine
// ═══════════════════════════════════════════════════════════════

pub struct PeriodicScheduler<U, C, S> {
    units: Vec<U>,
    period: Duration,
    frequency_hz: f32,
    clock: C,
    sink: S,
    /// Scheduled start of the previous tick; `None` before the first.
    prev_tick: Option<Instant>,
    ticks: u64,
}

impl<U: Unit, C: Clock, S: EventSink> PeriodicScheduler<U, C, S> {
    /// `frequency_hz` must be positive and finite; anything else falls back
    /// to 1 Hz.
    pub fn new(frequency_hz: f32, clock: C, sink: S) -> Self {
        let frequency_hz = if frequency_hz.is_finite() && frequency_hz > 0.0 {
            frequency_hz
        } else {
            warn!("Scheduler: invalid frequency {}, using 1 Hz", frequency_hz);
            1.0
        };

        Self {
            units: Vec::new(),
            period: Duration::from_secs_f32(1.0 / frequency_hz),
            frequency_hz,
            clock,
            sink,
            prev_tick: None,
            ticks: 0,
        }
    }

    /// Append a unit.  Units run in the order they were registered.
    pub fn register(&mut self, unit: U) {
        info!("Scheduler: registered '{}' at position {}", unit.name(), self.units.len());
        self.units.push(unit);
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    /// Completed ticks so far.
    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    pub fn units(&self) -> &[U] {
        &self.units
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    /// Wait for the next tick, then run every unit.  Returns `false` if
    /// cancelled while waiting; no unit runs in that case.
    pub fn step(&mut self, device: &Device) -> bool {
        let now = self.clock.now();
        let sleep = match self.prev_tick {
            Some(prev) => compute_sleep(self.period, now.saturating_duration_since(prev)),
            None => Duration::ZERO,
        };
        if self.prev_tick.is_some() && sleep.is_zero() {
            debug!("Scheduler: tick {} overran the period, running immediately", self.ticks + 1);
        }
        self.prev_tick = Some(now + sleep);

        if !self.clock.sleep(sleep) {
            return false;
        }

        self.run_units(device);
        true
    }

    /// Run until cancelled.  Returns the number of completed ticks.
    pub fn run_forever(&mut self, device: &Device) -> u64 {
        self.sink.emit(&AppEvent::Started {
            units: self.units.len(),
            frequency_hz: self.frequency_hz,
        });

        while self.step(device) {}

        self.sink.emit(&AppEvent::Stopped { ticks: self.ticks });
        self.ticks
    }

    /// Run at most `n` ticks (stops early on cancellation).
    pub fn run_ticks(&mut self, device: &Device, n: u64) -> u64 {
        let start = self.ticks;
        while self.ticks - start < n && self.step(device) {}
        self.ticks - start
    }

    fn run_units(&mut self, device: &Device) {
        self.ticks += 1;
        for unit in &mut self.units {
            if let Err(error) = unit.invoke(device) {
                warn!("Scheduler: unit '{}' failed on tick {}: {}", unit.name(), self.ticks, error);
                self.sink.emit(&AppEvent::UnitFailed {
                    unit: unit.name(),
                    tick: self.ticks,
                    error,
                });
            }
        }
    }
}

// ═══════════════════════════════════════════════════════════════
//  Tests
// ═══════════════════════════════════════════════════════════════
