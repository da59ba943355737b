//! Simulated hardware for running the controller on a host.
//!
//! | Adapter        | Implements                  | Behaviour                         |
//! |----------------|-----------------------------|-----------------------------------|
//! | `SimDistance`  | `DistanceInput`             | triangle sweep between two limits |
//! | `SimInputPin`  | `embedded_hal` `InputPin`   | level set through a `PinHandle`   |
//! | `SimOutputPin` | `embedded_hal` `OutputPin`  | level kept in an atomic, logged   |

use core::convert::Infallible;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use embedded_hal::digital::{ErrorType, InputPin, OutputPin};
use log::trace;

use crate::app::ports::DistanceInput;
use crate::error::SensorError;

// ───────────────────────────────────────────────────────────────
// Distance
// ───────────────────────────────────────────────────────────────

/// A car approaching and backing off: sweeps `far → near → far` by `step`
/// metres per reading.
pub struct SimDistance {
    near_m: f64,
    far_m: f64,
    step_m: f64,
    current_m: f64,
    approaching: bool,
}

impl SimDistance {
    pub fn new(far_m: f64, near_m: f64, step_m: f64) -> Self {
        let (near_m, far_m) = if near_m <= far_m { (near_m, far_m) } else { (far_m, near_m) };
        Self {
            near_m,
            far_m,
            step_m: step_m.abs(),
            current_m: far_m,
            approaching: true,
        }
    }
}

impl DistanceInput for SimDistance {
    fn measure_m(&mut self) -> Result<f64, SensorError> {
        let reading = self.current_m;

        if self.approaching {
            self.current_m -= self.step_m;
            if self.current_m <= self.near_m {
                self.current_m = self.near_m;
                self.approaching = false;
            }
        } else {
            self.current_m += self.step_m;
            if self.current_m >= self.far_m {
                self.current_m = self.far_m;
                self.approaching = true;
            }
        }

        Ok(reading)
    }
}

// ───────────────────────────────────────────────────────────────
// Digital pins
// ───────────────────────────────────────────────────────────────

/// Shared view of a simulated pin's level (`true` = high).
#[derive(Clone, Default)]
pub struct PinHandle {
    high: Arc<AtomicBool>,
}

impl PinHandle {
    pub fn set_high(&self, high: bool) {
        self.high.store(high, Ordering::Release);
    }

    pub fn is_high(&self) -> bool {
        self.high.load(Ordering::Acquire)
    }
}

/// Input pin whose level is driven through a [`PinHandle`].
pub struct SimInputPin {
    level: PinHandle,
}

impl SimInputPin {
    /// Starts at `initial_high`; returns the pin and its driving handle.
    pub fn new(initial_high: bool) -> (Self, PinHandle) {
        let level = PinHandle::default();
        level.set_high(initial_high);
        (Self { level: level.clone() }, level)
    }
}

impl ErrorType for SimInputPin {
    type Error = Infallible;
}

impl InputPin for SimInputPin {
    fn is_high(&mut self) -> Result<bool, Infallible> {
        Ok(self.level.is_high())
    }

    fn is_low(&mut self) -> Result<bool, Infallible> {
        Ok(!self.level.is_high())
    }
}

/// Output pin that records its level and traces every change.
pub struct SimOutputPin {
    name: &'static str,
    gpio: u8,
    level: PinHandle,
}

impl SimOutputPin {
    pub fn new(name: &'static str, gpio: u8) -> (Self, PinHandle) {
        let level = PinHandle::default();
        (
            Self {
                name,
                gpio,
                level: level.clone(),
            },
            level,
        )
    }

    fn set(&mut self, high: bool) {
        if self.level.is_high() != high {
            trace!("GPIO{} ({}) -> {}", self.gpio, self.name, if high { "HIGH" } else { "LOW" });
        }
        self.level.set_high(high);
    }
}

impl ErrorType for SimOutputPin {
    type Error = Infallible;
}

impl OutputPin for SimOutputPin {
    fn set_low(&mut self) -> Result<(), Infallible> {
        self.set(false);
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Infallible> {
        self.set(true);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sweep_turns_around_at_the_limits() {
        let mut d = SimDistance::new(1.0, 0.5, 0.25);
        let readings: Vec<f64> = (0..6).map(|_| d.measure_m().unwrap()).collect();
        assert_eq!(readings, vec![1.0, 0.75, 0.5, 0.75, 1.0, 0.75]);
    }

    #[test]
    fn input_pin_follows_handle() {
        let (mut pin, handle) = SimInputPin::new(true);
        assert!(!pin.is_low().unwrap());
        handle.set_high(false);
        assert!(pin.is_low().unwrap());
    }

    #[test]
    fn output_pin_exposes_level() {
        let (mut pin, handle) = SimOutputPin::new("buzzer", 13);
        pin.set_high().unwrap();
        assert!(handle.is_high());
        pin.set_low().unwrap();
        assert!(!handle.is_high());
    }
}
