//! Silent button: mutes and unmutes the buzzer.
//!
//! ## Layers
//!
//! | Layer           | Input                    | Output                      |
//! |-----------------|--------------------------|-----------------------------|
//! | [`PinButton`]   | active-low GPIO level    | [`ButtonLevel`] incl. hold  |
//! | [`DebounceGate`]| [`ButtonLevel`] per tick | one trigger per press cycle |
//! | [`SilentButton`]| trigger                  | `silent` parameter toggled  |
//!
//! The gate is sampled once per scheduler tick, so a press held across many
//! ticks (or reported as `Held`) still toggles only once.

use std::time::{Duration, Instant};

use embedded_hal::digital::InputPin;
use log::info;

use crate::app::ports::{ButtonInput, ButtonLevel};
use crate::device::parameters::{keys, ParamValue, ParameterStore};
use crate::error::{Result, SensorError};

// ───────────────────────────────────────────────────────────────
// Edge detection
// ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum GateState {
    Idle,
    /// Fired for the current press; waiting for release.
    Locked,
}

/// Converts a sampled button level into one logical trigger per
/// press-and-release cycle.
#[derive(Debug, Clone)]
pub struct DebounceGate {
    state: GateState,
}

impl Default for DebounceGate {
    fn default() -> Self {
        Self::new()
    }
}

impl DebounceGate {
    pub fn new() -> Self {
        Self { state: GateState::Idle }
    }

    /// Feed one sample.  Returns `true` exactly on the sample that starts a
    /// new press.
    pub fn update(&mut self, level: ButtonLevel) -> bool {
        match (self.state, level.is_down()) {
            (GateState::Idle, true) => {
                self.state = GateState::Locked;
                true
            }
            (GateState::Locked, false) => {
                self.state = GateState::Idle;
                false
            }
            _ => false,
        }
    }

    pub fn is_locked(&self) -> bool {
        self.state == GateState::Locked
    }
}

// ───────────────────────────────────────────────────────────────
// GPIO adapter
// ───────────────────────────────────────────────────────────────

/// Active-low push button on a GPIO input with hold detection.
pub struct PinButton<P> {
    pin: P,
    hold: Duration,
    pressed_since: Option<Instant>,
}

impl<P: InputPin> PinButton<P> {
    pub fn new(pin: P, hold: Duration) -> Self {
        Self {
            pin,
            hold,
            pressed_since: None,
        }
    }

    /// Sample the pin as of `now`.
    pub fn read_at(&mut self, now: Instant) -> core::result::Result<ButtonLevel, SensorError> {
        let pressed = self.pin.is_low().map_err(|_| SensorError::GpioReadFailed)?;
        if !pressed {
            self.pressed_since = None;
            return Ok(ButtonLevel::NotPressed);
        }

        let since = *self.pressed_since.get_or_insert(now);
        if now.saturating_duration_since(since) >= self.hold {
            Ok(ButtonLevel::Held)
        } else {
            Ok(ButtonLevel::Pressed)
        }
    }
}

impl<P: InputPin> ButtonInput for PinButton<P> {
    fn read(&mut self) -> core::result::Result<ButtonLevel, SensorError> {
        self.read_at(Instant::now())
    }
}

// ───────────────────────────────────────────────────────────────
// Sensor unit
// ───────────────────────────────────────────────────────────────

/// Toggles the `silent` parameter on each debounced press.
pub struct SilentButton<B> {
    input: B,
    gate: DebounceGate,
}

impl<B: ButtonInput> SilentButton<B> {
    pub fn new(input: B) -> Self {
        Self {
            input,
            gate: DebounceGate::new(),
        }
    }

    pub fn input_mut(&mut self) -> &mut B {
        &mut self.input
    }

    pub fn poll(&mut self, parameters: &ParameterStore) -> Result<()> {
        // Initialise without clobbering a value set concurrently.
        parameters.update(keys::SILENT, ParamValue::Bool(false), |v| v);

        let level = self.input.read()?;
        parameters.set(keys::BUTTON_HELD, level == ButtonLevel::Held);

        if self.gate.update(level) {
            let silent = parameters.update(keys::SILENT, ParamValue::Bool(false), |v| {
                ParamValue::Bool(!v.as_bool().unwrap_or(false))
            });
            info!("Silent button pressed, silent={}", silent.as_bool().unwrap_or(false));
        }
        Ok(())
    }
}
