//! GPIO pin assignments (BCM numbering) for the parking-aid board.
//!
//! Single source of truth: every driver references this module rather than
//! hard-coding pin numbers.

// ---------------------------------------------------------------------------
// Inputs
// ---------------------------------------------------------------------------

/// Silent button, active LOW with pull-up.
pub const BUTTON_GPIO: u8 = 23;

// ---------------------------------------------------------------------------
// Ultrasonic distance sensor (HC-SR04)
// ---------------------------------------------------------------------------

/// Trigger pulse output.
pub const DISTANCE_TRIGGER_GPIO: u8 = 10;
/// Echo input (through a 5 V → 3.3 V divider).
pub const DISTANCE_ECHO_GPIO: u8 = 9;

// ---------------------------------------------------------------------------
// Outputs
// ---------------------------------------------------------------------------

/// Indicator A: red LED, lit steady while the global alarm is raised.
pub const LED_ALARM_GPIO: u8 = 7;
/// Indicator B: green LED, blinks with proximity.
pub const LED_PROXIMITY_GPIO: u8 = 8;
/// Active buzzer.
pub const BUZZER_GPIO: u8 = 13;
