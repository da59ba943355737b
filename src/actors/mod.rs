//! Actor units: read the device state, drive outputs.

pub mod led_beeper;
pub mod uplink;
