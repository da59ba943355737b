//! Distance sensor unit.
//!
//! Samples the ultrasonic sensor once per tick, rounds the reading to
//! centimetres, appends it to the measurement buffer and publishes it as
//! `current_distance_m`.  A failed read leaves both untouched for the tick.

use chrono::Local;
use log::info;

use crate::app::ports::DistanceInput;
use crate::device::Device;
use crate::device::parameters::keys;
use crate::error::{Result, SensorError};

pub struct DistanceSensor<D> {
    input: D,
}

impl<D: DistanceInput> DistanceSensor<D> {
    pub fn new(input: D) -> Self {
        Self { input }
    }

    pub fn input_mut(&mut self) -> &mut D {
        &mut self.input
    }

    pub fn poll(&mut self, device: &Device) -> Result<()> {
        let raw = self.input.measure_m()?;
        if !raw.is_finite() || raw < 0.0 {
            return Err(SensorError::OutOfRange.into());
        }
        let distance_m = round_cm(raw);

        device.measurements().push(distance_m, Local::now());
        device.parameters().set(keys::CURRENT_DISTANCE_M, distance_m);
        info!("Distance: {:.2} m", distance_m);
        Ok(())
    }
}

/// Round metres to two decimals.
pub fn round_cm(metres: f64) -> f64 {
    (metres * 100.0).round() / 100.0
}
