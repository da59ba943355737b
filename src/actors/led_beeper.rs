//! LED/beeper actor.
//!
//! Turns the latest distance reading and the backend alarm into a render
//! intensity for the [`AlarmIntensityDriver`](crate::drivers::alarm_driver::AlarmIntensityDriver):
//!
//! - `alarm` set: 1.0 (steady red, buzzer unless silenced)
//! - distance within `[min, max]`: rises linearly from 0 at `max` to 1 at `min`
//! - otherwise: 0 (outputs off)
//!
//! No reading yet counts as "far away".

use std::sync::Arc;

use log::debug;

use crate::device::Device;
use crate::device::parameters::keys;
use crate::drivers::alarm_driver::AlarmSignal;
use crate::error::Result;

/// Distance assumed before the first reading.
const NO_READING_M: f64 = 9999.0;

pub struct LedBeeper {
    signal: Arc<AlarmSignal>,
    min_m: f64,
    max_m: f64,
}

impl LedBeeper {
    pub fn new(signal: Arc<AlarmSignal>, min_m: f64, max_m: f64) -> Self {
        Self { signal, min_m, max_m }
    }

    pub fn update(&mut self, device: &Device) -> Result<()> {
        let params = device.parameters();
        let silent = params.get_bool(keys::SILENT, false);
        let alarm = params.get_bool(keys::ALARM, false);
        let distance = params.get_float(keys::CURRENT_DISTANCE_M, NO_READING_M);

        let value = intensity(distance, alarm, self.min_m, self.max_m);
        self.signal.set_flags(alarm, silent);
        self.signal.set_intensity(value as f32);

        debug!(
            "LED/beeper: distance={:.2} alarm={} silent={} intensity={:.2}",
            distance, alarm, silent, value
        );
        Ok(())
    }
}

/// Render intensity for a distance reading.
pub fn intensity(distance_m: f64, alarm: bool, min_m: f64, max_m: f64) -> f64 {
    if alarm {
        return 1.0;
    }
    if (min_m..=max_m).contains(&distance_m) && max_m > min_m {
        1.0 - (distance_m - min_m) / (max_m - min_m)
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn intensity_is_linear_inside_window() {
        assert!(close(intensity(0.1, false, 0.1, 1.0), 1.0));
        assert!(close(intensity(1.0, false, 0.1, 1.0), 0.0));
        assert!(close(intensity(0.55, false, 0.1, 1.0), 0.5));
    }

    #[test]
    fn outside_window_is_zero() {
        assert!(close(intensity(1.5, false, 0.1, 1.0), 0.0));
        assert!(close(intensity(0.05, false, 0.1, 1.0), 0.0));
        assert!(close(intensity(9999.0, false, 0.1, 1.0), 0.0));
    }

    #[test]
    fn alarm_forces_full_intensity() {
        assert!(close(intensity(5.0, true, 0.1, 1.0), 1.0));
    }

    #[test]
    fn update_publishes_to_signal() {
        let device = Device::new(4);
        let signal = Arc::new(AlarmSignal::new());
        let mut actor = LedBeeper::new(Arc::clone(&signal), 0.1, 1.0);

        actor.update(&device).unwrap();
        assert!(signal.intensity().abs() < f32::EPSILON, "no reading yet");

        device.parameters().set(keys::CURRENT_DISTANCE_M, 0.28);
        device.parameters().set(keys::SILENT, true);
        actor.update(&device).unwrap();
        assert!((signal.intensity() - 0.8).abs() < 1e-6);
        assert!(signal.silent());
        assert!(!signal.alarm());

        device.parameters().set(keys::ALARM, true);
        actor.update(&device).unwrap();
        assert!((signal.intensity() - 1.0).abs() < f32::EPSILON);
        assert!(signal.alarm());
    }
}
