//! System configuration parameters
//!
//! All tunable parameters for the device and the backend.  Defaults match
//! the original parking-aid deployment; a JSON file can override any field.

use std::path::Path;

use anyhow::Context;
use log::{info, warn};
use serde::{Deserialize, Serialize};

use crate::app::ports::ConfigError;
use crate::device::ring_buffer::MAX_RING_CAPACITY;
use crate::link::channels::MAX_TOPIC_LEN;

/// Upper bound for `max_blink_hz`.
pub const MAX_BLINK_HZ: f32 = 50.0;
/// Upper bound for `button_hold_secs`.
pub const MAX_BUTTON_HOLD_SECS: f32 = 60.0;

/// Device-side configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DeviceConfig {
    // --- Timing ---
    /// Scheduler ticks per second
    pub tick_frequency_hz: f32,

    // --- Measurements ---
    /// Number of recent measurements retained for transmission
    pub ring_capacity: usize,
    /// Distance (metres) at and below which the alarm is continuous
    pub distance_min_m: f64,
    /// Distance (metres) above which the alarm is silent
    pub distance_max_m: f64,

    // --- Alarm rendering ---
    /// Intensity below which all outputs are off
    pub intensity_off_below: f32,
    /// Intensity above which outputs are steady
    pub intensity_steady_above: f32,
    /// Blink/beep frequency (Hz) at intensity 1.0
    pub max_blink_hz: f32,

    // --- Button ---
    /// Hold time (seconds) after which a press is reported as held
    pub button_hold_secs: f32,

    // --- Broker ---
    /// Topic measurements are published on
    pub topic_send: String,
    /// Topic backend commands arrive on
    pub topic_receive: String,
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            // Timing
            tick_frequency_hz: 1.0,

            // Measurements
            ring_capacity: 10,
            distance_min_m: 0.1,
            distance_max_m: 1.0,

            // Alarm rendering
            intensity_off_below: 0.1,
            intensity_steady_above: 0.9,
            max_blink_hz: 15.0,

            // Button
            button_hold_secs: 1.0,

            // Broker
            topic_send: "parkdistance/device-1/measurements".into(),
            topic_receive: "parkdistance/broadcast".into(),
        }
    }
}

impl DeviceConfig {
    /// Reject values the scheduler and driver cannot operate with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.tick_frequency_hz > 0.0 && self.tick_frequency_hz <= 100.0) {
            return Err(ConfigError::ValidationFailed("tick_frequency_hz must be in (0, 100]"));
        }
        if self.ring_capacity == 0 || self.ring_capacity > MAX_RING_CAPACITY {
            return Err(ConfigError::ValidationFailed("ring_capacity must be in 1..=64"));
        }
        if !(self.distance_min_m >= 0.0 && self.distance_min_m < self.distance_max_m) {
            return Err(ConfigError::ValidationFailed("distance_min_m must be below distance_max_m"));
        }
        // Intensity 0 must fall in the off band, not blink at 0 Hz.
        if !(0.0 < self.intensity_off_below
            && self.intensity_off_below < self.intensity_steady_above
            && self.intensity_steady_above <= 1.0)
        {
            return Err(ConfigError::ValidationFailed("intensity thresholds must satisfy 0 < off < steady <= 1"));
        }
        if !(self.max_blink_hz > 0.0 && self.max_blink_hz <= MAX_BLINK_HZ) {
            return Err(ConfigError::ValidationFailed("max_blink_hz must be in (0, 50]"));
        }
        if !(0.0..=MAX_BUTTON_HOLD_SECS).contains(&self.button_hold_secs) {
            return Err(ConfigError::ValidationFailed("button_hold_secs must be in [0, 60]"));
        }
        if self.topic_send.is_empty() || self.topic_receive.is_empty() {
            return Err(ConfigError::ValidationFailed("topics must not be empty"));
        }
        if self.topic_send.len() > MAX_TOPIC_LEN {
            return Err(ConfigError::ValidationFailed("topic_send longer than 96 bytes"));
        }
        Ok(())
    }
}

/// Backend-side configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BackendConfig {
    /// Messages counted before a global alarm is raised
    pub alarm_on_count: u32,
    /// Messages counted while alarmed before the alarm is cleared
    pub alarm_off_count: u32,
    /// Topic filter for measurements from all devices (`+`/`#` wildcards)
    pub topic_ingest: String,
    /// Topic alarm broadcasts are published on
    pub topic_broadcast: String,
    /// Documents kept by the in-memory repository; oldest dropped first
    pub max_documents: usize,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            alarm_on_count: 30,
            alarm_off_count: 10,
            topic_ingest: "parkdistance/+/measurements".into(),
            topic_broadcast: "parkdistance/broadcast".into(),
            max_documents: 10_000,
        }
    }
}

impl BackendConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.alarm_on_count == 0 || self.alarm_off_count == 0 {
            return Err(ConfigError::ValidationFailed("alarm thresholds must be non-zero"));
        }
        if self.topic_ingest.is_empty() || self.topic_broadcast.is_empty() {
            return Err(ConfigError::ValidationFailed("topics must not be empty"));
        }
        if self.max_documents == 0 {
            return Err(ConfigError::ValidationFailed("max_documents must be non-zero"));
        }
        Ok(())
    }
}

/// Top-level file layout: `{ "device": {...}, "backend": {...} }`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SystemConfig {
    pub device: DeviceConfig,
    pub backend: BackendConfig,
}

impl SystemConfig {
    /// Load from a JSON file.  A missing file yields defaults; a present but
    /// unreadable or invalid file is an error.
    pub fn load_or_default(path: &Path) -> anyhow::Result<Self> {
        if !path.exists() {
            warn!("Config {} not found, using defaults", path.display());
            return Ok(Self::default());
        }

        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("reading {}", path.display()))?;
        let config: Self = serde_json::from_str(&raw)
            .with_context(|| format!("parsing {}", path.display()))?;
        config.validate().map_err(|e| anyhow::anyhow!("{}: {e}", path.display()))?;

        info!("Config loaded from {}", path.display());
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.device.validate()?;
        self.backend.validate()
    }
}
