//! Mock hardware and ports for integration tests.
//!
//! Inputs replay a script; outputs record every call so tests can assert on
//! the full history.  Shared state sits behind `Arc<Mutex<_>>` so a test can
//! keep a handle after moving the mock into a unit.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use parkdistance::app::events::AppEvent;
use parkdistance::app::ports::{ButtonInput, ButtonLevel, Clock, DistanceInput, EventSink, OutboundPort};
use parkdistance::error::{CommsError, SensorError};

// ── Inputs ────────────────────────────────────────────────────

/// Button that replays a script, then reports `NotPressed`.
#[derive(Clone, Default)]
pub struct ScriptedButton {
    script: Arc<Mutex<VecDeque<ButtonLevel>>>,
}

#[allow(dead_code)]
impl ScriptedButton {
    pub fn new(levels: &[ButtonLevel]) -> Self {
        Self {
            script: Arc::new(Mutex::new(levels.iter().copied().collect())),
        }
    }

    pub fn push(&self, level: ButtonLevel) {
        self.script.lock().unwrap().push_back(level);
    }
}

impl ButtonInput for ScriptedButton {
    fn read(&mut self) -> Result<ButtonLevel, SensorError> {
        Ok(self.script.lock().unwrap().pop_front().unwrap_or(ButtonLevel::NotPressed))
    }
}

/// Distance sensor that replays readings, repeating the last one.
#[derive(Clone)]
pub struct ScriptedDistance {
    readings: Arc<Mutex<VecDeque<Result<f64, SensorError>>>>,
    last: Arc<Mutex<Result<f64, SensorError>>>,
}

#[allow(dead_code)]
impl ScriptedDistance {
    pub fn constant(metres: f64) -> Self {
        Self::new(&[Ok(metres)])
    }

    pub fn new(readings: &[Result<f64, SensorError>]) -> Self {
        Self {
            readings: Arc::new(Mutex::new(readings.iter().copied().collect())),
            last: Arc::new(Mutex::new(Err(SensorError::EchoTimeout))),
        }
    }

    pub fn push(&self, reading: Result<f64, SensorError>) {
        self.readings.lock().unwrap().push_back(reading);
    }
}

impl DistanceInput for ScriptedDistance {
    fn measure_m(&mut self) -> Result<f64, SensorError> {
        let mut last = self.last.lock().unwrap();
        if let Some(next) = self.readings.lock().unwrap().pop_front() {
            *last = next;
        }
        *last
    }
}

// ── Outputs ───────────────────────────────────────────────────

/// Outbound port that records payloads and can be switched to refuse.
#[derive(Clone, Default)]
pub struct RecordingOutbound {
    pub sent: Arc<Mutex<Vec<(String, Vec<u8>)>>>,
    refuse: Arc<Mutex<bool>>,
}

#[allow(dead_code)]
impl RecordingOutbound {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_refusing(&self, refuse: bool) {
        *self.refuse.lock().unwrap() = refuse;
    }

    pub fn count(&self) -> usize {
        self.sent.lock().unwrap().len()
    }

    pub fn payloads_json(&self) -> Vec<serde_json::Value> {
        self.sent
            .lock()
            .unwrap()
            .iter()
            .map(|(_, p)| serde_json::from_slice(p).unwrap())
            .collect()
    }
}

impl OutboundPort for RecordingOutbound {
    fn publish(&mut self, topic: &str, payload: &[u8]) -> Result<(), CommsError> {
        if *self.refuse.lock().unwrap() {
            return Err(CommsError::Disconnected);
        }
        self.sent.lock().unwrap().push((topic.to_owned(), payload.to_vec()));
        Ok(())
    }
}

/// Event sink that keeps every event.
#[derive(Clone, Default)]
pub struct RecordingSink {
    pub events: Arc<Mutex<Vec<AppEvent>>>,
}

#[allow(dead_code)]
impl RecordingSink {
    pub fn failures(&self) -> usize {
        self.events
            .lock()
            .unwrap()
            .iter()
            .filter(|e| matches!(e, AppEvent::UnitFailed { .. }))
            .count()
    }
}

impl EventSink for RecordingSink {
    fn emit(&mut self, event: &AppEvent) {
        self.events.lock().unwrap().push(event.clone());
    }
}

// ── Time ──────────────────────────────────────────────────────

/// Clock whose sleeps advance virtual time instantly.
#[derive(Clone)]
pub struct VirtualClock {
    base: Instant,
    offset: Arc<Mutex<Duration>>,
}

#[allow(dead_code)]
impl VirtualClock {
    pub fn new() -> Self {
        Self {
            base: Instant::now(),
            offset: Arc::new(Mutex::new(Duration::ZERO)),
        }
    }

    pub fn elapsed(&self) -> Duration {
        *self.offset.lock().unwrap()
    }
}

impl Clock for VirtualClock {
    fn now(&self) -> Instant {
        self.base + *self.offset.lock().unwrap()
    }

    fn sleep(&self, duration: Duration) -> bool {
        *self.offset.lock().unwrap() += duration;
        true
    }
}
