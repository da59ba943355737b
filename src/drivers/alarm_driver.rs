//! Blink/beep alarm renderer.
//!
//! Runs on its own thread, decoupled from the scheduler tick.  The
//! LED/beeper actor publishes a normalised intensity (0..1) plus the
//! `alarm` and `silent` flags into an [`AlarmSignal`]; this driver reloads
//! them at the start of every cycle and renders them onto two indicator
//! LEDs and a buzzer.
//!
//! ## Render policy
//!
//! | Intensity          | Indicators                        | Buzzer              |
//! |--------------------|-----------------------------------|---------------------|
//! | `< off_below`      | both off                          | off                 |
//! | `> steady_above`   | A (red) if alarm, else B (green)  | on unless silent    |
//! | otherwise          | B blinks at `max_blink_hz * i`    | beeps unless silent |
//!
//! A blink cycle is `half_period` on followed by `half_period` off.  Steady
//! and off states are re-evaluated every [`IDLE_POLL`].

use std::io;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::thread::JoinHandle;
use std::time::Duration;

use embedded_hal::digital::{OutputPin, PinState};
use log::{error, info};

use crate::config::DeviceConfig;
use crate::error::{ActuatorError, Result};
use crate::shutdown::Shutdown;
use crate::task::{spawn_named, DEFAULT_STACK_KB};

/// Re-check interval while the outputs are not blinking.
pub const IDLE_POLL: Duration = Duration::from_millis(20);

// ───────────────────────────────────────────────────────────────
// Shared signal
// ───────────────────────────────────────────────────────────────

/// Lock-free hand-over from the actor thread to the render thread.
#[derive(Debug, Default)]
pub struct AlarmSignal {
    /// `f32` bits, always within [0, 1].
    intensity: AtomicU32,
    alarm: AtomicBool,
    silent: AtomicBool,
}

impl AlarmSignal {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a new intensity, clamped to [0, 1].  NaN is treated as 0.
    pub fn set_intensity(&self, intensity: f32) {
        let clamped = if intensity.is_nan() { 0.0 } else { intensity.clamp(0.0, 1.0) };
        self.intensity.store(clamped.to_bits(), Ordering::Release);
    }

    pub fn intensity(&self) -> f32 {
        f32::from_bits(self.intensity.load(Ordering::Acquire))
    }

    pub fn set_flags(&self, alarm: bool, silent: bool) {
        self.alarm.store(alarm, Ordering::Release);
        self.silent.store(silent, Ordering::Release);
    }

    pub fn alarm(&self) -> bool {
        self.alarm.load(Ordering::Acquire)
    }

    pub fn silent(&self) -> bool {
        self.silent.load(Ordering::Acquire)
    }
}

// ───────────────────────────────────────────────────────────────
// Policy
// ───────────────────────────────────────────────────────────────

/// Which indicator is lit in the steady state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Indicator {
    /// Red: global alarm.
    A,
    /// Green: proximity.
    B,
}

/// One render decision.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RenderStep {
    AllOff,
    Steady { indicator: Indicator, buzzer: bool },
    Blink { half_period: Duration, buzzer: bool },
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RenderPolicy {
    pub off_below: f32,
    pub steady_above: f32,
    pub max_blink_hz: f32,
}

impl Default for RenderPolicy {
    fn default() -> Self {
        Self {
            off_below: 0.1,
            steady_above: 0.9,
            max_blink_hz: 15.0,
        }
    }
}

impl From<&DeviceConfig> for RenderPolicy {
    fn from(cfg: &DeviceConfig) -> Self {
        Self {
            off_below: cfg.intensity_off_below,
            steady_above: cfg.intensity_steady_above,
            max_blink_hz: cfg.max_blink_hz,
        }
    }
}

impl RenderPolicy {
    pub fn plan(&self, intensity: f32, alarm: bool, silent: bool) -> RenderStep {
        if intensity < self.off_below {
            return RenderStep::AllOff;
        }
        if intensity > self.steady_above {
            let indicator = if alarm { Indicator::A } else { Indicator::B };
            return RenderStep::Steady { indicator, buzzer: !silent };
        }

        let frequency = self.max_blink_hz * intensity;
        if !(frequency > 0.0) {
            return RenderStep::AllOff;
        }
        match Duration::try_from_secs_f32(1.0 / (2.0 * frequency)) {
            Ok(half_period) => RenderStep::Blink { half_period, buzzer: !silent },
            Err(_) => RenderStep::AllOff,
        }
    }
}

// ───────────────────────────────────────────────────────────────
// Driver
// ───────────────────────────────────────────────────────────────

pub struct AlarmIntensityDriver<A, B, Z> {
    indicator_a: A,
    indicator_b: B,
    buzzer: Z,
    signal: Arc<AlarmSignal>,
    policy: RenderPolicy,
}

impl<A, B, Z> AlarmIntensityDriver<A, B, Z>
where
    A: OutputPin,
    B: OutputPin,
    Z: OutputPin,
{
    pub fn new(
        indicator_a: A,
        indicator_b: B,
        buzzer: Z,
        signal: Arc<AlarmSignal>,
        policy: RenderPolicy,
    ) -> Self {
        Self {
            indicator_a,
            indicator_b,
            buzzer,
            signal,
            policy,
        }
    }

    /// Render until `shutdown` fires.  Outputs are switched off on exit.
    /// A pin write failure ends the loop with an error.
    pub fn run(&mut self, shutdown: &Shutdown) -> Result<()> {
        info!("Alarm driver: running ({:?})", self.policy);

        loop {
            let step = self.policy.plan(
                self.signal.intensity(),
                self.signal.alarm(),
                self.signal.silent(),
            );

            let completed = match step {
                RenderStep::AllOff => {
                    self.write(false, false, false)?;
                    shutdown.sleep(IDLE_POLL)
                }
                RenderStep::Steady { indicator, buzzer } => {
                    self.write(indicator == Indicator::A, indicator == Indicator::B, buzzer)?;
                    shutdown.sleep(IDLE_POLL)
                }
                RenderStep::Blink { half_period, buzzer } => {
                    self.write(false, true, buzzer)?;
                    if shutdown.sleep(half_period) {
                        self.write(false, false, false)?;
                        shutdown.sleep(half_period)
                    } else {
                        false
                    }
                }
            };

            if !completed {
                break;
            }
        }

        self.write(false, false, false)?;
        info!("Alarm driver: stopped");
        Ok(())
    }

    fn write(&mut self, a: bool, b: bool, buzzer: bool) -> Result<()> {
        self.indicator_a
            .set_state(PinState::from(a))
            .map_err(|_| ActuatorError::GpioWriteFailed)?;
        self.indicator_b
            .set_state(PinState::from(b))
            .map_err(|_| ActuatorError::GpioWriteFailed)?;
        self.buzzer
            .set_state(PinState::from(buzzer))
            .map_err(|_| ActuatorError::GpioWriteFailed)?;
        Ok(())
    }
}

impl<A, B, Z> AlarmIntensityDriver<A, B, Z>
where
    A: OutputPin + Send + 'static,
    B: OutputPin + Send + 'static,
    Z: OutputPin + Send + 'static,
{
    /// Move the driver onto its own thread.
    pub fn spawn(mut self, shutdown: Shutdown) -> io::Result<JoinHandle<Result<()>>> {
        spawn_named("alarm-render", DEFAULT_STACK_KB, move || {
            let result = self.run(&shutdown);
            if let Err(e) = result {
                error!("Alarm driver: fatal: {}", e);
            }
            result
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use core::convert::Infallible;
    use std::sync::Mutex;

    type Trace = Arc<Mutex<Vec<(&'static str, bool)>>>;

    struct TracePin {
        name: &'static str,
        trace: Trace,
    }

    impl embedded_hal::digital::ErrorType for TracePin {
        type Error = Infallible;
    }

    impl OutputPin for TracePin {
        fn set_low(&mut self) -> core::result::Result<(), Infallible> {
            self.trace.lock().unwrap().push((self.name, false));
            Ok(())
        }

        fn set_high(&mut self) -> core::result::Result<(), Infallible> {
            self.trace.lock().unwrap().push((self.name, true));
            Ok(())
        }
    }

    #[derive(Debug)]
    struct PinFault;

    impl embedded_hal::digital::Error for PinFault {
        fn kind(&self) -> embedded_hal::digital::ErrorKind {
            embedded_hal::digital::ErrorKind::Other
        }
    }

    struct BrokenPin;

    impl embedded_hal::digital::ErrorType for BrokenPin {
        type Error = PinFault;
    }

    impl OutputPin for BrokenPin {
        fn set_low(&mut self) -> core::result::Result<(), PinFault> {
            Err(PinFault)
        }

        fn set_high(&mut self) -> core::result::Result<(), PinFault> {
            Err(PinFault)
        }
    }

    fn traced_driver(
        signal: Arc<AlarmSignal>,
    ) -> (AlarmIntensityDriver<TracePin, TracePin, TracePin>, Trace) {
        let trace: Trace = Arc::default();
        let pin = |name| TracePin { name, trace: Arc::clone(&trace) };
        let driver = AlarmIntensityDriver::new(
            pin("a"),
            pin("b"),
            pin("buzzer"),
            signal,
            RenderPolicy::default(),
        );
        (driver, trace)
    }

    #[test]
    fn low_intensity_is_all_off() {
        let p = RenderPolicy::default();
        assert_eq!(p.plan(0.05, false, false), RenderStep::AllOff);
        assert_eq!(p.plan(0.0, true, false), RenderStep::AllOff);
    }

    #[test]
    fn high_intensity_is_steady() {
        let p = RenderPolicy::default();
        assert_eq!(
            p.plan(0.95, false, false),
            RenderStep::Steady { indicator: Indicator::B, buzzer: true }
        );
        assert_eq!(
            p.plan(0.95, false, true),
            RenderStep::Steady { indicator: Indicator::B, buzzer: false }
        );
        assert_eq!(
            p.plan(1.0, true, false),
            RenderStep::Steady { indicator: Indicator::A, buzzer: true }
        );
    }

    #[test]
    fn mid_intensity_blinks_proportionally() {
        let RenderStep::Blink { half_period, buzzer } = RenderPolicy::default().plan(0.5, false, false)
        else {
            panic!("expected blink");
        };
        // 15 Hz * 0.5 = 7.5 Hz
        assert!((half_period.as_secs_f64() - 1.0 / 15.0).abs() < 1e-4);
        assert!(buzzer);
    }

    #[test]
    fn zero_rate_blink_degrades_to_all_off() {
        let p = RenderPolicy {
            off_below: 0.0,
            ..RenderPolicy::default()
        };
        assert_eq!(p.plan(0.0, false, false), RenderStep::AllOff);

        let crawl = RenderPolicy {
            max_blink_hz: 1e-30,
            ..RenderPolicy::default()
        };
        assert_eq!(crawl.plan(0.5, false, false), RenderStep::AllOff);
    }

    #[test]
    fn signal_clamps_intensity() {
        let s = AlarmSignal::new();
        s.set_intensity(1.7);
        assert!((s.intensity() - 1.0).abs() < f32::EPSILON);
        s.set_intensity(-3.0);
        assert!(s.intensity().abs() < f32::EPSILON);
        s.set_intensity(f32::NAN);
        assert!(s.intensity().abs() < f32::EPSILON);
    }

    #[test]
    fn steady_alarm_lights_indicator_a_until_shutdown() {
        let signal = Arc::new(AlarmSignal::new());
        signal.set_intensity(1.0);
        signal.set_flags(true, false);
        let (driver, trace) = traced_driver(Arc::clone(&signal));

        let shutdown = Shutdown::new();
        let handle = driver.spawn(shutdown.clone()).unwrap();
        std::thread::sleep(Duration::from_millis(60));
        shutdown.trigger();
        assert_eq!(handle.join().unwrap(), Ok(()));

        let trace = trace.lock().unwrap();
        assert_eq!(&trace[..3], &[("a", true), ("b", false), ("buzzer", true)]);
        assert_eq!(&trace[trace.len() - 3..], &[("a", false), ("b", false), ("buzzer", false)]);
    }

    #[test]
    fn silent_blink_never_sounds_the_buzzer() {
        let signal = Arc::new(AlarmSignal::new());
        signal.set_intensity(0.9);
        signal.set_flags(false, true);
        let (driver, trace) = traced_driver(signal);

        let shutdown = Shutdown::new();
        let handle = driver.spawn(shutdown.clone()).unwrap();
        std::thread::sleep(Duration::from_millis(100));
        shutdown.trigger();
        handle.join().unwrap().unwrap();

        let trace = trace.lock().unwrap();
        assert!(trace.iter().any(|&(n, on)| n == "b" && on));
        assert!(!trace.iter().any(|&(n, on)| n == "buzzer" && on));
        assert!(!trace.iter().any(|&(n, on)| n == "a" && on));
    }

    #[test]
    fn pin_failure_is_fatal() {
        let signal = Arc::new(AlarmSignal::new());
        let mut driver = AlarmIntensityDriver::new(
            BrokenPin,
            BrokenPin,
            BrokenPin,
            signal,
            RenderPolicy::default(),
        );
        assert_eq!(
            driver.run(&Shutdown::new()),
            Err(Error::Actuator(ActuatorError::GpioWriteFailed))
        );
    }
}
