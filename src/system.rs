//! Host wiring: one simulated device plus the in-process backend on a
//! loopback broker.
//!
//! ```text
//!  main thread        alarm-render        device-link          backend
//!  ┌───────────┐      ┌───────────┐       ┌───────────┐        ┌──────────┐
//!  │ Scheduler │─────▶│ AlarmSig. │       │  Outbound │──pub──▶│  Router  │
//!  │  button   │      │ LEDs/buzz │       │   queue   │        │  ingest  │
//!  │  distance │      └───────────┘       │  inbound  │◀─bcast─│  alarm   │
//!  │  beeper   │────────────────────────▶ │  commands │        └──────────┘
//!  │  uplink   │     OutboundQueue        └───────────┘
//!  └───────────┘
//! ```

use std::io;
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;

use log::{error, info};

use crate::actors::led_beeper::LedBeeper;
use crate::actors::uplink::MeasurementUplink;
use crate::adapters::log_sink::LogEventSink;
use crate::adapters::sim_hardware::{PinHandle, SimDistance, SimInputPin, SimOutputPin};
use crate::backend::alarm::AlarmHandler;
use crate::backend::ingest::{IngestHandler, InMemoryRepository};
use crate::backend::{BackendRouter, BackendService};
use crate::config::SystemConfig;
use crate::device::Device;
use crate::drivers::alarm_driver::{AlarmIntensityDriver, AlarmSignal, RenderPolicy};
use crate::error::Result;
use crate::link::channels::OutboundQueue;
use crate::link::io_task::DeviceLink;
use crate::link::transport::LoopbackBroker;
use crate::pins;
use crate::scheduler::PeriodicScheduler;
use crate::sensors::button::{PinButton, SilentButton};
use crate::sensors::distance::DistanceSensor;
use crate::shutdown::{Shutdown, SystemClock};
use crate::units::DeviceUnit;

/// Unit type of the simulated device.
pub type SimUnit = DeviceUnit<PinButton<SimInputPin>, SimDistance, OutboundQueue>;

/// Handles onto the simulated output pins.
#[derive(Clone)]
pub struct Outputs {
    pub alarm_led: PinHandle,
    pub proximity_led: PinHandle,
    pub buzzer: PinHandle,
}

/// What the threads reported when they were joined.  `None` means the
/// thread panicked.
#[derive(Debug)]
pub struct RunReport {
    pub ticks: u64,
    pub backend_messages: Option<u64>,
    pub render: Option<Result<()>>,
}

pub struct SimulatedSystem {
    pub device: Arc<Device>,
    pub broker: LoopbackBroker,
    pub repository: InMemoryRepository,
    /// Silent button level; `false` (low) means pressed.
    pub button: PinHandle,
    pub outputs: Outputs,
    shutdown: Shutdown,
    scheduler: PeriodicScheduler<SimUnit, SystemClock, LogEventSink>,
    render: JoinHandle<Result<()>>,
    link: JoinHandle<()>,
    backend: JoinHandle<u64>,
}

impl SimulatedSystem {
    /// Validate `config`, build everything and start the render, link and
    /// backend threads.
    /// The scheduler runs on the caller's thread in [`Self::run`].
    pub fn start(config: &SystemConfig, shutdown: Shutdown) -> io::Result<Self> {
        config
            .validate()
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e.to_string()))?;
        let dev_cfg = &config.device;
        let device = Arc::new(Device::new(dev_cfg.ring_capacity));
        let broker = LoopbackBroker::new();

        // ── Backend ──────────────────────────────────────────────
        let repository = InMemoryRepository::with_retention(config.backend.max_documents);
        let mut router = BackendRouter::new();
        router.add_handler(IngestHandler::new(repository.clone()));
        router.add_handler(AlarmHandler::new(&config.backend, broker.connect("backend-broadcast")));
        let mut backend_in = broker.connect("backend");
        backend_in.subscribe(&config.backend.topic_ingest);
        let backend = BackendService::new(backend_in, router).spawn(shutdown.clone())?;

        // ── Render thread ────────────────────────────────────────
        let signal = Arc::new(AlarmSignal::new());
        let (led_a, alarm_led) = SimOutputPin::new("led-alarm", pins::LED_ALARM_GPIO);
        let (led_b, proximity_led) = SimOutputPin::new("led-proximity", pins::LED_PROXIMITY_GPIO);
        let (buzzer_pin, buzzer) = SimOutputPin::new("buzzer", pins::BUZZER_GPIO);
        let render = AlarmIntensityDriver::new(
            led_a,
            led_b,
            buzzer_pin,
            Arc::clone(&signal),
            RenderPolicy::from(dev_cfg),
        )
        .spawn(shutdown.clone())?;

        // ── Link thread ──────────────────────────────────────────
        let queue = OutboundQueue::new();
        let mut device_client = broker.connect("device-1");
        device_client.subscribe(&dev_cfg.topic_receive);
        let link = DeviceLink::new(device_client, queue.clone(), Arc::clone(&device), LogEventSink)
            .spawn(shutdown.clone())?;

        // ── Scheduler units ──────────────────────────────────────
        let (button_pin, button) = SimInputPin::new(true);
        let hold = Duration::from_secs_f32(dev_cfg.button_hold_secs);
        let mut scheduler = PeriodicScheduler::new(
            dev_cfg.tick_frequency_hz,
            SystemClock::new(shutdown.clone()),
            LogEventSink,
        );
        for unit in SimUnit::standard_set(
            SilentButton::new(PinButton::new(button_pin, hold)),
            DistanceSensor::new(SimDistance::new(1.2, 0.1, 0.05)),
            LedBeeper::new(signal, dev_cfg.distance_min_m, dev_cfg.distance_max_m),
            MeasurementUplink::new(queue, dev_cfg.topic_send.clone()),
        ) {
            scheduler.register(unit);
        }

        info!(
            "System: simulated device on GPIO button={} trigger={} echo={}",
            pins::BUTTON_GPIO,
            pins::DISTANCE_TRIGGER_GPIO,
            pins::DISTANCE_ECHO_GPIO
        );

        Ok(Self {
            device,
            broker,
            repository,
            button,
            outputs: Outputs {
                alarm_led,
                proximity_led,
                buzzer,
            },
            shutdown,
            scheduler,
            render,
            link,
            backend,
        })
    }

    pub fn shutdown(&self) -> &Shutdown {
        &self.shutdown
    }

    /// Run the scheduler until shutdown, then join every thread.
    pub fn run(mut self) -> RunReport {
        let ticks = self.scheduler.run_forever(&self.device);

        let render = self.render.join().ok();
        if render.is_none() {
            error!("System: render thread panicked");
        }
        if self.link.join().is_err() {
            error!("System: link thread panicked");
        }
        let backend_messages = self.backend.join().ok();
        if backend_messages.is_none() {
            error!("System: backend thread panicked");
        }

        RunReport {
            ticks,
            backend_messages,
            render,
        }
    }
}
