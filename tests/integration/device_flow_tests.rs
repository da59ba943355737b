//! Integration tests: scheduler → sensor units → device state → actors.

use std::sync::Arc;

use parkdistance::actors::led_beeper::LedBeeper;
use parkdistance::actors::uplink::MeasurementUplink;
use parkdistance::app::commands::ControlCommand;
use parkdistance::app::ports::ButtonLevel::{NotPressed, Pressed};
use parkdistance::device::Device;
use parkdistance::device::parameters::keys;
use parkdistance::device::ring_buffer::Measurement;
use parkdistance::drivers::alarm_driver::{AlarmSignal, Indicator, RenderPolicy, RenderStep};
use parkdistance::error::SensorError;
use parkdistance::scheduler::PeriodicScheduler;
use parkdistance::sensors::button::SilentButton;
use parkdistance::sensors::distance::DistanceSensor;
use parkdistance::units::DeviceUnit;

use crate::mock_hw::{RecordingOutbound, RecordingSink, ScriptedButton, ScriptedDistance, VirtualClock};

type TestUnit = DeviceUnit<ScriptedButton, ScriptedDistance, RecordingOutbound>;

struct Rig {
    device: Device,
    scheduler: PeriodicScheduler<TestUnit, VirtualClock, RecordingSink>,
    button: ScriptedButton,
    distance: ScriptedDistance,
    outbound: RecordingOutbound,
    signal: Arc<AlarmSignal>,
    sink: RecordingSink,
}

fn rig(capacity: usize) -> Rig {
    let device = Device::new(capacity);
    let button = ScriptedButton::default();
    let distance = ScriptedDistance::constant(0.55);
    let outbound = RecordingOutbound::new();
    let signal = Arc::new(AlarmSignal::new());
    let sink = RecordingSink::default();

    let mut scheduler = PeriodicScheduler::new(1.0, VirtualClock::new(), sink.clone());
    for unit in TestUnit::standard_set(
        SilentButton::new(button.clone()),
        DistanceSensor::new(distance.clone()),
        LedBeeper::new(Arc::clone(&signal), 0.1, 1.0),
        MeasurementUplink::new(outbound.clone(), "parkdistance/dev/measurements"),
    ) {
        scheduler.register(unit);
    }

    Rig {
        device,
        scheduler,
        button,
        distance,
        outbound,
        signal,
        sink,
    }
}

#[test]
fn ring_holds_min_of_ticks_and_capacity() {
    for ticks in [3u64, 10, 25] {
        let mut r = rig(10);
        r.outbound.set_refusing(true);
        r.scheduler.run_ticks(&r.device, ticks);

        let ring = r.device.measurements();
        assert_eq!(ring.len() as u64, ticks.min(10));
        assert_eq!(ring.newest().map(Measurement::seq), Some(ticks - 1));
    }
}

#[test]
fn every_measurement_is_uplinked_once_in_order() {
    let mut r = rig(10);
    r.distance.push(Ok(0.3));
    r.distance.push(Ok(0.4));
    r.distance.push(Ok(0.5));
    r.scheduler.run_ticks(&r.device, 4);

    let payloads = r.outbound.payloads_json();
    let distances: Vec<f64> = payloads
        .iter()
        .map(|p| p["data"]["distance_m"].as_f64().unwrap())
        .collect();
    assert_eq!(distances, vec![0.55, 0.3, 0.4, 0.5]);
    assert!(payloads.iter().all(|p| p["command"] == "MEASUREMENT"));
    assert!(r.device.measurements().iter().all(Measurement::is_sent));
}

#[test]
fn outage_backlog_is_sent_after_recovery() {
    let mut r = rig(5);
    r.outbound.set_refusing(true);
    r.scheduler.run_ticks(&r.device, 8);
    assert_eq!(r.outbound.count(), 0);
    assert_eq!(r.sink.failures(), 8, "uplink reports each refused tick");

    r.outbound.set_refusing(false);
    r.scheduler.run_ticks(&r.device, 1);
    // Oldest three were evicted during the outage; the rest plus this
    // tick's reading go out now.
    assert_eq!(r.outbound.count(), 5);
    assert_eq!(r.device.measurements().pending_unsent().count(), 0);
}

#[test]
fn sent_flag_never_reverts() {
    let mut r = rig(4);
    r.scheduler.run_ticks(&r.device, 2);
    let sent_before: Vec<u64> = r
        .device
        .measurements()
        .iter()
        .filter(|m| m.is_sent())
        .map(Measurement::seq)
        .collect();

    r.outbound.set_refusing(true);
    r.scheduler.run_ticks(&r.device, 1);
    let ring = r.device.measurements();
    for seq in sent_before {
        assert!(ring.iter().find(|m| m.seq() == seq).is_none_or(Measurement::is_sent));
    }
}

#[test]
fn press_held_over_ticks_toggles_silent_once() {
    let mut r = rig(4);
    for level in [Pressed, Pressed, Pressed, NotPressed] {
        r.button.push(level);
    }
    r.scheduler.run_ticks(&r.device, 4);
    assert!(r.device.parameters().get_bool(keys::SILENT, false));
    assert!(r.signal.silent(), "beeper sees the toggle in the same tick");

    r.button.push(Pressed);
    r.scheduler.run_ticks(&r.device, 1);
    assert!(!r.device.parameters().get_bool(keys::SILENT, true));
}

#[test]
fn beeper_follows_distance_and_alarm() {
    let mut r = rig(4);
    r.scheduler.run_ticks(&r.device, 1);
    // 0.55 m in a 0.1–1.0 m window.
    assert!((r.signal.intensity() - 0.5).abs() < 1e-6);
    let step = RenderPolicy::default().plan(r.signal.intensity(), r.signal.alarm(), r.signal.silent());
    assert!(matches!(step, RenderStep::Blink { .. }));

    ControlCommand::AlarmOn.apply(r.device.parameters());
    r.scheduler.run_ticks(&r.device, 1);
    let step = RenderPolicy::default().plan(r.signal.intensity(), r.signal.alarm(), r.signal.silent());
    assert_eq!(step, RenderStep::Steady { indicator: Indicator::A, buzzer: true });

    ControlCommand::AlarmOff.apply(r.device.parameters());
    r.scheduler.run_ticks(&r.device, 1);
    assert!(!r.signal.alarm());
}

#[test]
fn sensor_failure_skips_only_that_tick() {
    let mut r = rig(4);
    r.distance.push(Ok(0.2));
    r.distance.push(Err(SensorError::EchoTimeout));
    r.distance.push(Ok(0.9));
    r.scheduler.run_ticks(&r.device, 4);

    let values: Vec<f64> = r.device.measurements().iter().map(Measurement::distance_m).collect();
    assert_eq!(values, vec![0.55, 0.2, 0.9]);
    assert_eq!(r.sink.failures(), 1);
    assert_eq!(r.outbound.count(), 3);
}
