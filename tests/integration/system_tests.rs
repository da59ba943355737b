//! End-to-end: the simulated system on real threads and wall-clock time.

use std::thread;
use std::time::{Duration, Instant};

use parkdistance::config::SystemConfig;
use parkdistance::device::parameters::keys;
use parkdistance::shutdown::Shutdown;
use parkdistance::system::SimulatedSystem;

fn wait_for(timeout: Duration, mut cond: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + timeout;
    while Instant::now() < deadline {
        if cond() {
            return true;
        }
        thread::sleep(Duration::from_millis(5));
    }
    cond()
}

#[test]
fn alarm_round_trip_and_clean_shutdown() {
    let mut config = SystemConfig::default();
    config.device.tick_frequency_hz = 50.0;
    config.backend.alarm_on_count = 3;
    config.backend.alarm_off_count = 10_000;

    let system = SimulatedSystem::start(&config, Shutdown::new()).unwrap();
    let shutdown = system.shutdown().clone();
    let outputs = system.outputs.clone();
    let lit_outputs = outputs.clone();
    let repository = system.repository.clone();

    let watcher = thread::spawn(move || {
        let lit = wait_for(Duration::from_secs(5), || lit_outputs.alarm_led.is_high());
        shutdown.trigger();
        lit
    });

    let device = std::sync::Arc::clone(&system.device);
    let report = system.run();

    assert!(watcher.join().unwrap(), "red indicator lit after the backend raised the alarm");
    assert!(report.ticks >= 3);
    assert_eq!(report.render, Some(Ok(())));
    assert!(report.backend_messages.unwrap() >= 3);
    assert!(repository.len() >= 3);
    assert!(device.parameters().get_bool(keys::ALARM, false));
    // Render thread switches everything off on exit.
    assert!(!outputs.alarm_led.is_high());
    assert!(!outputs.proximity_led.is_high());
    assert!(!outputs.buzzer.is_high());
}

#[test]
fn shutdown_before_first_tick_exits_immediately() {
    let shutdown = Shutdown::new();
    let system = SimulatedSystem::start(&SystemConfig::default(), shutdown.clone()).unwrap();
    shutdown.trigger();

    let started = Instant::now();
    let report = system.run();
    assert_eq!(report.ticks, 0);
    assert_eq!(report.render, Some(Ok(())));
    assert!(started.elapsed() < Duration::from_secs(2));
}

#[test]
fn invalid_config_is_refused_before_any_thread_starts() {
    let mut config = SystemConfig::default();
    config.device.button_hold_secs = 1e30;

    let err = SimulatedSystem::start(&config, Shutdown::new()).err().unwrap();
    assert_eq!(err.kind(), std::io::ErrorKind::InvalidInput);
}
