//! ParkDistance: host entry point.
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────────┐
//! │                      Adapters (outer ring)                     │
//! │                                                                │
//! │  SimDistance   SimInputPin   SimOutputPin   LoopbackBroker     │
//! │  (Distance)    (button)      (LEDs/buzzer)  (Outbound+Inbound) │
//! │  LogEventSink  console_log                                     │
//! │                                                                │
//! │  ──────────────── Port Trait Boundary ───────────────────      │
//! │                                                                │
//! │  ┌────────────────────────────────────────────────────────┐    │
//! │  │  Device units · AlarmIntensityDriver · Backend router  │    │
//! │  └────────────────────────────────────────────────────────┘    │
//! │                                                                │
//! │  PeriodicScheduler (main thread) · link / render / backend     │
//! └────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Usage: `parkdistance [config.json]`.  On stdin, `b` toggles the silent
//! button (press/release) and `q` shuts down; Ctrl-C shuts down too.  EOF on
//! stdin only ends the console, so the binary keeps running detached from a
//! terminal (`< /dev/null`) until interrupted.
#![deny(unused_must_use)]

use std::io::BufRead;
use std::path::PathBuf;

use anyhow::{Context, Result};
use log::{info, warn};

use parkdistance::adapters::console_log;
use parkdistance::adapters::sim_hardware::PinHandle;
use parkdistance::config::SystemConfig;
use parkdistance::shutdown::Shutdown;
use parkdistance::system::SimulatedSystem;
use parkdistance::task::spawn_named;

const DEFAULT_CONFIG: &str = "parkdistance.json";

fn main() -> Result<()> {
    // ── 1. Logging ────────────────────────────────────────────
    let level = console_log::init().context("installing console logger")?;

    info!("╔══════════════════════════════════════╗");
    info!("║  ParkDistance v{:<22}║", env!("CARGO_PKG_VERSION"));
    info!("╚══════════════════════════════════════╝");
    info!("Log level: {}", level);

    // ── 2. Config ─────────────────────────────────────────────
    let path = std::env::args_os()
        .nth(1)
        .map_or_else(|| PathBuf::from(DEFAULT_CONFIG), PathBuf::from);
    let config = SystemConfig::load_or_default(&path)?;

    // ── 3. Threads ────────────────────────────────────────────
    let shutdown = Shutdown::new();
    let system = SimulatedSystem::start(&config, shutdown.clone())
        .context("starting device and backend threads")?;

    let _interrupt = shutdown
        .trigger_on_interrupt()
        .context("installing Ctrl-C handler")?;

    let button = system.button.clone();
    let _console = spawn_named("console", 16, move || watch_console(&shutdown, &button))
        .context("spawning console watcher")?;

    info!("Running; 'b' + Enter toggles the silent button, 'q' + Enter or Ctrl-C quits");

    // ── 4. Scheduler on the main thread until shutdown ────────
    let report = system.run();
    info!(
        "Shutdown complete: {} tick(s), {} backend message(s)",
        report.ticks,
        report.backend_messages.unwrap_or_default()
    );

    match report.render {
        Some(Ok(())) => Ok(()),
        Some(Err(e)) => Err(anyhow::anyhow!("alarm render thread failed: {e}")),
        None => Err(anyhow::anyhow!("alarm render thread panicked")),
    }
}

/// Operator console: `q` quits, `b` toggles the button level.
fn watch_console(shutdown: &Shutdown, button: &PinHandle) {
    for line in std::io::stdin().lock().lines() {
        let Ok(line) = line else { break };
        match line.trim() {
            "q" | "quit" => {
                info!("Shutdown requested");
                shutdown.trigger();
                break;
            }
            "b" => {
                // Active low: pressed while the line is low.
                let pressed = button.is_high();
                button.set_high(!pressed);
                info!("Button {}", if pressed { "pressed" } else { "released" });
            }
            "" => {}
            other => warn!("Unknown console command '{}'", other),
        }
    }
    info!("Console closed");
}
