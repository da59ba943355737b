//! Console logger for the `log` facade, built on `env_logger`.
//!
//! Writes `[2024-05-01 17:03:12.123] INFO  target: message` lines to stderr.
//! Filters come from `PARKDISTANCE_LOG` in `env_logger` directive syntax
//! (`debug`, `warn,parkdistance::link=trace`, ...); unset means `info`.

use std::io::Write;

use chrono::Local;
use env_logger::{Builder, Env};
use log::{LevelFilter, Record, SetLoggerError};

/// Environment variable holding the filter directives.
pub const LEVEL_ENV: &str = "PARKDISTANCE_LOG";

const DEFAULT_FILTER: &str = "info";

fn format_line(timestamp: &str, record: &Record<'_>) -> String {
    format!(
        "[{}] {:<5} {}: {}",
        timestamp,
        record.level(),
        record.target(),
        record.args()
    )
}

fn builder(env: Env<'_>) -> Builder {
    let mut builder = Builder::from_env(env);
    builder.format(|buf, record| {
        let timestamp = Local::now().format("%Y-%m-%d %H:%M:%S%.3f").to_string();
        writeln!(buf, "{}", format_line(&timestamp, record))
    });
    builder
}

/// Install the console logger.  Fails if a logger is already installed.
/// Returns the most verbose level any directive enables.
pub fn init() -> Result<LevelFilter, SetLoggerError> {
    builder(Env::new().filter_or(LEVEL_ENV, DEFAULT_FILTER)).try_init()?;
    Ok(log::max_level())
}
