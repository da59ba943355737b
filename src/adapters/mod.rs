//! Adapters: concrete implementations of the hexagonal port traits.
//!
//! | Adapter        | Implements               | Connects to              |
//! |----------------|--------------------------|--------------------------|
//! | `console_log`  | `env_logger` setup       | stderr                   |
//! | `log_sink`     | EventSink                | `log` facade             |
//! | `sim_hardware` | DistanceInput            | simulated HC-SR04        |
//! |                | InputPin / OutputPin     | simulated GPIO           |
//!
//! The broker transport lives in [`crate::link::transport`].

pub mod console_log;
pub mod log_sink;
pub mod sim_hardware;
