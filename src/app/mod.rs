//! Application layer: port traits, inbound commands, outbound events.

pub mod commands;
pub mod events;
pub mod ports;
