//! ParkDistance controller library.
//!
//! A parking-distance aid: a fixed-frequency scheduler polls the silent
//! button and the ultrasonic sensor, derives a blink/beep intensity, and
//! uplinks measurements to a broker; a separate thread renders the
//! intensity onto two LEDs and a buzzer; the backend stores measurements
//! and raises a global alarm.
//!
//! Hardware and broker access go through the port traits in
//! [`app::ports`]; [`system`] wires the simulated host build.

#![deny(unused_must_use)]

pub mod actors;
pub mod adapters;
pub mod app;
pub mod backend;
pub mod config;
pub mod device;
pub mod drivers;
pub mod error;
pub mod link;
pub mod pins;
pub mod scheduler;
pub mod sensors;
pub mod shutdown;
pub mod system;
pub mod task;
pub mod units;
