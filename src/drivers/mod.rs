//! Actuator drivers that run outside the scheduler tick.

pub mod alarm_driver;
