//! Sensor units: read hardware, write the device state.
//!
//! Each sensor wraps a port ([`ButtonInput`](crate::app::ports::ButtonInput),
//! [`DistanceInput`](crate::app::ports::DistanceInput)) and is registered
//! with the scheduler ahead of the actors.

pub mod button;
pub mod distance;
