//! The device context shared by every unit and thread.
//!
//! [`Device`] owns the [`ParameterStore`] and the measurement
//! [`RingBuffer`].  It is wrapped in an `Arc` and handed to the scheduler
//! thread (which passes `&Device` to each unit) and to the link thread
//! (which applies inbound commands).

pub mod parameters;
pub mod ring_buffer;

use std::sync::{Mutex, MutexGuard, PoisonError};

use parameters::ParameterStore;
use ring_buffer::RingBuffer;

pub struct Device {
    parameters: ParameterStore,
    measurements: Mutex<RingBuffer>,
}

impl Device {
    pub fn new(ring_capacity: usize) -> Self {
        Self {
            parameters: ParameterStore::new(),
            measurements: Mutex::new(RingBuffer::new(ring_capacity)),
        }
    }

    pub fn parameters(&self) -> &ParameterStore {
        &self.parameters
    }

    /// Exclusive access to the measurement buffer.  Hold the guard only for
    /// the duration of a push, a scan, or a mark; never across a hand-off.
    pub fn measurements(&self) -> MutexGuard<'_, RingBuffer> {
        self.measurements
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}
