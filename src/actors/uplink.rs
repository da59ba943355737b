//! Measurement uplink actor.
//!
//! Each tick, hands every unsent measurement to the outbound channel as
//!
//! ```json
//! {"command":"MEASUREMENT","data":{"distance_m":0.42,"datetime_iso":"2024-05-01T17:03:12.123456"}}
//! ```
//!
//! and marks it sent only after the channel accepted it.  The buffer lock
//! is not held during the hand-off.  On the first refusal the rest of the
//! backlog waits for the next tick, oldest first.

use log::{debug, warn};
use serde::Serialize;

use crate::app::ports::OutboundPort;
use crate::device::Device;
use crate::device::ring_buffer::Measurement;
use crate::error::{CommsError, Result};

/// Outward measurement envelope.
#[derive(Debug, Serialize)]
pub struct MeasurementEnvelope<'a> {
    pub command: &'static str,
    pub data: MeasurementData<'a>,
}

#[derive(Debug, Serialize)]
pub struct MeasurementData<'a> {
    pub distance_m: f64,
    pub datetime_iso: &'a str,
}

/// Encode one measurement for the broker.
pub fn encode(measurement: &Measurement) -> core::result::Result<Vec<u8>, CommsError> {
    let iso = measurement.datetime_iso();
    let envelope = MeasurementEnvelope {
        command: "MEASUREMENT",
        data: MeasurementData {
            distance_m: measurement.distance_m(),
            datetime_iso: &iso,
        },
    };
    serde_json::to_vec(&envelope).map_err(|_| CommsError::EncodeFailed)
}

pub struct MeasurementUplink<O> {
    outbound: O,
    topic: String,
}

impl<O: OutboundPort> MeasurementUplink<O> {
    pub fn new(outbound: O, topic: impl Into<String>) -> Self {
        Self {
            outbound,
            topic: topic.into(),
        }
    }

    pub fn outbound_mut(&mut self) -> &mut O {
        &mut self.outbound
    }

    pub fn flush(&mut self, device: &Device) -> Result<()> {
        let pending: Vec<Measurement> = device.measurements().pending_unsent().copied().collect();

        for measurement in pending {
            let payload = encode(&measurement)?;
            if let Err(e) = self.outbound.publish(&self.topic, &payload) {
                warn!(
                    "Uplink: hand-off of measurement {} failed ({}), retrying next tick",
                    measurement.seq(),
                    e
                );
                return Err(e.into());
            }
            if !device.measurements().mark_sent(measurement.seq()) {
                debug!("Uplink: measurement {} evicted before it was marked", measurement.seq());
            }
        }
        Ok(())
    }
}
