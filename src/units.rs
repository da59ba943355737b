//! The closed set of units a device registers with the scheduler.

use crate::actors::led_beeper::LedBeeper;
use crate::actors::uplink::MeasurementUplink;
use crate::app::ports::{ButtonInput, DistanceInput, OutboundPort};
use crate::device::Device;
use crate::error::Result;
use crate::scheduler::Unit;
use crate::sensors::button::SilentButton;
use crate::sensors::distance::DistanceSensor;

/// Sensors first, then actors; see [`DeviceUnit::standard_set`].
pub enum DeviceUnit<B, D, O> {
    Button(SilentButton<B>),
    Distance(DistanceSensor<D>),
    Beeper(LedBeeper),
    Uplink(MeasurementUplink<O>),
}

impl<B, D, O> DeviceUnit<B, D, O>
where
    B: ButtonInput,
    D: DistanceInput,
    O: OutboundPort,
{
    /// The parking-aid unit list in tick order.
    pub fn standard_set(
        button: SilentButton<B>,
        distance: DistanceSensor<D>,
        beeper: LedBeeper,
        uplink: MeasurementUplink<O>,
    ) -> [Self; 4] {
        [
            Self::Button(button),
            Self::Distance(distance),
            Self::Beeper(beeper),
            Self::Uplink(uplink),
        ]
    }
}

impl<B, D, O> Unit for DeviceUnit<B, D, O>
where
    B: ButtonInput,
    D: DistanceInput,
    O: OutboundPort,
{
    fn name(&self) -> &'static str {
        match self {
            Self::Button(_) => "silent-button",
            Self::Distance(_) => "distance",
            Self::Beeper(_) => "led-beeper",
            Self::Uplink(_) => "uplink",
        }
    }

    fn invoke(&mut self, device: &Device) -> Result<()> {
        match self {
            Self::Button(b) => b.poll(device.parameters()),
            Self::Distance(d) => d.poll(device),
            Self::Beeper(l) => l.update(device),
            Self::Uplink(u) => u.flush(device),
        }
    }
}
