//! Global alarm trigger.
//!
//! Counts every message the backend receives.  After `on_count` messages
//! the alarm is raised on all devices; after `off_count` more it is cleared
//! again, and the cycle repeats.
//!
//! ```text
//!            counter == on_count / ALARM_ON
//!   ┌──────────┐ ─────────────────────────▶ ┌──────────┐
//!   │ Inactive │                            │  Active  │
//!   └──────────┘ ◀───────────────────────── └──────────┘
//!            counter == off_count / ALARM_OFF
//! ```

use log::info;

use crate::app::commands::ControlCommand;
use crate::app::ports::OutboundPort;
use crate::backend::{BackendError, MessageHandler};
use crate::config::BackendConfig;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ThresholdAlarmTrigger {
    on_count: u32,
    off_count: u32,
    active: bool,
    counter: u32,
}

impl ThresholdAlarmTrigger {
    /// Zero thresholds are treated as 1.
    pub fn new(on_count: u32, off_count: u32) -> Self {
        Self {
            on_count: on_count.max(1),
            off_count: off_count.max(1),
            active: false,
            counter: 0,
        }
    }

    /// Count one event.  Returns the transition it caused, if any.
    pub fn on_event(&mut self) -> Option<ControlCommand> {
        self.counter += 1;
        let threshold = if self.active { self.off_count } else { self.on_count };
        if self.counter < threshold {
            return None;
        }

        self.counter = 0;
        self.active = !self.active;
        Some(if self.active {
            ControlCommand::AlarmOn
        } else {
            ControlCommand::AlarmOff
        })
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn counter(&self) -> u32 {
        self.counter
    }
}

/// Broadcasts the trigger's transitions to every device.
pub struct AlarmHandler<O> {
    trigger: ThresholdAlarmTrigger,
    outbound: O,
    topic: String,
}

impl<O: OutboundPort> AlarmHandler<O> {
    pub fn new(config: &BackendConfig, outbound: O) -> Self {
        Self {
            trigger: ThresholdAlarmTrigger::new(config.alarm_on_count, config.alarm_off_count),
            outbound,
            topic: config.topic_broadcast.clone(),
        }
    }

    pub fn trigger(&self) -> &ThresholdAlarmTrigger {
        &self.trigger
    }
}

impl<O: OutboundPort> MessageHandler for AlarmHandler<O> {
    fn name(&self) -> &'static str {
        "alarm"
    }

    fn handle(&mut self, _topic: &str, _message: &serde_json::Value) -> Result<(), BackendError> {
        let Some(cmd) = self.trigger.on_event() else {
            return Ok(());
        };

        match cmd {
            ControlCommand::AlarmOn => info!("Alarm: raising global alarm"),
            ControlCommand::AlarmOff => info!("Alarm: clearing global alarm"),
        }
        self.outbound.publish(&self.topic, &cmd.to_json())?;
        Ok(())
    }
}
