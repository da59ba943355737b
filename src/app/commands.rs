//! Inbound commands from the backend.
//!
//! The backend broadcasts `{"command": "ALARM_ON" | "ALARM_OFF"}` to every
//! device.  The link thread parses each payload into a [`ControlCommand`]
//! and applies it to the [`ParameterStore`].  Anything else is ignored.

use log::{debug, warn};

use crate::device::parameters::{keys, ParamValue, ParameterStore};

/// Commands the backend can send to a device.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlCommand {
    /// Raise the global alarm: steady red indicator, buzzer on.
    AlarmOn,
    /// Clear the global alarm.
    AlarmOff,
}

impl ControlCommand {
    /// Parse a raw broker payload.  The command name is matched
    /// case-insensitively; malformed payloads and unknown commands yield
    /// `None`.
    pub fn parse(payload: &[u8]) -> Option<Self> {
        let value: serde_json::Value = match serde_json::from_slice(payload) {
            Ok(v) => v,
            Err(e) => {
                warn!("Ignoring malformed command payload: {}", e);
                return None;
            }
        };

        let command = value
            .get("command")
            .and_then(serde_json::Value::as_str)
            .unwrap_or_default()
            .to_ascii_uppercase();

        match command.as_str() {
            "ALARM_ON" => Some(Self::AlarmOn),
            "ALARM_OFF" => Some(Self::AlarmOff),
            other => {
                debug!("Ignoring command '{}'", other);
                None
            }
        }
    }

    /// Serialise to the broadcast wire format.
    pub fn to_json(self) -> Vec<u8> {
        match self {
            Self::AlarmOn => br#"{"command":"ALARM_ON"}"#.to_vec(),
            Self::AlarmOff => br#"{"command":"ALARM_OFF"}"#.to_vec(),
        }
    }

    /// Apply to the device parameters.  `alarm` and `silent` are written as
    /// a pair: an operator who muted the buzzer hears a new alarm again.
    pub fn apply(self, parameters: &ParameterStore) {
        let alarm = matches!(self, Self::AlarmOn);
        parameters.set_many(&[
            (keys::ALARM, ParamValue::Bool(alarm)),
            (keys::SILENT, ParamValue::Bool(false)),
        ]);
    }
}
