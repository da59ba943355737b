//! Fuzz target: `ControlCommand::parse`
//!
//! Drives arbitrary broker payloads through the inbound command parser and
//! asserts that it never panics and that anything it accepts survives a
//! trip through the broadcast wire format and applies cleanly.
//!
//! cargo fuzz run fuzz_inbound_command

#![no_main]

use libfuzzer_sys::fuzz_target;
use parkdistance::app::commands::ControlCommand;
use parkdistance::device::parameters::{keys, ParameterStore};

fuzz_target!(|data: &[u8]| {
    let Some(cmd) = ControlCommand::parse(data) else {
        return;
    };

    assert_eq!(ControlCommand::parse(&cmd.to_json()), Some(cmd));

    let params = ParameterStore::new();
    params.set(keys::SILENT, true);
    cmd.apply(&params);
    assert_eq!(params.get_bool(keys::ALARM, false), cmd == ControlCommand::AlarmOn);
    assert!(!params.get_bool(keys::SILENT, true), "a command must clear silent");
});
