//! Fuzz target: `RemoteCommand::from_json`
//!
//! Feeds arbitrary bytes through the inbound command decoder and checks
//! that it never panics and that decoded arguments are finite numbers.
//!
//! cargo fuzz run fuzz_command_decoder

#![no_main]

use greenhouse::app::commands::RemoteCommand;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    match RemoteCommand::from_json(data) {
        Ok(RemoteCommand::SetDesiredTemperature(c)) => assert!(c.is_finite()),
        Ok(RemoteCommand::SetFanPower(p)) => assert!(p.is_finite()),
        Ok(cmd) => {
            let _ = cmd.name();
        }
        Err(_) => {}
    }
});
