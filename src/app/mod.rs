//! Application core: pure domain logic, zero I/O.
//!
//! The greenhouse rules live here: which tick does what, how remote
//! commands map onto actuators, what the telemetry and status screen
//! show.  All interaction with hardware happens through **port traits**
//! defined in [`ports`], keeping this layer fully testable without real
//! peripherals.

pub mod commands;
pub mod events;
pub mod ports;
pub mod screen;
pub mod service;
pub mod telemetry;
