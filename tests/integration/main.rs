//! Integration test driver for `tests/integration/` submodule.
//!
//! Each `mod` below maps to a file that exercises a specific subsystem
//! against mock adapters or the simulated peripherals in `greenhouse::sim`.
//! All tests run on the host (x86_64) with no real hardware required.

#![cfg(not(target_os = "espidf"))]

mod app_service_tests;
mod dimmer_tests;
mod frame_reader_tests;
mod mock_hw;
