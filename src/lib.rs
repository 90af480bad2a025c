//! Greenhouse node firmware library.
//!
//! Exposes the pure-logic modules for integration testing and external
//! inspection. All ESP-IDF-specific code is guarded by
//! `#[cfg(target_os = "espidf")]` within each module.

#![deny(unused_must_use)]

pub mod app;
pub mod config;
pub mod control;
pub mod error;
pub mod events;
pub mod pins;

// The ESP-IDF-only pieces inside these are cfg-gated; the host build
// gets simulation stubs.
pub mod adapters;
pub mod drivers;
pub mod sensors;

#[cfg(not(target_os = "espidf"))]
pub mod sim;
