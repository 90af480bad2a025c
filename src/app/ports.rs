//! Port traits: the hexagonal boundary between domain logic and the outside world.
//!
//! ```text
//!   Adapter ──▶ Port trait ──▶ AppService (domain)
//! ```
//!
//! Driven adapters (sensors, actuators, event sinks, the network link, the
//! character display) implement these traits.  The
//! [`AppService`](super::service::AppService) consumes them via generics,
//! so the domain core never touches hardware directly.

use crate::error::{ActuatorError, CommsError, DimmerError, SensorError};
use crate::sensors::frame::ClimateReading;

// ───────────────────────────────────────────────────────────────
// Sensor ports (driven adapter: hardware → domain)
// ───────────────────────────────────────────────────────────────

/// Read-side port for the two temperature channels.
pub trait ClimateSensorPort {
    /// True once the single-wire sensor completed its diagnostic read.
    fn climate_ready(&self) -> bool;

    /// Acquire one humidity/temperature frame.
    fn sample_climate(&mut self) -> Result<ClimateReading, SensorError>;

    /// Cached reading; zeros after a failed acquisition.
    fn last_climate(&self) -> ClimateReading;

    fn probe_ready(&self) -> bool;

    /// Sample the analog probe in °C.
    fn sample_probe(&mut self) -> Result<f32, SensorError>;

    fn last_probe_celsius(&self) -> f32;
}

/// Calibrated ADC channel.
pub trait VoltageSource {
    fn read_calibrated_mv(&mut self) -> Result<i32, SensorError>;
}

// ───────────────────────────────────────────────────────────────
// Actuator port (driven adapter: domain → hardware)
// ───────────────────────────────────────────────────────────────

/// Write-side port: the domain calls this to command actuators.
pub trait ActuatorPort {
    /// True when the phase controller initialised and accepts power.
    fn dimmer_ready(&self) -> bool;

    /// Command bulb power in [0, 1]; returns the firing delay now in effect.
    fn set_bulb_power(&mut self, power: f32) -> Result<u32, DimmerError>;

    /// Set fan power in [0, 1].
    fn set_fan_power(&mut self, power: f32) -> Result<(), ActuatorError>;

    /// Current fan duty as a fraction of full scale.
    fn fan_power(&self) -> f32;

    /// Flip the irrigation output; returns the new level.
    fn toggle_irrigation(&mut self) -> Result<bool, ActuatorError>;

    fn irrigation_on(&self) -> bool;

}

// ───────────────────────────────────────────────────────────────
// Event sink port (driven adapter: domain → logging)
// ───────────────────────────────────────────────────────────────

/// The domain emits structured [`AppEvent`](super::events::AppEvent)s
/// through this port.
pub trait EventSink {
    fn emit(&mut self, event: &super::events::AppEvent);
}

// ───────────────────────────────────────────────────────────────
// Network link ports (driven adapter: domain ↔ telemetry peer)
// ───────────────────────────────────────────────────────────────

/// Outbound telemetry.
pub trait TelemetryPort {
    fn send(&mut self, payload: &str) -> Result<(), CommsError>;
}

/// Inbound command messages.
pub trait CommandPort {
    /// Non-blocking poll.  `Ok(None)` means nothing is pending;
    /// `Ok(Some(n))` means `buf[..n]` holds one message.
    fn poll(&mut self, buf: &mut [u8]) -> Result<Option<usize>, CommsError>;
}

// ───────────────────────────────────────────────────────────────
// Display port
// ───────────────────────────────────────────────────────────────

/// Character display addressed by column/row.
pub trait DisplayPort {
    fn write_at(&mut self, col: u8, row: u8, text: &str) -> Result<(), ActuatorError>;
}
