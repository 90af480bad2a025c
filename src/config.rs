//! System configuration parameters
//!
//! All tunable parameters for the greenhouse node: task cadences, loop
//! gains, output bounds and the mains/TRIAC timing the phase controller
//! depends on.

use serde::{Deserialize, Serialize};

use crate::control::power_curve::{PowerCurve, half_cycle_us};
use crate::error::{Error, Result};

/// Longest accepted `host:port` string for the telemetry peer.
pub const SERVER_ADDR_CAP: usize = 64;

/// Core system configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SystemConfig {
    // --- Timing ---
    /// Single-wire sensor sampling period (milliseconds)
    pub sensor_read_interval_ms: u32,
    /// Analog probe sampling period (milliseconds)
    pub probe_read_interval_ms: u32,
    /// Feedback-loop tick period (milliseconds)
    pub control_loop_interval_ms: u32,
    /// Telemetry send period (milliseconds)
    pub telemetry_interval_ms: u32,
    /// Status screen refresh period (milliseconds)
    pub display_refresh_interval_ms: u32,
    /// Inbound command poll period (milliseconds)
    pub command_poll_interval_ms: u32,

    // --- Feedback loop ---
    pub pid_kp: f32,
    pub pid_ki: f32,
    pub pid_kd: f32,
    /// Setpoint (°C) until a remote command changes it
    pub initial_setpoint_c: f32,
    /// Lower clamp of the bulb power fraction
    pub bulb_power_min: f32,
    /// Upper clamp of the bulb power fraction
    pub bulb_power_max: f32,

    // --- Phase control ---
    /// 50 or 60
    pub mains_frequency_hz: u32,
    /// TRIAC gate pulse width (microseconds)
    pub trigger_pulse_us: u32,

    // --- Network ---
    /// Telemetry peer as `host:port`
    pub server_addr: heapless::String<SERVER_ADDR_CAP>,
}

impl Default for SystemConfig {
    fn default() -> Self {
        let mut server_addr = heapless::String::new();
        // Fits SERVER_ADDR_CAP.
        let _ = server_addr.push_str("192.168.1.100:5000");

        Self {
            // Timing
            sensor_read_interval_ms: 2000,
            probe_read_interval_ms: 2000,
            control_loop_interval_ms: 250,
            telemetry_interval_ms: 2000,
            display_refresh_interval_ms: 3000,
            command_poll_interval_ms: 500,

            // Feedback loop
            pid_kp: 0.8,
            pid_ki: 0.005,
            pid_kd: 0.001,
            initial_setpoint_c: 0.0,
            bulb_power_min: 0.0,
            bulb_power_max: 1.0,

            // Phase control
            mains_frequency_hz: 60,
            trigger_pulse_us: 20,

            server_addr,
        }
    }
}

impl SystemConfig {
    /// Reject values the firmware cannot run with.
    pub fn validate(&self) -> Result<()> {
        let intervals = [
            (self.sensor_read_interval_ms, "sensor_read_interval_ms must be > 0"),
            (self.probe_read_interval_ms, "probe_read_interval_ms must be > 0"),
            (self.control_loop_interval_ms, "control_loop_interval_ms must be > 0"),
            (self.telemetry_interval_ms, "telemetry_interval_ms must be > 0"),
            (self.display_refresh_interval_ms, "display_refresh_interval_ms must be > 0"),
            (self.command_poll_interval_ms, "command_poll_interval_ms must be > 0"),
        ];
        if let Some((_, msg)) = intervals.iter().find(|(ms, _)| *ms == 0) {
            return Err(Error::Config(*msg));
        }

        let in_unit = |v: f32| (0.0..=1.0).contains(&v);
        if !in_unit(self.bulb_power_min) || !in_unit(self.bulb_power_max) {
            return Err(Error::Config("bulb power bounds must lie in [0, 1]"));
        }
        if self.bulb_power_min > self.bulb_power_max {
            return Err(Error::Config("bulb_power_min exceeds bulb_power_max"));
        }
        if ![self.pid_kp, self.pid_ki, self.pid_kd, self.initial_setpoint_c]
            .iter()
            .all(|v| v.is_finite())
        {
            return Err(Error::Config("PID gains and setpoint must be finite"));
        }
        if self.mains_frequency_hz != 50 && self.mains_frequency_hz != 60 {
            return Err(Error::Config("mains_frequency_hz must be 50 or 60"));
        }
        if self.trigger_pulse_us == 0 {
            return Err(Error::Config("trigger_pulse_us must be > 0"));
        }
        if self.server_addr.is_empty() {
            return Err(Error::Config("server_addr must not be empty"));
        }
        Ok(())
    }

    /// Mains half-cycle length in microseconds.
    pub fn half_cycle_us(&self) -> u32 {
        half_cycle_us(self.mains_frequency_hz.max(1))
    }

    /// Step table matching the configured mains frequency.
    pub fn power_curve(&self) -> PowerCurve {
        PowerCurve::for_mains(self.mains_frequency_hz)
    }
}
