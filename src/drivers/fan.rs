//! Cooling fan driver (LEDC PWM, 25 kHz, 11-bit).
//!
//! ## Fail-safe
//!
//! A request of 0 or below, 1 or above, or NaN drives full duty.  A fan
//! that is unexpectedly on costs a little power; one that is unexpectedly
//! off can cook the enclosure.
//!
//! ## Dual-target design
//!
//! On ESP-IDF: writes the LEDC duty register via hw_init helpers.
//! On host/test: tracks duty in-memory only.

use crate::drivers::hw_init;
use crate::error::ActuatorError;
use crate::pins;

/// Duty value for 100 % at 11-bit resolution.
pub const FAN_DUTY_FULL: u32 = 1 << pins::FAN_PWM_RESOLUTION_BITS;

/// Map a power request onto an LEDC duty value.
pub fn duty_for(power: f32) -> u32 {
    if power.is_nan() || power >= 1.0 || power <= 0.0 {
        FAN_DUTY_FULL
    } else {
        (FAN_DUTY_FULL as f32 * power) as u32
    }
}

pub struct FanDriver {
    channel: u32,
    duty: u32,
}

impl Default for FanDriver {
    fn default() -> Self {
        Self::new()
    }
}

impl FanDriver {
    /// The LEDC channel is configured with duty 0 by `hw_init`.
    pub fn new() -> Self {
        Self {
            channel: pins::FAN_LEDC_CHANNEL,
            duty: 0,
        }
    }

    pub fn set_power(&mut self, power: f32) -> Result<(), ActuatorError> {
        let duty = duty_for(power);
        hw_init::ledc_set_duty(self.channel, duty)?;
        self.duty = duty;
        Ok(())
    }

    /// Duty as a fraction of full scale.
    pub fn power(&self) -> f32 {
        self.duty as f32 / FAN_DUTY_FULL as f32
    }

    pub fn duty(&self) -> u32 {
        self.duty
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn in_range_power_scales_duty() {
        assert_eq!(duty_for(0.5), 1024);
        assert_eq!(duty_for(0.25), 512);
    }

    #[test]
    fn out_of_range_requests_run_full() {
        assert_eq!(duty_for(0.0), FAN_DUTY_FULL);
        assert_eq!(duty_for(-1.0), FAN_DUTY_FULL);
        assert_eq!(duty_for(1.0), FAN_DUTY_FULL);
        assert_eq!(duty_for(3.0), FAN_DUTY_FULL);
        assert_eq!(duty_for(f32::NAN), FAN_DUTY_FULL);
    }

    #[test]
    fn power_reads_back_duty_fraction() {
        let mut fan = FanDriver::new();
        assert_eq!(fan.power(), 0.0);
        fan.set_power(0.5).unwrap();
        assert!((fan.power() - 0.5).abs() < 1e-6);
        fan.set_power(0.0).unwrap();
        assert_eq!(fan.power(), 1.0);
    }
}
