//! Hardware adapter: bridges real peripherals to domain port traits.
//!
//! [`HardwareAdapter`] owns the fan and irrigation drivers and borrows
//! the dimmer's shared [`PhaseControl`], exposing them through
//! [`ActuatorPort`].  [`AdcChannel`] puts a calibrated ADC1 channel behind
//! [`VoltageSource`].  On non-espidf targets the underlying drivers use
//! cfg-gated simulation stubs.

use crate::app::ports::{ActuatorPort, VoltageSource};
use crate::drivers::fan::FanDriver;
use crate::drivers::hw_init;
use crate::drivers::irrigation::IrrigationValve;
use crate::drivers::zero_cross::PhaseControl;
use crate::error::{ActuatorError, DimmerError, SensorError};

/// Concrete adapter that combines all actuators behind the port trait.
pub struct HardwareAdapter<'a> {
    dimmer: &'a PhaseControl,
    fan: FanDriver,
    valve: IrrigationValve,
}

impl<'a> HardwareAdapter<'a> {
    pub fn new(dimmer: &'a PhaseControl, fan: FanDriver, valve: IrrigationValve) -> Self {
        Self { dimmer, fan, valve }
    }

    pub fn dimmer(&self) -> &PhaseControl {
        self.dimmer
    }
}

// ── ActuatorPort implementation ───────────────────────────────

impl ActuatorPort for HardwareAdapter<'_> {
    fn dimmer_ready(&self) -> bool {
        self.dimmer.is_initialized()
    }

    fn set_bulb_power(&mut self, power: f32) -> Result<u32, DimmerError> {
        self.dimmer.set_power_percentage(power)
    }

    fn set_fan_power(&mut self, power: f32) -> Result<(), ActuatorError> {
        self.fan.set_power(power)
    }

    fn fan_power(&self) -> f32 {
        self.fan.power()
    }

    fn toggle_irrigation(&mut self) -> Result<bool, ActuatorError> {
        self.valve.toggle()
    }

    fn irrigation_on(&self) -> bool {
        self.valve.is_open()
    }
}

// ── VoltageSource implementation ──────────────────────────────

/// One ADC1 channel, read through the line-fitting calibration.
pub struct AdcChannel {
    channel: u32,
}

impl AdcChannel {
    pub fn new(channel: u32) -> Self {
        Self { channel }
    }
}

impl VoltageSource for AdcChannel {
    fn read_calibrated_mv(&mut self) -> Result<i32, SensorError> {
        hw_init::adc1_read_calibrated_mv(self.channel)
    }
}
