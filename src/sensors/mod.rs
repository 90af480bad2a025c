//! Sensor subsystem.
//!
//! - [`am2302`]: single-wire humidity/temperature reader (bit-banged bus)
//! - [`frame`]: the 40-bit frame it produces, checksum and decoding
//! - [`lm35`]: analog probe on the ADC
//!
//! [`ClimateSensors`] bundles the two channels behind the
//! [`ClimateSensorPort`](crate::app::ports::ClimateSensorPort) so the
//! service only sees readings and errors.

pub mod am2302;
pub mod frame;
pub mod lm35;

use embedded_hal::digital::{InputPin, OutputPin};

use crate::app::ports::{ClimateSensorPort, VoltageSource};
use crate::error::SensorError;
use am2302::{Am2302, PulseTimer};
use frame::ClimateReading;
use lm35::Lm35;

/// Owns both sensor drivers.  Either channel may be absent when its
/// initialisation failed at boot; its samples then report `NotReady`.
pub struct ClimateSensors<P, T, V> {
    climate: Option<Am2302<P, T>>,
    probe: Option<Lm35<V>>,
}

impl<P, T, V> ClimateSensors<P, T, V>
where
    P: InputPin + OutputPin,
    T: PulseTimer,
    V: VoltageSource,
{
    pub fn new(climate: Option<Am2302<P, T>>, probe: Option<Lm35<V>>) -> Self {
        Self { climate, probe }
    }
}

impl<P, T, V> ClimateSensorPort for ClimateSensors<P, T, V>
where
    P: InputPin + OutputPin,
    T: PulseTimer,
    V: VoltageSource,
{
    fn climate_ready(&self) -> bool {
        self.climate.as_ref().is_some_and(Am2302::is_ready)
    }

    fn sample_climate(&mut self) -> Result<ClimateReading, SensorError> {
        let sensor = self.climate.as_mut().ok_or(SensorError::NotReady)?;
        sensor.acquire_frame().map(|f| f.reading())
    }

    fn last_climate(&self) -> ClimateReading {
        self.climate
            .as_ref()
            .map(Am2302::last_reading)
            .unwrap_or_default()
    }

    fn probe_ready(&self) -> bool {
        self.probe.is_some()
    }

    fn sample_probe(&mut self) -> Result<f32, SensorError> {
        self.probe.as_mut().ok_or(SensorError::NotReady)?.read()
    }

    fn last_probe_celsius(&self) -> f32 {
        self.probe.as_ref().map_or(0.0, Lm35::last_celsius)
    }
}
