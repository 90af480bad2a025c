//! LM35 analog temperature probe (10 mV/°C, 0 V at 0 °C).
//!
//! The probe sits on an ADC channel; calibration to millivolts happens
//! behind the [`VoltageSource`] port so this module is pure arithmetic.

use log::warn;

use crate::app::ports::VoltageSource;
use crate::error::SensorError;

const MV_PER_DEGREE: f32 = 10.0;

pub fn millivolts_to_celsius(mv: i32) -> f32 {
    mv as f32 / MV_PER_DEGREE
}

pub struct Lm35<V> {
    source: V,
    last_c: f32,
}

impl<V: VoltageSource> Lm35<V> {
    pub fn new(source: V) -> Self {
        Self {
            source,
            last_c: 0.0,
        }
    }

    /// Sample the probe.  A failed conversion zeroes the cached value.
    pub fn read(&mut self) -> Result<f32, SensorError> {
        match self.source.read_calibrated_mv() {
            Ok(mv) => {
                self.last_c = millivolts_to_celsius(mv);
                Ok(self.last_c)
            }
            Err(e) => {
                self.last_c = 0.0;
                warn!("lm35: acquisition failed: {}", e);
                Err(e)
            }
        }
    }

    pub fn last_celsius(&self) -> f32 {
        self.last_c
    }
}
