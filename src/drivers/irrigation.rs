//! Irrigation valve output (relay / solenoid driver, active HIGH).

use log::info;

use crate::drivers::hw_init;
use crate::error::ActuatorError;
use crate::pins;

pub struct IrrigationValve {
    pin: i32,
    open: bool,
}

impl Default for IrrigationValve {
    fn default() -> Self {
        Self::new()
    }
}

impl IrrigationValve {
    /// Starts closed; `hw_init` drives the pin low at boot.
    pub fn new() -> Self {
        Self {
            pin: pins::IRRIGATION_GPIO,
            open: false,
        }
    }

    /// Flip the valve.  On a failed write the state is unchanged.
    pub fn toggle(&mut self) -> Result<bool, ActuatorError> {
        self.set(!self.open)?;
        Ok(self.open)
    }

    pub fn set(&mut self, open: bool) -> Result<(), ActuatorError> {
        hw_init::gpio_write(self.pin, open)?;
        self.open = open;
        info!("irrigation: valve {}", if open { "open" } else { "closed" });
        Ok(())
    }

    pub fn is_open(&self) -> bool {
        self.open
    }
}
