//! 16x2 status screen.
//!
//! ```text
//!   col 0        9   13
//!      ┌────────────────┐
//!  r0  │Tempture: 25.1°C│
//!  r1  │Humidity: 61.0% │
//!      └────────────────┘
//! ```
//!
//! Labels and units are drawn once; only the 4-column value fields are
//! rewritten on refresh.

use core::fmt::Write as _;

use heapless::String;

use super::ports::DisplayPort;
use crate::error::ActuatorError;
use crate::sensors::frame::ClimateReading;

pub const TEMPERATURE_ROW: u8 = 0;
pub const HUMIDITY_ROW: u8 = 1;
pub const VALUE_COL: u8 = 9;
pub const UNIT_COL: u8 = 13;
/// Columns between the value start and the unit glyph.
pub const VALUE_WIDTH: usize = (UNIT_COL - VALUE_COL) as usize;

pub const TEMPERATURE_LABEL: &str = "Tempture:";
pub const HUMIDITY_LABEL: &str = "Humidity:";
pub const CELSIUS_UNIT: &str = "\u{b0}C";
pub const PERCENT_UNIT: &str = "%";

/// Draw labels and unit glyphs.
pub fn draw_static(display: &mut impl DisplayPort) -> Result<(), ActuatorError> {
    display.write_at(0, TEMPERATURE_ROW, TEMPERATURE_LABEL)?;
    display.write_at(UNIT_COL, TEMPERATURE_ROW, CELSIUS_UNIT)?;
    display.write_at(0, HUMIDITY_ROW, HUMIDITY_LABEL)?;
    display.write_at(UNIT_COL, HUMIDITY_ROW, PERCENT_UNIT)
}

/// Rewrite both value fields.
pub fn draw_values(
    display: &mut impl DisplayPort,
    reading: ClimateReading,
) -> Result<(), ActuatorError> {
    display.write_at(VALUE_COL, TEMPERATURE_ROW, &format_value(reading.temperature))?;
    display.write_at(VALUE_COL, HUMIDITY_ROW, &format_value(reading.humidity))
}

/// One decimal, right-aligned in the value field.  Values that do not fit
/// show dashes rather than spilling into the unit column.
pub fn format_value(value: f32) -> String<VALUE_WIDTH> {
    let mut out = String::new();
    if write!(out, "{:>4.1}", value).is_err() {
        out.clear();
        for _ in 0..VALUE_WIDTH {
            // Capacity is VALUE_WIDTH; cannot overflow.
            let _ = out.push('-');
        }
    }
    out
}
