//! GPIO / peripheral pin assignments for the greenhouse node (ESP32 DevKit).
//!
//! Single source of truth: every driver references this module rather than
//! hard-coding pin numbers.  Change a pin here and it propagates everywhere.

// ---------------------------------------------------------------------------
// Sensors
// ---------------------------------------------------------------------------

/// AM2302 single-wire data line (open-drain, external 10 kΩ pull-up).
pub const AM2302_DATA_GPIO: i32 = 23;

/// LM35 analog output.  ADC1 channel 4 (GPIO 32 on ESP32).
pub const LM35_ADC_GPIO: i32 = 32;
pub const LM35_ADC1_CHANNEL: u32 = 4;

// ---------------------------------------------------------------------------
// Zero-cross dimmer (opto-isolated detector + MOC3021/BTA16 stage)
// ---------------------------------------------------------------------------

/// Detector output: rising edge at every mains zero crossing.
pub const ZERO_CROSS_GPIO: i32 = 13;
/// TRIAC gate drive (via opto-triac), active HIGH.
pub const TRIAC_GATE_GPIO: i32 = 33;
/// On-board LED: lit from edge until the gate fires.
pub const ZERO_CROSS_LED_GPIO: i32 = 2;

// ---------------------------------------------------------------------------
// Cooling fan (4-wire PWM fan through a logic-level MOSFET)
// ---------------------------------------------------------------------------

pub const FAN_PWM_GPIO: i32 = 19;
/// LEDC channel 0 on timer 0.
pub const FAN_LEDC_CHANNEL: u32 = 0;
/// 25 kHz: inaudible, within the 4-wire PWM fan standard.
pub const FAN_PWM_FREQ_HZ: u32 = 25_000;
/// LEDC timer resolution (bits).  11-bit gives 0 – 2048 duty levels.
pub const FAN_PWM_RESOLUTION_BITS: u32 = 11;

// ---------------------------------------------------------------------------
// Irrigation
// ---------------------------------------------------------------------------

/// Relay / solenoid valve driver, active HIGH.
pub const IRRIGATION_GPIO: i32 = 17;
