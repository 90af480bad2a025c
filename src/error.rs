//! Unified error types for the greenhouse node firmware.
//!
//! A single `Error` enum that every subsystem converts into, keeping the
//! main loop's error handling uniform.  All variants are `Copy` so they can
//! be cheaply handed from driver to service to event sink without allocation.

use core::fmt;

use crate::sensors::frame::Level;

// ---------------------------------------------------------------------------
// Top-level firmware error
// ---------------------------------------------------------------------------

/// Every fallible operation in the firmware funnels into this type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// A sensor could not be read or returned corrupt data.
    Sensor(SensorError),
    /// The zero-cross phase controller rejected an operation.
    Dimmer(DimmerError),
    /// An actuator command failed.
    Actuator(ActuatorError),
    /// The link to the telemetry peer failed.
    Comms(CommsError),
    /// Peripheral initialisation failed.
    Init(&'static str),
    /// Configuration is invalid.
    Config(&'static str),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Sensor(e) => write!(f, "sensor: {e}"),
            Self::Dimmer(e) => write!(f, "dimmer: {e}"),
            Self::Actuator(e) => write!(f, "actuator: {e}"),
            Self::Comms(e) => write!(f, "comms: {e}"),
            Self::Init(msg) => write!(f, "init: {msg}"),
            Self::Config(msg) => write!(f, "config: {msg}"),
        }
    }
}

impl std::error::Error for Error {}

// ---------------------------------------------------------------------------
// Sensor errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SensorError {
    /// Pin could not be configured or driven.
    InvalidArgument,
    /// The data line did not reach `expected` within the step's budget.
    Timeout { expected: Level, waited_us: u32 },
    /// Byte 4 of the frame does not match the low byte of the sum of bytes 0-3.
    ChecksumMismatch { expected: u8, received: u8 },
    /// Acquisition attempted before a successful `init_device`.
    NotReady,
    /// The calibrated ADC read failed.
    AdcReadFailed,
}

impl fmt::Display for SensorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidArgument => write!(f, "invalid argument (pin not usable)"),
            Self::Timeout { expected, waited_us } => write!(
                f,
                "timeout after {} us awaiting the bus to go {:?}",
                waited_us, expected
            ),
            Self::ChecksumMismatch { expected, received } => write!(
                f,
                "checksum mismatch: expected {:02X}, received {:02X}",
                expected, received
            ),
            Self::NotReady => write!(f, "sensor not ready"),
            Self::AdcReadFailed => write!(f, "ADC read failed"),
        }
    }
}

impl std::error::Error for SensorError {}

impl From<SensorError> for Error {
    fn from(e: SensorError) -> Self {
        Self::Sensor(e)
    }
}

// ---------------------------------------------------------------------------
// Dimmer errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DimmerError {
    /// `set_power_percentage` called before `init` succeeded.
    NotInitialized,
    /// The delay timer or a GPIO role could not be configured.
    TimerConfig(&'static str),
    /// Longest firing delay plus gate pulse does not fit in one half-cycle.
    PhaseBudget { half_cycle_us: u32, required_us: u32 },
}

impl fmt::Display for DimmerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotInitialized => write!(f, "phase controller not initialised"),
            Self::TimerConfig(msg) => write!(f, "timer config failed: {msg}"),
            Self::PhaseBudget {
                half_cycle_us,
                required_us,
            } => write!(
                f,
                "max delay + pulse ({} us) does not fit a {} us half-cycle",
                required_us, half_cycle_us
            ),
        }
    }
}

impl std::error::Error for DimmerError {}

impl From<DimmerError> for Error {
    fn from(e: DimmerError) -> Self {
        Self::Dimmer(e)
    }
}

// ---------------------------------------------------------------------------
// Actuator errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActuatorError {
    /// PWM duty-cycle write failed.
    PwmWriteFailed,
    /// GPIO set failed.
    GpioWriteFailed,
    /// Character display rejected a write.
    DisplayWriteFailed,
}

impl fmt::Display for ActuatorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::PwmWriteFailed => write!(f, "PWM write failed"),
            Self::GpioWriteFailed => write!(f, "GPIO write failed"),
            Self::DisplayWriteFailed => write!(f, "display write failed"),
        }
    }
}

impl std::error::Error for ActuatorError {}

impl From<ActuatorError> for Error {
    fn from(e: ActuatorError) -> Self {
        Self::Actuator(e)
    }
}

// ---------------------------------------------------------------------------
// Communications errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommsError {
    ConnectFailed,
    SendFailed,
    ReceiveFailed,
    /// The peer closed the connection.
    ConnectionClosed,
    /// An inbound message was not a valid command object.
    MalformedCommand,
}

impl fmt::Display for CommsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ConnectFailed => write!(f, "connect failed"),
            Self::SendFailed => write!(f, "send failed"),
            Self::ReceiveFailed => write!(f, "receive failed"),
            Self::ConnectionClosed => write!(f, "connection closed by peer"),
            Self::MalformedCommand => write!(f, "malformed command"),
        }
    }
}

impl std::error::Error for CommsError {}

impl From<CommsError> for Error {
    fn from(e: CommsError) -> Self {
        Self::Comms(e)
    }
}

// ---------------------------------------------------------------------------
// Convenience Result alias
// ---------------------------------------------------------------------------

/// Firmware-wide `Result` alias.
pub type Result<T> = core::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn subsystem_errors_convert_into_error() {
        let e: Error = SensorError::NotReady.into();
        assert_eq!(e, Error::Sensor(SensorError::NotReady));
        let e: Error = DimmerError::NotInitialized.into();
        assert_eq!(e, Error::Dimmer(DimmerError::NotInitialized));
    }

    #[test]
    fn checksum_display_shows_both_bytes() {
        let e = SensorError::ChecksumMismatch {
            expected: 0x3A,
            received: 0x3B,
        };
        let s = format!("{e}");
        assert!(s.contains("3A") && s.contains("3B"));
    }
}
