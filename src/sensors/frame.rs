//! 40-bit single-wire frame: pulse samples, bit decoding and checksum.
//!
//! ```text
//!  byte 0        byte 1        byte 2        byte 3        byte 4
//! ┌────────────┬────────────┬────────────┬────────────┬────────────┐
//! │ RH high    │ RH low     │ T high     │ T low      │ checksum   │
//! └────────────┴────────────┴────────────┴────────────┴────────────┘
//!  checksum = (b0 + b1 + b2 + b3) mod 256, bits sent MSB first
//! ```
//!
//! Everything here is pure; the bus timing lives in [`super::am2302`].

use crate::error::SensorError;

/// Number of data bits in one frame.
pub const FRAME_BITS: usize = 40;
/// Number of bytes in one frame.
pub const FRAME_BYTES: usize = FRAME_BITS / 8;

/// Logic level of the data line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    Low,
    High,
}

impl Level {
    pub fn from_high(high: bool) -> Self {
        if high { Self::High } else { Self::Low }
    }
}

/// A level observed on the line plus how long it took to appear.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PulseLevelSample {
    pub level: Level,
    pub elapsed_us: u32,
}

/// Wait durations recorded for one bit.
///
/// `low_us` is the wait for the line to rise (length of the low preamble),
/// `high_us` the wait for it to fall again (length of the high pulse).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BitTiming {
    pub low_us: u32,
    pub high_us: u32,
}

impl BitTiming {
    pub fn new(low_us: u32, high_us: u32) -> Self {
        Self { low_us, high_us }
    }

    /// A bit is 1 iff its high pulse outlasted its low preamble.
    pub fn bit(&self) -> bool {
        self.high_us > self.low_us
    }
}

/// Shift 40 bit timings MSB-first into 5 bytes.
pub fn decode_bits(timings: &[BitTiming; FRAME_BITS]) -> [u8; FRAME_BYTES] {
    let mut bytes = [0u8; FRAME_BYTES];
    for (i, timing) in timings.iter().enumerate() {
        let byte = &mut bytes[i / 8];
        *byte = (*byte << 1) | u8::from(timing.bit());
    }
    bytes
}

/// Low byte of the sum of the four payload bytes.
pub fn checksum(payload: &[u8]) -> u8 {
    payload.iter().fold(0u8, |acc, b| acc.wrapping_add(*b))
}

/// A checksum-validated frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SensorFrame {
    bytes: [u8; FRAME_BYTES],
}

impl SensorFrame {
    /// Validate raw bytes; a frame with a bad checksum is never constructed.
    pub fn from_bytes(bytes: [u8; FRAME_BYTES]) -> Result<Self, SensorError> {
        let expected = checksum(&bytes[..4]);
        if bytes[4] != expected {
            return Err(SensorError::ChecksumMismatch {
                expected,
                received: bytes[4],
            });
        }
        Ok(Self { bytes })
    }

    pub fn bytes(&self) -> [u8; FRAME_BYTES] {
        self.bytes
    }

    pub fn raw_humidity(&self) -> u16 {
        u16::from_be_bytes([self.bytes[0], self.bytes[1]])
    }

    pub fn raw_temperature(&self) -> u16 {
        u16::from_be_bytes([self.bytes[2], self.bytes[3]])
    }

    /// Relative humidity in %.
    pub fn humidity(&self) -> f32 {
        f32::from(self.raw_humidity()) / 10.0
    }

    /// Temperature in °C, reading the 16 bits as unsigned tenths.
    pub fn temperature(&self) -> f32 {
        f32::from(self.raw_temperature()) / 10.0
    }

    /// Temperature in °C using the sensor's sign-magnitude convention
    /// (bit 15 set = below zero).
    pub fn signed_temperature(&self) -> f32 {
        let raw = self.raw_temperature();
        let magnitude = f32::from(raw & 0x7FFF) / 10.0;
        if raw & 0x8000 != 0 { -magnitude } else { magnitude }
    }

    pub fn reading(&self) -> ClimateReading {
        ClimateReading {
            humidity: self.humidity(),
            temperature: self.temperature(),
        }
    }
}

/// Humidity/temperature pair cached by the reader.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ClimateReading {
    pub humidity: f32,
    pub temperature: f32,
}
