//! AM2302 (DHT22) single-wire humidity/temperature reader.
//!
//! The host pulls the open-drain line low for 1 ms, releases it, and the
//! device answers with an 80 µs low / 80 µs high acknowledge followed by
//! 40 bits.  Every bit is a ~50 µs low preamble and a high pulse of
//! ~26 µs (0) or ~70 µs (1); the reader compares the two waits instead of
//! trusting absolute durations.
//!
//! ```text
//!  host  ‾‾‾‾\_____1ms_____/‾‾‾‾‾
//!  dev                          \__ack__/‾‾ack‾‾\_50_/‾bit‾\_50_/‾bit‾\ ...
//! ```
//!
//! The whole transaction runs inside a `critical_section`, and the line is
//! returned to its idle-high state on every exit path.

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::{InputPin, OutputPin};
use log::warn;

use super::frame::{
    BitTiming, ClimateReading, FRAME_BITS, FRAME_BYTES, Level, PulseLevelSample, SensorFrame,
    decode_bits,
};
use crate::error::SensorError;

/// Host start signal: line held low.
pub const START_SIGNAL_US: u32 = 1_000;
/// Device pulls the line low after release.
pub const ACK_LOW_TIMEOUT_US: u32 = 40;
/// Device releases its acknowledge low.
pub const ACK_HIGH_TIMEOUT_US: u32 = 80;
/// Device ends its acknowledge high; bit 0 preamble starts.
pub const ACK_END_TIMEOUT_US: u32 = 80;
/// Per-bit wait for the high pulse to start.
pub const BIT_LOW_TIMEOUT_US: u32 = 65;
/// Per-bit wait for the high pulse to end.
pub const BIT_HIGH_TIMEOUT_US: u32 = 75;
/// Line sampling period inside every wait loop.
pub const DEFAULT_POLL_INTERVAL_US: u32 = 2;
/// Settling time after power is applied before the first read.
pub const POWER_UP_DELAY_MS: u32 = 1_000;

/// Monotonic microsecond clock used to bound the polling loops.
///
/// `now_us` may wrap; elapsed times are computed with wrapping arithmetic.
pub trait PulseTimer: DelayNs {
    fn now_us(&self) -> u32;
}

/// A single-wire AM2302 sensor on an open-drain pin.
pub struct Am2302<P, T> {
    pin: P,
    timer: T,
    poll_interval_us: u32,
    ready: bool,
    last: ClimateReading,
}

impl<P, T> Am2302<P, T>
where
    P: InputPin + OutputPin,
    T: PulseTimer,
{
    /// Wrap the pin and timer.  The sensor is not usable until
    /// [`init_device`](Self::init_device) has completed one good read.
    pub fn new(pin: P, timer: T) -> Self {
        Self {
            pin,
            timer,
            poll_interval_us: DEFAULT_POLL_INTERVAL_US,
            ready: false,
            last: ClimateReading::default(),
        }
    }

    /// Sample the line every `us` microseconds instead of the default 2.
    /// Clamped so a single poll never exceeds the tightest step budget.
    pub fn with_poll_interval(mut self, us: u32) -> Self {
        self.poll_interval_us = us.clamp(1, ACK_LOW_TIMEOUT_US);
        self
    }

    /// Put the line in its idle state and perform the diagnostic read.
    ///
    /// On success the sensor becomes ready and the reading is returned.
    /// Callers must respect the device's power-up delay before calling.
    pub fn init_device(&mut self) -> Result<ClimateReading, SensorError> {
        self.pin
            .set_high()
            .map_err(|_| SensorError::InvalidArgument)?;
        let frame = self.acquire()?;
        self.ready = true;
        Ok(frame.reading())
    }

    pub fn is_ready(&self) -> bool {
        self.ready
    }

    /// Run one full start/acknowledge/40-bit transaction.
    ///
    /// Any failure aborts the whole frame and resets the cached reading to 0;
    /// retrying is left to the caller's next scheduled tick.
    pub fn acquire_frame(&mut self) -> Result<SensorFrame, SensorError> {
        if !self.ready {
            return Err(SensorError::NotReady);
        }
        self.acquire()
    }

    /// Last good reading, or zeros after a failed acquisition.
    pub fn last_reading(&self) -> ClimateReading {
        self.last
    }

    /// Give the pin and timer back.
    pub fn release(self) -> (P, T) {
        (self.pin, self.timer)
    }

    fn acquire(&mut self) -> Result<SensorFrame, SensorError> {
        let result = self.transact().and_then(SensorFrame::from_bytes);
        match &result {
            Ok(frame) => self.last = frame.reading(),
            Err(e) => {
                self.last = ClimateReading::default();
                warn!("am2302: acquisition failed: {}", e);
            }
        }
        result
    }

    fn transact(&mut self) -> Result<[u8; FRAME_BYTES], SensorError> {
        let pin = &mut self.pin;
        let timer = &mut self.timer;
        let poll_us = self.poll_interval_us;

        critical_section::with(|_cs| {
            let mut line = scopeguard::guard(pin, |pin| {
                // Idle state is released (high); nothing useful to do on failure.
                let _ = pin.set_high();
            });

            line.set_low().map_err(|_| SensorError::InvalidArgument)?;
            timer.delay_us(START_SIGNAL_US);
            line.set_high().map_err(|_| SensorError::InvalidArgument)?;

            let mut bus = Bus {
                pin: &mut **line,
                timer: &mut *timer,
                poll_us,
            };

            bus.await_level(Level::Low, ACK_LOW_TIMEOUT_US)?;
            bus.await_level(Level::High, ACK_HIGH_TIMEOUT_US)?;
            bus.await_level(Level::Low, ACK_END_TIMEOUT_US)?;

            let mut timings = [BitTiming::default(); FRAME_BITS];
            for timing in &mut timings {
                let low = bus.await_level(Level::High, BIT_LOW_TIMEOUT_US)?;
                let high = bus.await_level(Level::Low, BIT_HIGH_TIMEOUT_US)?;
                *timing = BitTiming::new(low.elapsed_us, high.elapsed_us);
            }
            Ok(decode_bits(&timings))
        })
    }
}

/// Borrowed view of the line used while the critical section is held.
struct Bus<'a, P, T> {
    pin: &'a mut P,
    timer: &'a mut T,
    poll_us: u32,
}

impl<P, T> Bus<'_, P, T>
where
    P: InputPin,
    T: PulseTimer,
{
    /// Poll until the line shows `expected` or `timeout_us` elapses.
    ///
    /// Bounded twice: by elapsed clock time and by the number of polls that
    /// fit in the budget, so a stalled clock still ends in `Timeout`.
    fn await_level(
        &mut self,
        expected: Level,
        timeout_us: u32,
    ) -> Result<PulseLevelSample, SensorError> {
        let start = self.timer.now_us();
        let max_polls = timeout_us.div_ceil(self.poll_us).max(1);
        let mut elapsed_us = 0;

        for _ in 0..max_polls {
            self.timer.delay_us(self.poll_us);
            elapsed_us = self.timer.now_us().wrapping_sub(start);
            let level = self
                .pin
                .is_high()
                .map(Level::from_high)
                .map_err(|_| SensorError::InvalidArgument)?;
            if level == expected {
                return Ok(PulseLevelSample {
                    level,
                    elapsed_us,
                });
            }
            if elapsed_us >= timeout_us {
                break;
            }
        }

        Err(SensorError::Timeout {
            expected,
            waited_us: elapsed_us,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::{ScriptedLine, SimClock, frame_script};

    fn sensor_with(script: Vec<(Level, u32)>) -> Am2302<ScriptedLine, SimClock> {
        let clock = SimClock::new();
        let line = ScriptedLine::new(clock.clone(), script);
        Am2302::new(line, clock)
    }

    #[test]
    fn acquire_before_init_is_not_ready() {
        let mut s = sensor_with(frame_script([0x02, 0x8C, 0x01, 0x5F, 0xEE]));
        assert_eq!(s.acquire_frame(), Err(SensorError::NotReady));
        assert!(!s.is_ready());
    }

    #[test]
    fn init_reads_a_valid_frame_and_becomes_ready() {
        let mut s = sensor_with(frame_script([0x02, 0x8C, 0x01, 0x5F, 0xEE]));
        let reading = s.init_device().unwrap();
        assert!(s.is_ready());
        assert!((reading.humidity - 65.2).abs() < 1e-4);
        assert!((reading.temperature - 35.1).abs() < 1e-4);
        assert_eq!(s.last_reading(), reading);
    }

    #[test]
    fn silent_device_times_out_on_acknowledge() {
        // Line never leaves idle-high after release.
        let mut s = sensor_with(Vec::new());
        let err = s.init_device().unwrap_err();
        assert!(matches!(
            err,
            SensorError::Timeout {
                expected: Level::Low,
                ..
            }
        ));
        assert!(!s.is_ready());
    }

    #[test]
    fn checksum_failure_resets_cached_reading() {
        let mut s = sensor_with(frame_script([0x02, 0x8C, 0x01, 0x5F, 0xEE]));
        s.init_device().unwrap();
        s.pin.set_script(frame_script([0x02, 0x8C, 0x01, 0x5F, 0x00]));
        let err = s.acquire_frame().unwrap_err();
        assert_eq!(
            err,
            SensorError::ChecksumMismatch {
                expected: 0xEE,
                received: 0x00
            }
        );
        assert_eq!(s.last_reading(), ClimateReading::default());
    }

    #[test]
    fn line_is_released_after_failure() {
        let mut s = sensor_with(Vec::new());
        let _ = s.init_device();
        assert!(!s.pin.host_driving_low());
    }

    #[test]
    fn stalled_clock_still_times_out() {
        let clock = SimClock::frozen();
        let line = ScriptedLine::new(clock.clone(), Vec::new());
        let mut s = Am2302::new(line, clock);
        assert!(matches!(
            s.init_device(),
            Err(SensorError::Timeout { waited_us: 0, .. })
        ));
    }

    #[test]
    fn poll_interval_is_clamped_to_budget() {
        let s = sensor_with(Vec::new()).with_poll_interval(500);
        assert_eq!(s.poll_interval_us, ACK_LOW_TIMEOUT_US);
        let s = sensor_with(Vec::new()).with_poll_interval(0);
        assert_eq!(s.poll_interval_us, 1);
    }
}
