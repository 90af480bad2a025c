//! Host-side stand-ins for the timing-critical peripherals.
//!
//! Everything here runs on a simulated microsecond axis owned by
//! [`SimClock`]: delays advance it, pins and timers read it.
//!
//! ```text
//!  SimClock ──▶ ScriptedLine   (single-wire bus, device side scripted)
//!           ──▶ RecordingPin   (TRIAC gate / indicator, edges logged)
//!           ──▶ SimDelayTimer  (one-shot alarm, expiry computed)
//! ```

use std::cell::{Cell, RefCell};
use std::convert::Infallible;
use std::rc::Rc;

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::{ErrorType, InputPin, OutputPin};

use crate::drivers::zero_cross::DelayTimer;
use crate::error::DimmerError;
use crate::sensors::am2302::PulseTimer;
use crate::sensors::frame::{FRAME_BITS, FRAME_BYTES, Level};

// ── Clock ─────────────────────────────────────────────────────

/// Shared simulated clock.  Clones observe the same time.
#[derive(Debug, Clone, Default)]
pub struct SimClock {
    now: Rc<Cell<u32>>,
    frozen: bool,
}

impl SimClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// A clock that never advances, for exercising iteration bounds.
    pub fn frozen() -> Self {
        Self {
            now: Rc::default(),
            frozen: true,
        }
    }

    pub fn now(&self) -> u32 {
        self.now.get()
    }

    pub fn advance(&self, us: u32) {
        if !self.frozen {
            self.now.set(self.now.get().wrapping_add(us));
        }
    }

    /// Jump to an absolute time.
    pub fn set(&self, us: u32) {
        self.now.set(us);
    }
}

impl DelayNs for SimClock {
    fn delay_ns(&mut self, ns: u32) {
        self.advance(ns.div_ceil(1_000));
    }

    fn delay_us(&mut self, us: u32) {
        self.advance(us);
    }
}

impl PulseTimer for SimClock {
    fn now_us(&self) -> u32 {
        self.now()
    }
}

// ── Single-wire line ──────────────────────────────────────────

/// Open-drain data line with a scripted device on the other end.
///
/// The script is a list of `(level, duration_us)` segments played from the
/// moment the host releases the line after pulling it low.  Before any
/// start signal and after the script ends the line idles high.
pub struct ScriptedLine {
    clock: SimClock,
    device: DeviceScript,
    host_low: bool,
    released_at: Option<u32>,
}

/// Shared handle on a line's device response, so a test can change what
/// the device sends after the line has been moved into a driver.
#[derive(Debug, Clone, Default)]
pub struct DeviceScript(Rc<RefCell<Vec<(Level, u32)>>>);

impl DeviceScript {
    pub fn new(script: Vec<(Level, u32)>) -> Self {
        Self(Rc::new(RefCell::new(script)))
    }

    /// Replace the device response for the next start signal.
    pub fn set(&self, script: Vec<(Level, u32)>) {
        *self.0.borrow_mut() = script;
    }
}

impl ScriptedLine {
    pub fn new(clock: SimClock, script: Vec<(Level, u32)>) -> Self {
        Self::with_device(clock, DeviceScript::new(script))
    }

    pub fn with_device(clock: SimClock, device: DeviceScript) -> Self {
        Self {
            clock,
            device,
            host_low: false,
            released_at: None,
        }
    }

    pub fn device(&self) -> DeviceScript {
        self.device.clone()
    }

    /// Replace the device response for the next start signal.
    pub fn set_script(&mut self, script: Vec<(Level, u32)>) {
        self.device.set(script);
    }

    pub fn host_driving_low(&self) -> bool {
        self.host_low
    }

    fn device_level(&self) -> Level {
        let Some(released) = self.released_at else {
            return Level::High;
        };
        let rel = self.clock.now().wrapping_sub(released);
        let mut start = 0u32;
        for &(level, duration) in self.device.0.borrow().iter() {
            if rel < start + duration {
                return level;
            }
            start += duration;
        }
        Level::High
    }
}

impl ErrorType for ScriptedLine {
    type Error = Infallible;
}

impl OutputPin for ScriptedLine {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        self.host_low = true;
        self.released_at = None;
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        if self.host_low {
            self.released_at = Some(self.clock.now());
        }
        self.host_low = false;
        Ok(())
    }
}

impl InputPin for ScriptedLine {
    fn is_high(&mut self) -> Result<bool, Self::Error> {
        Ok(!self.host_low && self.device_level() == Level::High)
    }

    fn is_low(&mut self) -> Result<bool, Self::Error> {
        self.is_high().map(|h| !h)
    }
}

/// Device response for one frame with nominal datasheet timing
/// (acknowledge shortened slightly to stay inside the poll budgets).
pub fn frame_script(bytes: [u8; FRAME_BYTES]) -> Vec<(Level, u32)> {
    frame_script_with(bytes, 50, 26, 70)
}

/// Device response with custom bit timing: `low_us` preamble, then a high
/// pulse of `zero_us` or `one_us`.
pub fn frame_script_with(
    bytes: [u8; FRAME_BYTES],
    low_us: u32,
    zero_us: u32,
    one_us: u32,
) -> Vec<(Level, u32)> {
    let mut script = vec![(Level::High, 20), (Level::Low, 76), (Level::High, 76)];
    for i in 0..FRAME_BITS {
        let bit = (bytes[i / 8] >> (7 - i % 8)) & 1 == 1;
        script.push((Level::Low, low_us));
        script.push((Level::High, if bit { one_us } else { zero_us }));
    }
    script.push((Level::Low, low_us));
    script
}

// ── Output pins ───────────────────────────────────────────────

/// Output pin that logs every level change with its timestamp.
pub struct RecordingPin {
    clock: SimClock,
    high: bool,
    transitions: Vec<(u32, bool)>,
}

impl RecordingPin {
    pub fn new(clock: SimClock) -> Self {
        Self {
            clock,
            high: false,
            transitions: Vec::new(),
        }
    }

    pub fn level(&self) -> bool {
        self.high
    }

    pub fn transitions(&self) -> &[(u32, bool)] {
        &self.transitions
    }

    /// Completed high pulses as `(rise_us, width_us)`.
    pub fn pulses(&self) -> Vec<(u32, u32)> {
        let mut out = Vec::new();
        let mut rise = None;
        for &(at, high) in &self.transitions {
            match (high, rise) {
                (true, None) => rise = Some(at),
                (false, Some(r)) => {
                    out.push((r, at.wrapping_sub(r)));
                    rise = None;
                }
                _ => {}
            }
        }
        out
    }

    fn drive(&mut self, high: bool) {
        if self.high != high {
            self.transitions.push((self.clock.now(), high));
        }
        self.high = high;
    }
}

impl ErrorType for RecordingPin {
    type Error = Infallible;
}

impl OutputPin for RecordingPin {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        self.drive(false);
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        self.drive(true);
        Ok(())
    }
}

// ── Delay timer ───────────────────────────────────────────────

/// One-shot timer on the simulated axis.  The test harness asks
/// [`due_at`](Self::due_at) when the alarm would fire and calls
/// `TriacDriver::fire` itself.
pub struct SimDelayTimer {
    clock: SimClock,
    fail_configure: bool,
    configured: bool,
    alarm_us: u32,
    started_at: Option<u32>,
    restarts: u32,
}

impl SimDelayTimer {
    pub fn new(clock: SimClock) -> Self {
        Self {
            clock,
            fail_configure: false,
            configured: false,
            alarm_us: 0,
            started_at: None,
            restarts: 0,
        }
    }

    /// A timer whose allocation fails.
    pub fn failing(clock: SimClock) -> Self {
        Self {
            fail_configure: true,
            ..Self::new(clock)
        }
    }

    pub fn is_configured(&self) -> bool {
        self.configured
    }

    pub fn alarm_us(&self) -> u32 {
        self.alarm_us
    }

    pub fn running(&self) -> bool {
        self.started_at.is_some()
    }

    pub fn restarts(&self) -> u32 {
        self.restarts
    }

    /// Absolute time the alarm fires, if counting.
    pub fn due_at(&self) -> Option<u32> {
        self.started_at.map(|s| s.wrapping_add(self.alarm_us))
    }
}

impl DelayTimer for SimDelayTimer {
    fn configure(&mut self) -> Result<(), DimmerError> {
        if self.fail_configure {
            return Err(DimmerError::TimerConfig("timer allocation"));
        }
        self.configured = true;
        Ok(())
    }

    fn set_alarm_us(&mut self, delay_us: u32) {
        self.alarm_us = delay_us;
    }

    fn restart(&mut self) {
        self.started_at = Some(self.clock.now());
        self.restarts += 1;
    }

    fn stop(&mut self) {
        self.started_at = None;
    }
}
