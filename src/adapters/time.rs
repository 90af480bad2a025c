//! ESP32 time adapters.
//!
//! - [`Esp32TimeAdapter`]: monotonic uptime for the control loop's `dt`.
//! - [`SystemPulseClock`]: the microsecond [`PulseTimer`] the single-wire
//!   reader polls against.
//!
//! - **`target_os = "espidf"`**: wraps `esp_timer_get_time()` from the
//!   ESP-IDF high-resolution timer (microsecond precision, monotonic) and
//!   the ROM busy-wait `Ets` delay.
//! - **`not(target_os = "espidf")`**: uses `std::time::Instant` for
//!   host-side runs.

use embedded_hal::delay::DelayNs;

use crate::sensors::am2302::PulseTimer;

/// Time adapter for the ESP32 platform.
pub struct Esp32TimeAdapter {
    #[cfg(not(target_os = "espidf"))]
    start: std::time::Instant,
}

impl Default for Esp32TimeAdapter {
    fn default() -> Self {
        Self::new()
    }
}

impl Esp32TimeAdapter {
    pub fn new() -> Self {
        Self {
            #[cfg(not(target_os = "espidf"))]
            start: std::time::Instant::now(),
        }
    }

    /// Microseconds since boot (monotonic).
    #[cfg(target_os = "espidf")]
    pub fn uptime_us(&self) -> u64 {
        // SAFETY: reads the free-running system timer; no preconditions.
        (unsafe { esp_idf_svc::sys::esp_timer_get_time() }) as u64
    }

    /// Microseconds since boot (monotonic).
    #[cfg(not(target_os = "espidf"))]
    pub fn uptime_us(&self) -> u64 {
        self.start.elapsed().as_micros() as u64
    }
}

/// Wrapping microsecond counter plus busy-wait delay.
///
/// Safe to use inside a critical section: neither reading the counter nor
/// the delay depends on interrupts.
pub struct SystemPulseClock {
    #[cfg(not(target_os = "espidf"))]
    start: std::time::Instant,
}

impl Default for SystemPulseClock {
    fn default() -> Self {
        Self::new()
    }
}

impl SystemPulseClock {
    pub fn new() -> Self {
        Self {
            #[cfg(not(target_os = "espidf"))]
            start: std::time::Instant::now(),
        }
    }
}

#[cfg(target_os = "espidf")]
impl DelayNs for SystemPulseClock {
    fn delay_ns(&mut self, ns: u32) {
        esp_idf_hal::delay::Ets::delay_us(ns.div_ceil(1_000));
    }

    fn delay_us(&mut self, us: u32) {
        esp_idf_hal::delay::Ets::delay_us(us);
    }
}

#[cfg(target_os = "espidf")]
impl PulseTimer for SystemPulseClock {
    fn now_us(&self) -> u32 {
        // SAFETY: as in Esp32TimeAdapter::uptime_us.
        (unsafe { esp_idf_svc::sys::esp_timer_get_time() }) as u32
    }
}

#[cfg(not(target_os = "espidf"))]
impl DelayNs for SystemPulseClock {
    fn delay_ns(&mut self, ns: u32) {
        let until = std::time::Instant::now() + std::time::Duration::from_nanos(u64::from(ns));
        while std::time::Instant::now() < until {
            core::hint::spin_loop();
        }
    }
}

#[cfg(not(target_os = "espidf"))]
impl PulseTimer for SystemPulseClock {
    fn now_us(&self) -> u32 {
        self.start.elapsed().as_micros() as u32
    }
}
