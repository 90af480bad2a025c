//! Periodic task cadences on ESP-IDF's esp_timer API.
//!
//! One periodic timer per [`Event`]; each pushes its event into the
//! lock-free SPSC queue.  The event discriminant rides in the callback
//! `arg` pointer so a single callback serves every timer.
//!
//! Timer callbacks execute in the ESP timer task context (not ISR), so
//! they can safely call push_event() which uses AtomicU8.

use crate::config::SystemConfig;
use crate::events::Event;

/// Number of periodic timers.
pub const TICK_COUNT: usize = 6;

/// `(event, period in microseconds)` for every cadence in `config`.
pub fn schedule(config: &SystemConfig) -> [(Event, u64); TICK_COUNT] {
    let us = |ms: u32| u64::from(ms) * 1_000;
    [
        (Event::ControlTick, us(config.control_loop_interval_ms)),
        (Event::SensorReadTick, us(config.sensor_read_interval_ms)),
        (Event::ProbeReadTick, us(config.probe_read_interval_ms)),
        (Event::CommandPollTick, us(config.command_poll_interval_ms)),
        (Event::TelemetryTick, us(config.telemetry_interval_ms)),
        (Event::DisplayTick, us(config.display_refresh_interval_ms)),
    ]
}

#[cfg(target_os = "espidf")]
mod esp {
    use super::*;
    use crate::events::push_event;
    use esp_idf_svc::sys::*;
    use log::{error, info};

    static mut TIMERS: [esp_timer_handle_t; TICK_COUNT] = [core::ptr::null_mut(); TICK_COUNT];

    fn timer_name(event: Event) -> &'static [u8] {
        match event {
            Event::ControlTick => b"control\0",
            Event::SensorReadTick => b"am2302\0",
            Event::ProbeReadTick => b"lm35\0",
            Event::CommandPollTick => b"cmd\0",
            Event::TelemetryTick => b"telem\0",
            Event::DisplayTick => b"display\0",
        }
    }

    unsafe extern "C" fn tick_cb(arg: *mut core::ffi::c_void) {
        if let Some(event) = Event::from_u8(arg as usize as u8) {
            push_event(event);
        }
    }

    /// Start the periodic tick timers.  A timer that fails to create or
    /// start is logged and skipped; the others still run.
    pub fn start_timers(config: &SystemConfig) {
        // SAFETY: TIMERS is written here once at boot from the single
        // main-task context before any timer callbacks fire.  The callback
        // only calls push_event(), which is lock-free.
        unsafe {
            for (slot, (event, period_us)) in schedule(config).into_iter().enumerate() {
                let args = esp_timer_create_args_t {
                    callback: Some(tick_cb),
                    arg: event as u8 as usize as *mut core::ffi::c_void,
                    dispatch_method: esp_timer_dispatch_t_ESP_TIMER_TASK,
                    name: timer_name(event).as_ptr() as *const _,
                    skip_unhandled_events: true,
                };
                let ret = esp_timer_create(&args, &raw mut TIMERS[slot]);
                if ret != ESP_OK as i32 {
                    error!("hw_timer: {:?} create failed (rc={})", event, ret);
                    continue;
                }
                let ret = esp_timer_start_periodic(TIMERS[slot], period_us);
                if ret != ESP_OK as i32 {
                    error!("hw_timer: {:?} start failed (rc={})", event, ret);
                    continue;
                }
                info!("hw_timer: {:?} every {} ms", event, period_us / 1_000);
            }
        }
    }

    /// Stop all tick timers.
    pub fn stop_timers() {
        // SAFETY: handles are valid if start_timers() created them;
        // null-check skips the ones that failed.  Main task only.
        unsafe {
            for handle in TIMERS {
                if !handle.is_null() {
                    esp_timer_stop(handle);
                }
            }
        }
    }
}

#[cfg(target_os = "espidf")]
pub use esp::{start_timers, stop_timers};

#[cfg(not(target_os = "espidf"))]
pub fn start_timers(config: &SystemConfig) {
    for (event, period_us) in schedule(config) {
        log::info!("hw_timer(sim): {:?} every {} ms (not started)", event, period_us / 1_000);
    }
}

#[cfg(not(target_os = "espidf"))]
pub fn stop_timers() {}
