//! Zero-cross phase-control dimmer for the heater bulb.
//!
//! A rising edge on the zero-cross input restarts a one-shot delay timer;
//! when its alarm expires the TRIAC gate is pulsed and the TRIAC conducts
//! for the rest of the half-cycle.  A longer delay means less power.
//!
//! ```text
//!  mains   ╱‾‾‾‾‾╲         ╱‾‾‾‾‾╲
//!        ─╯       ╲       ╱       ╲
//!                  ╲_____╱
//!  zc    ─┐_______________┐_______________
//!  gate   │<-delay->┌┐    │<-delay->┌┐
//!        ─┴─────────┘└────┴─────────┘└────
//!          Idle  Armed Firing Idle
//! ```
//!
//! Split in two halves:
//!
//! - [`PhaseControl`]: shared state.  Task context writes the commanded
//!   delay with a single atomic store; interrupt context loads it.
//! - [`TriacDriver`]: owns the delay timer and both outputs.  Only
//!   [`TriacDriver::arm`] (edge interrupt) and [`TriacDriver::fire`] (timer
//!   alarm) run after start-up, and neither blocks beyond the gate pulse.
//!
//! Every edge restarts the counter, even while a previous cycle is still
//! armed.  That is only safe when the longest delay plus the gate pulse fits
//! inside one half-cycle, so [`TriacDriver::init`] refuses to start otherwise.

use core::sync::atomic::{AtomicBool, AtomicU8, AtomicU32, Ordering};

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::OutputPin;
use log::info;

use crate::config::SystemConfig;
use crate::control::power_curve::{PowerCurve, clamp_power};
use crate::error::DimmerError;

// ── State ─────────────────────────────────────────────────────

/// Position in the per-half-cycle firing sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum PhaseState {
    Idle = 0,
    Armed = 1,
    Firing = 2,
}

impl PhaseState {
    fn from_u8(raw: u8) -> Self {
        match raw {
            1 => Self::Armed,
            2 => Self::Firing,
            _ => Self::Idle,
        }
    }
}

/// Counters maintained from interrupt context.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PhaseStats {
    /// Zero-cross edges seen after init.
    pub edges: u32,
    /// Completed gate pulses.
    pub fires: u32,
    /// Edges that arrived while a cycle was still armed or firing.
    pub restarts: u32,
    /// Alarms that arrived with no cycle armed.
    pub spurious_alarms: u32,
}

/// State shared between the power-setting task and the interrupt handlers.
pub struct PhaseControl {
    curve: PowerCurve,
    delay_us: AtomicU32,
    power_bits: AtomicU32,
    state: AtomicU8,
    initialized: AtomicBool,
    edges: AtomicU32,
    fires: AtomicU32,
    restarts: AtomicU32,
    spurious_alarms: AtomicU32,
}

impl PhaseControl {
    /// Starts at minimum power (longest delay).
    pub fn new(curve: PowerCurve) -> Self {
        Self {
            delay_us: AtomicU32::new(curve.max_delay_us()),
            power_bits: AtomicU32::new(0.0f32.to_bits()),
            curve,
            state: AtomicU8::new(PhaseState::Idle as u8),
            initialized: AtomicBool::new(false),
            edges: AtomicU32::new(0),
            fires: AtomicU32::new(0),
            restarts: AtomicU32::new(0),
            spurious_alarms: AtomicU32::new(0),
        }
    }

    /// Map `power` in [0, 1] to a firing delay and publish it.
    ///
    /// Out-of-range input is clamped.  The new delay takes effect on the
    /// next zero-cross edge.  Returns the delay now commanded.
    pub fn set_power_percentage(&self, power: f32) -> Result<u32, DimmerError> {
        if !self.is_initialized() {
            return Err(DimmerError::NotInitialized);
        }
        let power = clamp_power(power);
        let delay = self.curve.delay_for(power);
        // Power goes first: a reader that sees the new delay also sees it.
        self.power_bits.store(power.to_bits(), Ordering::Relaxed);
        self.delay_us.store(delay, Ordering::Release);
        Ok(delay)
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized.load(Ordering::Acquire)
    }

    pub fn commanded_delay_us(&self) -> u32 {
        self.delay_us.load(Ordering::Acquire)
    }

    /// Last power fraction accepted by `set_power_percentage`.
    ///
    /// Read on its own this may run one command ahead of
    /// [`commanded_delay_us`](Self::commanded_delay_us) while a store is in
    /// flight; it never lags behind it.
    pub fn power(&self) -> f32 {
        f32::from_bits(self.power_bits.load(Ordering::Relaxed))
    }

    pub fn state(&self) -> PhaseState {
        PhaseState::from_u8(self.state.load(Ordering::Acquire))
    }

    pub fn curve(&self) -> &PowerCurve {
        &self.curve
    }

    pub fn stats(&self) -> PhaseStats {
        PhaseStats {
            edges: self.edges.load(Ordering::Relaxed),
            fires: self.fires.load(Ordering::Relaxed),
            restarts: self.restarts.load(Ordering::Relaxed),
            spurious_alarms: self.spurious_alarms.load(Ordering::Relaxed),
        }
    }

    fn set_state(&self, state: PhaseState) {
        self.state.store(state as u8, Ordering::Release);
    }
}

// ── Delay timer abstraction ───────────────────────────────────

/// One-shot microsecond counter whose alarm invokes [`TriacDriver::fire`].
pub trait DelayTimer {
    /// Allocate and configure the counter (1 µs resolution, no reload).
    fn configure(&mut self) -> Result<(), DimmerError>;

    /// Alarm threshold counted from the last restart.
    fn set_alarm_us(&mut self, delay_us: u32);

    /// Zero the count and start counting.  Must be callable from an ISR.
    fn restart(&mut self);

    /// Stop counting.  Must be callable from an ISR.
    fn stop(&mut self);
}

/// Half-cycle length and gate pulse width.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TriacTiming {
    pub half_cycle_us: u32,
    pub pulse_us: u32,
}

impl TriacTiming {
    pub fn from_config(config: &SystemConfig) -> Self {
        Self {
            half_cycle_us: config.half_cycle_us(),
            pulse_us: config.trigger_pulse_us,
        }
    }
}

// ── Interrupt-side driver ─────────────────────────────────────

/// Owns the delay timer, the TRIAC gate and the zero-cross indicator LED.
pub struct TriacDriver<'a, T, G, I, D> {
    shared: &'a PhaseControl,
    timer: T,
    gate: G,
    indicator: I,
    delay: D,
    timing: TriacTiming,
    programmed_alarm_us: Option<u32>,
}

impl<'a, T, G, I, D> TriacDriver<'a, T, G, I, D>
where
    T: DelayTimer,
    G: OutputPin,
    I: OutputPin,
    D: DelayNs,
{
    pub fn new(
        shared: &'a PhaseControl,
        timer: T,
        gate: G,
        indicator: I,
        delay: D,
        timing: TriacTiming,
    ) -> Self {
        Self {
            shared,
            timer,
            gate,
            indicator,
            delay,
            timing,
            programmed_alarm_us: None,
        }
    }

    /// Drive both outputs low, check the phase budget, configure the timer.
    ///
    /// On success `set_power_percentage` starts accepting commands.  For a
    /// driver whose interrupts are wired separately, use
    /// [`init_with`](Self::init_with).
    pub fn init(&mut self) -> Result<(), DimmerError> {
        self.init_with(|_| Ok(()))
    }

    /// [`init`](Self::init) with an `attach` step that hooks the edge and
    /// alarm interrupts up to this driver.
    ///
    /// The dimmer is only marked initialised once `attach` succeeds; if it
    /// fails, power commands keep returning `NotInitialized` and `arm`
    /// stays inert.
    pub fn init_with<F>(&mut self, attach: F) -> Result<(), DimmerError>
    where
        F: FnOnce(&mut Self) -> Result<(), DimmerError>,
    {
        if self.shared.is_initialized() {
            return Err(DimmerError::TimerConfig("already initialised"));
        }

        let required_us = self.shared.curve().max_delay_us() + self.timing.pulse_us;
        if required_us >= self.timing.half_cycle_us {
            return Err(DimmerError::PhaseBudget {
                half_cycle_us: self.timing.half_cycle_us,
                required_us,
            });
        }

        self.gate
            .set_low()
            .map_err(|_| DimmerError::TimerConfig("gate output"))?;
        self.indicator
            .set_low()
            .map_err(|_| DimmerError::TimerConfig("indicator output"))?;

        self.timer.configure()?;
        let delay = self.shared.commanded_delay_us();
        self.timer.set_alarm_us(delay);
        self.programmed_alarm_us = Some(delay);

        self.shared.set_state(PhaseState::Idle);
        attach(&mut *self)?;
        self.shared.initialized.store(true, Ordering::Release);
        info!(
            "zero_cross: ready (half-cycle {} us, max delay {} us, pulse {} us)",
            self.timing.half_cycle_us,
            self.shared.curve().max_delay_us(),
            self.timing.pulse_us
        );
        Ok(())
    }

    /// Zero-cross edge handler.
    ///
    /// Loads the commanded delay, reprograms the alarm if it changed, lights
    /// the indicator and restarts the counter from zero.
    pub fn arm(&mut self) {
        if !self.shared.is_initialized() {
            return;
        }
        self.shared.edges.fetch_add(1, Ordering::Relaxed);
        if self.shared.state() != PhaseState::Idle {
            self.shared.restarts.fetch_add(1, Ordering::Relaxed);
        }

        let delay = self.shared.commanded_delay_us();
        if self.programmed_alarm_us != Some(delay) {
            self.timer.set_alarm_us(delay);
            self.programmed_alarm_us = Some(delay);
        }

        // Pin writes cannot be reported from interrupt context.
        let _ = self.indicator.set_high();
        self.timer.restart();
        self.shared.set_state(PhaseState::Armed);
    }

    /// Timer alarm handler: pulse the gate, then return to idle.
    pub fn fire(&mut self) {
        if self
            .shared
            .state
            .compare_exchange(
                PhaseState::Armed as u8,
                PhaseState::Firing as u8,
                Ordering::AcqRel,
                Ordering::Acquire,
            )
            .is_err()
        {
            self.shared.spurious_alarms.fetch_add(1, Ordering::Relaxed);
            self.timer.stop();
            return;
        }

        let _ = self.gate.set_high();
        self.delay.delay_us(self.timing.pulse_us);
        let _ = self.gate.set_low();
        let _ = self.indicator.set_low();
        self.timer.stop();

        self.shared.fires.fetch_add(1, Ordering::Relaxed);
        self.shared.set_state(PhaseState::Idle);
    }

    pub fn shared(&self) -> &PhaseControl {
        self.shared
    }

    pub fn timer(&self) -> &T {
        &self.timer
    }

    pub fn gate(&self) -> &G {
        &self.gate
    }

    pub fn indicator(&self) -> &I {
        &self.indicator
    }

    pub fn timing(&self) -> TriacTiming {
        self.timing
    }
}

// ── ESP-IDF binding ───────────────────────────────────────────

#[cfg(target_os = "espidf")]
pub use esp::{EspTriac, GpTimer, start};

#[cfg(target_os = "espidf")]
mod esp {
    use core::ffi::c_void;

    use esp_idf_hal::delay::Ets;
    use esp_idf_svc::sys::*;

    use super::{DelayTimer, TriacDriver};
    use crate::drivers::hw_init::GpioOut;
    use crate::error::DimmerError;
    use crate::pins;

    /// The driver as wired on the board.
    pub type EspTriac = TriacDriver<'static, GpTimer, GpioOut, GpioOut, Ets>;

    /// General-purpose timer at 1 MHz, counting up, no auto-reload.
    pub struct GpTimer {
        handle: gptimer_handle_t,
    }

    impl Default for GpTimer {
        fn default() -> Self {
            Self {
                handle: core::ptr::null_mut(),
            }
        }
    }

    impl DelayTimer for GpTimer {
        fn configure(&mut self) -> Result<(), DimmerError> {
            let cfg = gptimer_config_t {
                clk_src: soc_periph_gptimer_clk_src_t_GPTIMER_CLK_SRC_DEFAULT,
                direction: gptimer_count_direction_t_GPTIMER_COUNT_UP,
                resolution_hz: 1_000_000,
                ..Default::default()
            };
            // SAFETY: cfg outlives the call; handle is written once here.
            let ret = unsafe { gptimer_new_timer(&cfg, &mut self.handle) };
            if ret != ESP_OK as i32 {
                return Err(DimmerError::TimerConfig("gptimer allocation"));
            }
            Ok(())
        }

        fn set_alarm_us(&mut self, delay_us: u32) {
            // A zero alarm would never trigger after the count is reset.
            let alarm = gptimer_alarm_config_t {
                alarm_count: u64::from(delay_us.max(1)),
                ..Default::default()
            };
            // SAFETY: handle was created in configure(); the call only
            // updates the alarm register and is IRAM-safe.
            unsafe {
                gptimer_set_alarm_action(self.handle, &alarm);
            }
        }

        fn restart(&mut self) {
            // SAFETY: IRAM-safe register writes on a configured timer.
            // gptimer_start fails harmlessly when already running.
            unsafe {
                gptimer_set_raw_count(self.handle, 0);
                gptimer_start(self.handle);
            }
        }

        fn stop(&mut self) {
            // SAFETY: as above.
            unsafe {
                gptimer_stop(self.handle);
            }
        }
    }

    unsafe extern "C" fn zero_cross_isr(ctx: *mut c_void) {
        // SAFETY: ctx is the leaked driver registered in start(); the edge
        // and alarm interrupts run on the same core and never nest.
        let driver = unsafe { &mut *ctx.cast::<EspTriac>() };
        driver.arm();
    }

    unsafe extern "C" fn alarm_cb(
        _timer: gptimer_handle_t,
        _edata: *const gptimer_alarm_event_data_t,
        ctx: *mut c_void,
    ) -> bool {
        // SAFETY: see zero_cross_isr.
        let driver = unsafe { &mut *ctx.cast::<EspTriac>() };
        driver.fire();
        false
    }

    /// Initialise the driver and hand it to the interrupt handlers.
    ///
    /// The driver is owned by the interrupts from here on; task code talks
    /// to it only through the shared [`PhaseControl`](super::PhaseControl).
    pub fn start(driver: &'static mut EspTriac) -> Result<(), DimmerError> {
        driver.init_with(attach_interrupts)
    }

    fn attach_interrupts(driver: &mut EspTriac) -> Result<(), DimmerError> {
        let handle = driver.timer().handle;
        let ctx = (driver as *mut EspTriac).cast::<c_void>();

        // SAFETY: ctx points at the 'static driver passed to start(), which
        // nothing else dereferences once it returns.  arm() is inert until
        // init_with() publishes the initialised flag, so no alarm can be
        // due before then.  The ISR service is installed by
        // hw_init::init_isr_service() before this runs.
        unsafe {
            let callbacks = gptimer_event_callbacks_t {
                on_alarm: Some(alarm_cb),
            };
            if gptimer_register_event_callbacks(handle, &callbacks, ctx) != ESP_OK as i32 {
                return Err(DimmerError::TimerConfig("alarm callback"));
            }
            if gptimer_enable(handle) != ESP_OK as i32 {
                return Err(DimmerError::TimerConfig("timer enable"));
            }

            let zc = gpio_config_t {
                pin_bit_mask: 1u64 << pins::ZERO_CROSS_GPIO,
                mode: gpio_mode_t_GPIO_MODE_INPUT,
                pull_up_en: gpio_pullup_t_GPIO_PULLUP_DISABLE,
                pull_down_en: gpio_pulldown_t_GPIO_PULLDOWN_DISABLE,
                intr_type: gpio_int_type_t_GPIO_INTR_POSEDGE,
            };
            if gpio_config(&zc) != ESP_OK as i32 {
                return Err(DimmerError::TimerConfig("zero-cross input"));
            }
            if gpio_isr_handler_add(pins::ZERO_CROSS_GPIO, Some(zero_cross_isr), ctx) != ESP_OK as i32 {
                return Err(DimmerError::TimerConfig("zero-cross interrupt"));
            }
        }
        Ok(())
    }
}
