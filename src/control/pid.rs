//! PID controller for the bulb heater
//!
//! Discrete proportional-integral-derivative loop.  `dt` is taken from
//! the caller's sample timestamps; the output is clamped to the configured
//! bounds and fed to the phase controller as a power fraction.
//!
//! The integral keeps accumulating while the output is clamped.

use log::warn;

/// Substituted for `dt` when timestamps do not advance.
pub const DT_FLOOR_S: f32 = 1.0e-3;

/// `dt` assumed on the first call, before any previous sample exists.
pub const DEFAULT_NOMINAL_DT_S: f32 = 0.25;

/// PID controller
#[derive(Debug, Clone)]
pub struct PidController {
    kp: f32,
    ki: f32,
    kd: f32,
    setpoint: f32,
    integral: f32,
    prev_error: f32,
    last_sample_us: Option<u64>,
    nominal_dt_s: f32,
    output_min: f32,
    output_max: f32,
}

impl PidController {
    pub fn new(kp: f32, ki: f32, kd: f32, setpoint: f32) -> Self {
        Self {
            kp,
            ki,
            kd,
            setpoint,
            integral: 0.0,
            prev_error: 0.0,
            last_sample_us: None,
            nominal_dt_s: DEFAULT_NOMINAL_DT_S,
            output_min: 0.0,
            output_max: 1.0,
        }
    }

    /// Use the control tick period as the first call's `dt`.
    pub fn with_nominal_dt(mut self, dt_s: f32) -> Self {
        if dt_s > 0.0 {
            self.nominal_dt_s = dt_s;
        }
        self
    }

    /// Set output limits.  Reversed bounds are swapped; NaN is ignored.
    pub fn set_output_bounds(&mut self, min: f32, max: f32) {
        if min.is_nan() || max.is_nan() {
            warn!("pid: ignoring NaN output bounds");
            return;
        }
        let (lo, hi) = if min <= max { (min, max) } else { (max, min) };
        self.output_min = lo;
        self.output_max = hi;
    }

    pub fn set_setpoint(&mut self, setpoint: f32) {
        self.setpoint = setpoint;
    }

    pub fn set_gains(&mut self, kp: f32, ki: f32, kd: f32) {
        self.kp = kp;
        self.ki = ki;
        self.kd = kd;
    }

    pub fn setpoint(&self) -> f32 {
        self.setpoint
    }

    pub fn gains(&self) -> (f32, f32, f32) {
        (self.kp, self.ki, self.kd)
    }

    pub fn output_bounds(&self) -> (f32, f32) {
        (self.output_min, self.output_max)
    }

    pub fn integral(&self) -> f32 {
        self.integral
    }

    /// Compute the clamped output for `measurement` sampled at `now_us`.
    pub fn compute(&mut self, measurement: f32, now_us: u64) -> f32 {
        let dt = match self.last_sample_us {
            None => self.nominal_dt_s,
            Some(last) if now_us > last => (now_us - last) as f32 / 1.0e6,
            Some(_) => DT_FLOOR_S,
        };
        self.last_sample_us = Some(now_us);

        let error = self.setpoint - measurement;

        // Proportional
        let p = self.kp * error;

        // Integral
        self.integral += error * dt;
        let i = self.ki * self.integral;

        // Derivative
        let d = self.kd * (error - self.prev_error) / dt;

        self.prev_error = error;

        (p + i + d).clamp(self.output_min, self.output_max)
    }

    /// Reset controller state
    pub fn reset(&mut self) {
        self.integral = 0.0;
        self.prev_error = 0.0;
        self.last_sample_us = None;
    }
}
