//! Bulb power percentage → TRIAC firing delay.
//!
//! The delays follow the equal-energy firing-angle curve of a resistive
//! load on 60 Hz mains (half-cycle 8333 µs).  A lower power fraction maps
//! to a later firing point, so the table is monotonically decreasing in
//! delay as the threshold rises.
//!
//! ```text
//!  delay µs
//!  8203 ┤█
//!       ┤█▇▆▅
//!  5245 ┤    ▅▄▄▃▃▂
//!       ┤          ▂▂▁▁
//!     0 ┤              ▁_
//!       └────────────────── power
//!        0%     50%     100%
//! ```

/// One breakpoint: any power `>= threshold` (and below the next higher
/// threshold) fires `delay_us` after the zero crossing.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PowerStep {
    pub threshold: f32,
    pub delay_us: u32,
}

/// Number of breakpoints (0 % to 100 % in 5 % steps).
pub const POWER_STEPS: usize = 21;

/// Mains frequency the reference table was derived for.
pub const REFERENCE_MAINS_HZ: u32 = 60;

const fn step(threshold: f32, delay_us: u32) -> PowerStep {
    PowerStep { threshold, delay_us }
}

/// Ordered by descending threshold; the last entry catches everything
/// below 5 %.
pub const STEPS_60HZ: [PowerStep; POWER_STEPS] = [
    step(1.00, 0),
    step(0.95, 2060),
    step(0.90, 2696),
    step(0.85, 3157),
    step(0.80, 3538),
    step(0.75, 3874),
    step(0.70, 4179),
    step(0.65, 4464),
    step(0.60, 4734),
    step(0.55, 4993),
    step(0.50, 5245),
    step(0.45, 5493),
    step(0.40, 5738),
    step(0.35, 5984),
    step(0.30, 6232),
    step(0.25, 6487),
    step(0.20, 6750),
    step(0.15, 7030),
    step(0.10, 7334),
    step(0.05, 7688),
    step(0.00, 8203),
];

/// Length of one mains half-cycle in microseconds.
pub const fn half_cycle_us(mains_hz: u32) -> u32 {
    1_000_000 / (2 * mains_hz)
}

/// Step table used by the phase controller.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PowerCurve {
    steps: [PowerStep; POWER_STEPS],
}

impl Default for PowerCurve {
    fn default() -> Self {
        Self {
            steps: STEPS_60HZ,
        }
    }
}

impl PowerCurve {
    /// Table for the given mains frequency.
    ///
    /// Delays are scaled by `60 / mains_hz` so each step keeps its firing
    /// angle.  Zero falls back to the 60 Hz table.
    pub fn for_mains(mains_hz: u32) -> Self {
        if mains_hz == 0 || mains_hz == REFERENCE_MAINS_HZ {
            return Self::default();
        }
        let mut steps = STEPS_60HZ;
        for s in &mut steps {
            s.delay_us =
                (u64::from(s.delay_us) * u64::from(REFERENCE_MAINS_HZ) / u64::from(mains_hz)) as u32;
        }
        Self { steps }
    }

    pub fn steps(&self) -> &[PowerStep; POWER_STEPS] {
        &self.steps
    }

    /// Firing delay for power fraction `p`.
    ///
    /// Out-of-range input is clamped to [0, 1]; NaN is treated as 0.
    pub fn delay_for(&self, p: f32) -> u32 {
        let p = clamp_power(p);
        self.steps
            .iter()
            .find(|s| p >= s.threshold)
            .map_or(self.max_delay_us(), |s| s.delay_us)
    }

    /// Delay used at minimum power.
    pub fn max_delay_us(&self) -> u32 {
        self.steps[POWER_STEPS - 1].delay_us
    }
}

/// Clamp a power request into [0, 1]; NaN becomes 0.
pub fn clamp_power(p: f32) -> f32 {
    if p.is_nan() { 0.0 } else { p.clamp(0.0, 1.0) }
}
