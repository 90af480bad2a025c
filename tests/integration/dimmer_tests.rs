//! Phase-control dimmer driven through whole mains half-cycles.
//!
//! The harness plays the part of both interrupts: at each zero-cross
//! instant it calls `arm`, and if the simulated timer's alarm falls inside
//! the half-cycle it jumps the clock there and calls `fire`.

use greenhouse::adapters::hardware::HardwareAdapter;
use greenhouse::app::ports::ActuatorPort;
use greenhouse::config::SystemConfig;
use greenhouse::drivers::fan::FanDriver;
use greenhouse::drivers::irrigation::IrrigationValve;
use greenhouse::error::DimmerError;
use greenhouse::control::power_curve::PowerCurve;
use greenhouse::drivers::zero_cross::{PhaseControl, PhaseState, TriacDriver, TriacTiming};
use greenhouse::sim::{RecordingPin, SimClock, SimDelayTimer};

type SimTriac<'a> = TriacDriver<'a, SimDelayTimer, RecordingPin, RecordingPin, SimClock>;

fn sim_driver<'a>(shared: &'a PhaseControl, clock: &SimClock, timing: TriacTiming) -> SimTriac<'a> {
    TriacDriver::new(
        shared,
        SimDelayTimer::new(clock.clone()),
        RecordingPin::new(clock.clone()),
        RecordingPin::new(clock.clone()),
        clock.clone(),
        timing,
    )
}

/// Run one half-cycle starting at `edge_us`.
fn half_cycle(drv: &mut SimTriac<'_>, clock: &SimClock, edge_us: u32) {
    clock.set(edge_us);
    drv.arm();
    let next_edge = edge_us + drv.timing().half_cycle_us;
    if let Some(due) = drv.timer().due_at() {
        if due < next_edge {
            clock.set(due);
            drv.fire();
        }
    }
}

fn assert_pulses_fit(drv: &SimTriac<'_>, half_us: u32) {
    for (rise, width) in drv.gate().pulses() {
        let edge = rise - rise % half_us;
        assert!(
            rise + width < edge + half_us,
            "pulse at {rise} (+{width}) crosses the edge at {}",
            edge + half_us
        );
    }
}

#[test]
fn one_pulse_per_half_cycle_at_every_power() {
    let config = SystemConfig::default();
    let timing = TriacTiming::from_config(&config);
    let half = timing.half_cycle_us;
    let clock = SimClock::new();
    let shared = PhaseControl::new(config.power_curve());
    let mut drv = sim_driver(&shared, &clock, timing);
    drv.init().unwrap();

    let mut k = 0u32;
    for step in 0..=20u32 {
        let power = step as f32 / 20.0;
        let delay = shared.set_power_percentage(power).unwrap();
        for _ in 0..5 {
            half_cycle(&mut drv, &clock, k * half);
            let (rise, width) = *drv.gate().pulses().last().unwrap();
            assert_eq!(rise, k * half + delay);
            assert_eq!(width, timing.pulse_us);
            k += 1;
        }
    }

    assert_pulses_fit(&drv, half);
    let stats = shared.stats();
    assert_eq!(stats.edges, k);
    assert_eq!(stats.fires, k);
    assert_eq!(stats.restarts, 0);
    assert_eq!(stats.spurious_alarms, 0);
    assert_eq!(shared.state(), PhaseState::Idle);
}

#[test]
fn power_change_applies_from_next_edge() {
    let config = SystemConfig::default();
    let timing = TriacTiming::from_config(&config);
    let half = timing.half_cycle_us;
    let clock = SimClock::new();
    let shared = PhaseControl::new(config.power_curve());
    let mut drv = sim_driver(&shared, &clock, timing);
    drv.init().unwrap();
    shared.set_power_percentage(0.25).unwrap();

    clock.set(0);
    drv.arm();
    // Command lands mid-cycle, after the edge has loaded the old delay.
    clock.set(1_000);
    shared.set_power_percentage(0.75).unwrap();
    let due = drv.timer().due_at().unwrap();
    assert_eq!(due, 6487);
    clock.set(due);
    drv.fire();

    half_cycle(&mut drv, &clock, half);
    assert_eq!(drv.gate().pulses(), vec![(6487, 20), (half + 3874, 20)]);
}

#[test]
fn indicator_follows_each_cycle() {
    let config = SystemConfig::default();
    let timing = TriacTiming::from_config(&config);
    let clock = SimClock::new();
    let shared = PhaseControl::new(config.power_curve());
    let mut drv = sim_driver(&shared, &clock, timing);
    drv.init().unwrap();
    shared.set_power_percentage(0.5).unwrap();

    for k in 0..3 {
        half_cycle(&mut drv, &clock, k * timing.half_cycle_us);
    }
    let on: Vec<u32> = drv
        .indicator()
        .transitions()
        .iter()
        .filter(|(_, high)| *high)
        .map(|(at, _)| *at)
        .collect();
    assert_eq!(on, vec![0, 8333, 16666]);
    assert!(!drv.indicator().level());
}

#[test]
fn fifty_hertz_curve_fits_its_half_cycle() {
    let config = SystemConfig {
        mains_frequency_hz: 50,
        ..SystemConfig::default()
    };
    config.validate().unwrap();
    let timing = TriacTiming::from_config(&config);
    assert_eq!(timing.half_cycle_us, 10_000);

    let clock = SimClock::new();
    let shared = PhaseControl::new(config.power_curve());
    let mut drv = sim_driver(&shared, &clock, timing);
    drv.init().unwrap();

    assert_eq!(shared.set_power_percentage(0.0), Ok(9843));
    for k in 0..10 {
        half_cycle(&mut drv, &clock, k * timing.half_cycle_us);
    }
    assert_eq!(shared.stats().fires, 10);
    assert_pulses_fit(&drv, timing.half_cycle_us);
}

#[test]
fn sixty_hertz_table_on_fifty_hertz_timing_is_accepted() {
    // The 60 Hz table is shorter than a 50 Hz half-cycle, so the budget
    // holds even though the firing angles are off.
    let clock = SimClock::new();
    let shared = PhaseControl::new(PowerCurve::default());
    let mut drv = sim_driver(
        &shared,
        &clock,
        TriacTiming {
            half_cycle_us: 10_000,
            pulse_us: 20,
        },
    );
    assert!(drv.init().is_ok());
}

#[test]
fn failed_timer_leaves_dimmer_unusable() {
    let clock = SimClock::new();
    let shared = PhaseControl::new(PowerCurve::default());
    let mut drv = TriacDriver::new(
        &shared,
        SimDelayTimer::failing(clock.clone()),
        RecordingPin::new(clock.clone()),
        RecordingPin::new(clock.clone()),
        clock.clone(),
        TriacTiming::from_config(&SystemConfig::default()),
    );
    assert!(drv.init().is_err());
    assert!(!shared.is_initialized());
    assert!(shared.set_power_percentage(0.5).is_err());

    drv.arm();
    assert!(!drv.timer().running());
    assert!(drv.gate().transitions().is_empty());
}

#[test]
fn unwired_interrupts_keep_bulb_control_off() {
    let config = SystemConfig::default();
    let clock = SimClock::new();
    let shared = PhaseControl::new(config.power_curve());
    let mut drv = sim_driver(&shared, &clock, TriacTiming::from_config(&config));
    assert!(
        drv.init_with(|_| Err(DimmerError::TimerConfig("timer enable")))
            .is_err()
    );

    let mut hw = HardwareAdapter::new(&shared, FanDriver::new(), IrrigationValve::new());
    assert!(!hw.dimmer_ready());
    assert_eq!(hw.set_bulb_power(1.0), Err(DimmerError::NotInitialized));
    half_cycle(&mut drv, &clock, 0);
    assert!(drv.gate().pulses().is_empty());
}
