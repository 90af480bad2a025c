//! Single-wire frame reader against the scripted line.
//!
//! The device side is a list of level segments on the simulated
//! microsecond axis; the reader polls it through `embedded-hal` pins
//! exactly as it polls the real GPIO.

use greenhouse::app::ports::{ClimateSensorPort, VoltageSource};
use greenhouse::error::SensorError;
use greenhouse::sensors::ClimateSensors;
use greenhouse::sensors::am2302::Am2302;
use greenhouse::sensors::frame::{ClimateReading, Level, checksum};
use greenhouse::sensors::lm35::Lm35;
use greenhouse::sim::{DeviceScript, ScriptedLine, SimClock, frame_script, frame_script_with};

struct Adc(Result<i32, SensorError>);

impl VoltageSource for Adc {
    fn read_calibrated_mv(&mut self) -> Result<i32, SensorError> {
        self.0
    }
}

fn frame(payload: [u8; 4]) -> [u8; 5] {
    [payload[0], payload[1], payload[2], payload[3], checksum(&payload)]
}

fn reader(script: Vec<(Level, u32)>) -> (Am2302<ScriptedLine, SimClock>, DeviceScript) {
    let clock = SimClock::new();
    let line = ScriptedLine::new(clock.clone(), script);
    let device = line.device();
    (Am2302::new(line, clock), device)
}

#[test]
fn decodes_datasheet_example() {
    // 65.2 %RH, 35.1 °C
    let (mut s, _) = reader(frame_script(frame([0x02, 0x8C, 0x01, 0x5F])));
    let r = s.init_device().unwrap();
    assert!((r.humidity - 65.2).abs() < 1e-4);
    assert!((r.temperature - 35.1).abs() < 1e-4);
}

#[test]
fn only_relative_pulse_width_matters() {
    // Short preamble, ones barely longer than it, zeros barely shorter.
    let bytes = frame([0xA5, 0x5A, 0x0F, 0xF0]);
    let (mut s, _) = reader(frame_script_with(bytes, 30, 24, 36));
    let f = s.init_device().unwrap();
    assert_eq!(f.humidity, f32::from(0xA55Au16) / 10.0);
    assert_eq!(f.temperature, f32::from(0x0FF0u16) / 10.0);
}

#[test]
fn periodic_reads_track_the_device() {
    let (mut s, device) = reader(frame_script(frame([0x01, 0x90, 0x00, 0xFA])));
    s.init_device().unwrap();
    assert_eq!(s.last_reading().temperature, 25.0);

    device.set(frame_script(frame([0x01, 0x90, 0x01, 0x04])));
    let f = s.acquire_frame().unwrap();
    assert_eq!(f.temperature(), 26.0);
    assert_eq!(s.last_reading().humidity, 40.0);
}

#[test]
fn truncated_frame_times_out_and_zeroes_cache() {
    let (mut s, device) = reader(frame_script(frame([0x01, 0x90, 0x00, 0xFA])));
    s.init_device().unwrap();

    let mut short = frame_script(frame([0x01, 0x90, 0x00, 0xFA]));
    // Device stops after 20 bits: line stays low forever.
    short.truncate(3 + 2 * 20);
    short.push((Level::Low, 10_000));
    device.set(short);

    let err = s.acquire_frame().unwrap_err();
    assert!(matches!(
        err,
        SensorError::Timeout {
            expected: Level::High,
            ..
        }
    ));
    assert_eq!(s.last_reading(), ClimateReading::default());
}

#[test]
fn stretched_bit_exceeds_high_budget() {
    // A 1-bit pulse longer than the 75 µs budget.
    let (mut s, _) = reader(frame_script_with(frame([0xFF, 0xFF, 0xFF, 0xFF]), 50, 26, 120));
    assert!(matches!(
        s.init_device(),
        Err(SensorError::Timeout {
            expected: Level::Low,
            ..
        })
    ));
    assert!(!s.is_ready());
}

#[test]
fn sensor_bundle_routes_both_channels() {
    let (mut s, device) = reader(frame_script(frame([0x02, 0x8C, 0x01, 0x5F])));
    s.init_device().unwrap();
    let mut sensors = ClimateSensors::new(Some(s), Some(Lm35::new(Adc(Ok(248)))));

    assert!(sensors.climate_ready());
    assert!(sensors.probe_ready());
    assert!((sensors.sample_probe().unwrap() - 24.8).abs() < 1e-4);

    device.set(frame_script([0x02, 0x8C, 0x01, 0x5F, 0x00]));
    assert!(matches!(
        sensors.sample_climate(),
        Err(SensorError::ChecksumMismatch { received: 0x00, .. })
    ));
    assert_eq!(sensors.last_climate(), ClimateReading::default());
}

#[test]
fn absent_channels_are_not_ready() {
    let mut sensors: ClimateSensors<ScriptedLine, SimClock, Adc> = ClimateSensors::new(None, None);
    assert!(!sensors.climate_ready());
    assert_eq!(sensors.sample_climate(), Err(SensorError::NotReady));
    assert_eq!(sensors.sample_probe(), Err(SensorError::NotReady));
    assert_eq!(sensors.last_probe_celsius(), 0.0);
}
