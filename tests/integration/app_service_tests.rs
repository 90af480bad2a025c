//! Integration tests for the AppService → ports pipeline.
//!
//! These run on the host and verify each periodic tick and the remote
//! command chain down to actuator calls, using the recording mocks.

use crate::mock_hw::{ActuatorCall, MockHardware, MockLink, MockSensors, RecordingSink};

use greenhouse::adapters::display::LogDisplay;
use greenhouse::app::commands::RemoteCommand;
use greenhouse::app::events::{AppEvent, SensorChannel};
use greenhouse::app::service::AppService;
use greenhouse::config::SystemConfig;
use greenhouse::error::{CommsError, SensorError};
use greenhouse::sensors::frame::ClimateReading;

fn make_app() -> (AppService, MockHardware, RecordingSink) {
    let mut app = AppService::new(SystemConfig::default());
    app.set_link_up(true);
    (app, MockHardware::new(), RecordingSink::new())
}

// ── Start ─────────────────────────────────────────────────────

#[test]
fn start_reports_feature_availability() {
    let (mut app, hw, mut sink) = make_app();
    let mut sensors = MockSensors::new();
    sensors.probe_ready = false;
    app.start(&sensors, &hw, &mut sink);
    assert_eq!(
        sink.events,
        vec![AppEvent::Started {
            climate_ready: true,
            probe_ready: false,
            dimmer_ready: true,
        }]
    );
}

// ── Sampling ticks ────────────────────────────────────────────

#[test]
fn sensor_tick_reports_sample_and_fault() {
    let (mut app, _hw, mut sink) = make_app();
    let mut sensors = MockSensors::new();
    let good = ClimateReading {
        humidity: 61.0,
        temperature: 24.5,
    };
    let timeout = SensorError::Timeout {
        expected: greenhouse::sensors::frame::Level::High,
        waited_us: 80,
    };
    sensors.climate_samples.push_back(Ok(good));
    sensors.climate_samples.push_back(Err(timeout));

    app.on_sensor_tick(&mut sensors, &mut sink);
    app.on_sensor_tick(&mut sensors, &mut sink);

    assert_eq!(
        sink.events,
        vec![
            AppEvent::ClimateSampled(good),
            AppEvent::SensorFault(SensorChannel::Climate, timeout),
        ]
    );
    assert_eq!(sensors.last_climate, ClimateReading::default());
}

#[test]
fn sensor_tick_skipped_when_sensor_never_initialised() {
    let (mut app, _hw, mut sink) = make_app();
    let mut sensors = MockSensors::new();
    sensors.climate_ready = false;
    sensors.climate_samples.push_back(Ok(ClimateReading::default()));
    app.on_sensor_tick(&mut sensors, &mut sink);
    assert!(sink.events.is_empty());
    assert_eq!(sensors.climate_samples.len(), 1);
}

#[test]
fn probe_tick_reports_sample() {
    let (mut app, _hw, mut sink) = make_app();
    let mut sensors = MockSensors::new();
    sensors.probe_samples.push_back(Ok(22.4));
    app.on_probe_tick(&mut sensors, &mut sink);
    assert_eq!(sink.events, vec![AppEvent::ProbeSampled(22.4)]);
}

// ── Control loop ──────────────────────────────────────────────

#[test]
fn control_tick_feeds_cached_temperature_to_dimmer() {
    let (mut app, mut hw, mut sink) = make_app();
    // Default setpoint 0 °C with a 25 °C room: error is negative,
    // output clamps to the lower bound.
    let sensors = MockSensors::with_climate(25.0, 50.0);
    for tick in 0..4u64 {
        app.on_control_tick(&sensors, &mut hw, tick * 250_000, &mut sink);
    }
    assert_eq!(hw.bulb_powers(), vec![0.0; 4]);
    assert_eq!(app.control_ticks(), 4);
    assert!(matches!(
        sink.events.last(),
        Some(AppEvent::ControlApplied { temperature, power, .. })
            if *temperature == 25.0 && *power == 0.0
    ));
}

#[test]
fn control_tick_requires_dimmer() {
    let mut app = AppService::new(SystemConfig::default());
    let mut hw = MockHardware::without_dimmer();
    let mut sink = RecordingSink::new();
    app.on_control_tick(&MockSensors::with_climate(10.0, 50.0), &mut hw, 0, &mut sink);
    assert!(hw.calls.is_empty());
    assert!(sink.events.is_empty());
}

#[test]
fn raising_setpoint_increases_bulb_power() {
    let (mut app, mut hw, mut sink) = make_app();
    let sensors = MockSensors::with_climate(25.0, 50.0);
    app.on_control_tick(&sensors, &mut hw, 0, &mut sink);

    app.handle_command(RemoteCommand::SetDesiredTemperature(25.5), &mut hw, &mut sink);
    app.on_control_tick(&sensors, &mut hw, 250_000, &mut sink);

    let powers = hw.bulb_powers();
    assert_eq!(powers[0], 0.0);
    assert!(powers[1] > 0.0 && powers[1] <= 1.0, "got {}", powers[1]);
}

// ── Commands ──────────────────────────────────────────────────

#[test]
fn toggle_irrigation_message_flips_output() {
    let (mut app, mut hw, mut sink) = make_app();
    app.handle_message(br#"{"function":"toggleIrrigation","argument":0}"#, &mut hw, &mut sink);
    assert!(hw.irrigation);
    app.handle_message(br#"{"function":"toggleIrrigation"}"#, &mut hw, &mut sink);
    assert!(!hw.irrigation);
    assert_eq!(
        sink.count(|e| matches!(e, AppEvent::CommandExecuted(RemoteCommand::ToggleIrrigation))),
        2
    );
}

#[test]
fn fan_power_message_reaches_fan() {
    let (mut app, mut hw, mut sink) = make_app();
    app.handle_message(br#"{"function":"setFanPower","argument":0.4}"#, &mut hw, &mut sink);
    assert_eq!(hw.last_call(), Some(&ActuatorCall::FanPower(0.4)));
}

#[test]
fn fan_failure_is_reported() {
    let (mut app, mut hw, mut sink) = make_app();
    hw.fail_fan = true;
    app.handle_command(RemoteCommand::SetFanPower(0.4), &mut hw, &mut sink);
    assert!(matches!(sink.events.last(), Some(AppEvent::ActuatorFault(_))));
}

#[test]
fn unknown_function_is_ignored() {
    let (mut app, mut hw, mut sink) = make_app();
    app.handle_message(br#"{"function":"openRoof","argument":1}"#, &mut hw, &mut sink);
    assert!(hw.calls.is_empty());
    assert!(matches!(
        sink.events.as_slice(),
        [AppEvent::CommandIgnored(RemoteCommand::Unknown(name))] if name.as_str() == "openRoof"
    ));
}

#[test]
fn garbage_message_is_rejected() {
    let (mut app, mut hw, mut sink) = make_app();
    app.handle_message(b"not json", &mut hw, &mut sink);
    assert_eq!(
        sink.events,
        vec![AppEvent::CommandRejected(CommsError::MalformedCommand)]
    );
}

#[test]
fn poll_drains_inbox() {
    let (mut app, mut hw, mut sink) = make_app();
    let mut link = MockLink::new();
    link.queue(r#"{"function":"setDesiredTemperature","argument":27.5}"#);
    link.queue(r#"{"function":"toggleIrrigation"}"#);

    app.poll_commands(&mut link, &mut hw, &mut sink);

    assert!(link.inbox.is_empty());
    assert_eq!(app.setpoint(), 27.5);
    assert!(hw.irrigation);
}

#[test]
fn poll_failure_drops_link() {
    let (mut app, mut hw, mut sink) = make_app();
    let mut link = MockLink::new();
    link.fail_poll = true;
    app.poll_commands(&mut link, &mut hw, &mut sink);
    assert!(!app.link_up());
    assert_eq!(
        sink.events,
        vec![AppEvent::LinkLost(CommsError::ConnectionClosed)]
    );
}

// ── Telemetry ─────────────────────────────────────────────────

#[test]
fn telemetry_carries_both_channels() {
    let (mut app, _hw, mut sink) = make_app();
    let mut sensors = MockSensors::with_climate(25.0, 60.0);
    sensors.probe_samples.push_back(Ok(23.5));
    app.on_probe_tick(&mut sensors, &mut sink);

    let mut link = MockLink::new();
    app.send_telemetry(&sensors, &mut link, &mut sink);

    assert_eq!(
        link.sent,
        vec![
            r#"{"sensors":[{"sensor":"LM135","temperature":23.5},{"sensor":"AM2302","temperature":25.0,"humidity":60.0}]}"#
        ]
    );
    assert_eq!(sink.events.last(), Some(&AppEvent::TelemetrySent));
}

#[test]
fn send_failure_stops_telemetry() {
    let (mut app, _hw, mut sink) = make_app();
    let sensors = MockSensors::new();
    let mut link = MockLink::new();
    link.fail_send = true;

    app.send_telemetry(&sensors, &mut link, &mut sink);
    assert!(!app.link_up());

    link.fail_send = false;
    app.send_telemetry(&sensors, &mut link, &mut sink);
    assert!(link.sent.is_empty());
    assert_eq!(
        sink.count(|e| matches!(e, AppEvent::LinkLost(CommsError::SendFailed))),
        1
    );
}

// ── Display ───────────────────────────────────────────────────

#[test]
fn display_shows_labels_and_values() {
    let (mut app, _hw, mut sink) = make_app();
    let sensors = MockSensors::with_climate(24.5, 61.0);
    let mut display = LogDisplay::new();

    app.on_display_tick(&sensors, &mut display, &mut sink);

    assert_eq!(display.row(0), "Tempture:24.5\u{b0}C ");
    assert_eq!(display.row(1), "Humidity:61.0%  ");
    assert!(sink.events.is_empty());
}
