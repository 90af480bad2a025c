//! Application service: the hexagonal core.
//!
//! [`AppService`] owns the feedback loop and the small amount of state the
//! periodic tasks share (screen and link status).  Sensor readings stay in
//! the sensor adapter; the phase-control state stays in the dimmer.  All
//! I/O flows through port traits injected at call sites, so every tick is
//! testable with mock adapters.
//!
//! ```text
//!  ClimateSensorPort ──▶ ┌──────────────────────┐ ──▶ EventSink
//!                        │      AppService      │
//!       ActuatorPort  ◀──│  PID · commands      │ ──▶ TelemetryPort
//!        CommandPort  ──▶└──────────────────────┘ ──▶ DisplayPort
//! ```

use log::{info, warn};

use crate::config::SystemConfig;
use crate::control::pid::PidController;

use super::commands::RemoteCommand;
use super::events::{AppEvent, SensorChannel};
use super::ports::{
    ActuatorPort, ClimateSensorPort, CommandPort, DisplayPort, EventSink, TelemetryPort,
};
use super::screen;
use super::telemetry::TelemetryReport;

/// Largest inbound message accepted per poll.
pub const COMMAND_BUF_LEN: usize = 128;

/// Upper bound on messages handled per command-poll tick.
const MAX_COMMANDS_PER_POLL: usize = 8;

pub struct AppService {
    config: SystemConfig,
    /// Bulb-power loop fed by the single-wire sensor's temperature.
    pid: PidController,
    control_ticks: u64,
    last_power: f32,
    static_drawn: bool,
    link_up: bool,
}

impl AppService {
    /// Build the service.  The link starts down; call
    /// [`set_link_up`](Self::set_link_up) once the peer is connected.
    pub fn new(config: SystemConfig) -> Self {
        let nominal_dt = config.control_loop_interval_ms as f32 / 1000.0;
        let mut pid = PidController::new(
            config.pid_kp,
            config.pid_ki,
            config.pid_kd,
            config.initial_setpoint_c,
        )
        .with_nominal_dt(nominal_dt);
        pid.set_output_bounds(config.bulb_power_min, config.bulb_power_max);

        Self {
            config,
            pid,
            control_ticks: 0,
            last_power: 0.0,
            static_drawn: false,
            link_up: false,
        }
    }

    // ── Lifecycle ─────────────────────────────────────────────

    pub fn start(
        &mut self,
        sensors: &impl ClimateSensorPort,
        hw: &impl ActuatorPort,
        sink: &mut impl EventSink,
    ) {
        let started = AppEvent::Started {
            climate_ready: sensors.climate_ready(),
            probe_ready: sensors.probe_ready(),
            dimmer_ready: hw.dimmer_ready(),
        };
        info!("AppService started: {:?}", started);
        sink.emit(&started);
    }

    // ── Periodic ticks ────────────────────────────────────────

    /// Acquire one humidity/temperature frame.  Skipped when the sensor
    /// never completed its diagnostic read at boot.
    pub fn on_sensor_tick(
        &mut self,
        sensors: &mut impl ClimateSensorPort,
        sink: &mut impl EventSink,
    ) {
        if !sensors.climate_ready() {
            return;
        }
        match sensors.sample_climate() {
            Ok(reading) => sink.emit(&AppEvent::ClimateSampled(reading)),
            Err(e) => sink.emit(&AppEvent::SensorFault(SensorChannel::Climate, e)),
        }
    }

    pub fn on_probe_tick(&mut self, sensors: &mut impl ClimateSensorPort, sink: &mut impl EventSink) {
        if !sensors.probe_ready() {
            return;
        }
        match sensors.sample_probe() {
            Ok(celsius) => sink.emit(&AppEvent::ProbeSampled(celsius)),
            Err(e) => sink.emit(&AppEvent::SensorFault(SensorChannel::Probe, e)),
        }
    }

    /// One feedback-loop step: cached temperature in, bulb power out.
    /// Does nothing when the dimmer is not running.
    pub fn on_control_tick(
        &mut self,
        sensors: &impl ClimateSensorPort,
        hw: &mut impl ActuatorPort,
        now_us: u64,
        sink: &mut impl EventSink,
    ) {
        if !hw.dimmer_ready() {
            return;
        }
        self.control_ticks += 1;

        let temperature = sensors.last_climate().temperature;
        let power = self.pid.compute(temperature, now_us);
        match hw.set_bulb_power(power) {
            Ok(delay_us) => {
                self.last_power = power;
                sink.emit(&AppEvent::ControlApplied {
                    temperature,
                    power,
                    delay_us,
                });
            }
            Err(e) => sink.emit(&AppEvent::DimmerFault(e)),
        }
    }

    /// Send one report.  A failed send marks the link down; nothing more is
    /// sent until [`set_link_up`](Self::set_link_up) is called again.
    pub fn send_telemetry(
        &mut self,
        sensors: &impl ClimateSensorPort,
        link: &mut impl TelemetryPort,
        sink: &mut impl EventSink,
    ) {
        if !self.link_up {
            return;
        }
        let sent = self
            .build_telemetry(sensors)
            .to_json()
            .and_then(|payload| link.send(&payload));
        match sent {
            Ok(()) => sink.emit(&AppEvent::TelemetrySent),
            Err(e) => {
                warn!("telemetry: send failed ({}), dropping link", e);
                self.link_up = false;
                sink.emit(&AppEvent::LinkLost(e));
            }
        }
    }

    /// Labels are drawn on the first refresh only; values every time.
    pub fn on_display_tick(
        &mut self,
        sensors: &impl ClimateSensorPort,
        display: &mut impl DisplayPort,
        sink: &mut impl EventSink,
    ) {
        if !self.static_drawn {
            match screen::draw_static(display) {
                Ok(()) => self.static_drawn = true,
                Err(e) => {
                    sink.emit(&AppEvent::ActuatorFault(e));
                    return;
                }
            }
        }
        if let Err(e) = screen::draw_values(display, sensors.last_climate()) {
            sink.emit(&AppEvent::ActuatorFault(e));
        }
    }

    /// Drain pending inbound messages.
    pub fn poll_commands(
        &mut self,
        link: &mut impl CommandPort,
        hw: &mut impl ActuatorPort,
        sink: &mut impl EventSink,
    ) {
        if !self.link_up {
            return;
        }
        let mut buf = [0u8; COMMAND_BUF_LEN];
        for _ in 0..MAX_COMMANDS_PER_POLL {
            match link.poll(&mut buf) {
                Ok(Some(n)) => self.handle_message(&buf[..n], hw, sink),
                Ok(None) => return,
                Err(e) => {
                    warn!("command link: receive failed ({}), dropping link", e);
                    self.link_up = false;
                    sink.emit(&AppEvent::LinkLost(e));
                    return;
                }
            }
        }
    }

    // ── Command handling ──────────────────────────────────────

    /// Decode and execute one raw message.
    pub fn handle_message(
        &mut self,
        bytes: &[u8],
        hw: &mut impl ActuatorPort,
        sink: &mut impl EventSink,
    ) {
        match RemoteCommand::from_json(bytes) {
            Ok(cmd) => self.handle_command(cmd, hw, sink),
            Err(e) => {
                warn!("command: rejected {} byte message ({})", bytes.len(), e);
                sink.emit(&AppEvent::CommandRejected(e));
            }
        }
    }

    pub fn handle_command(
        &mut self,
        cmd: RemoteCommand,
        hw: &mut impl ActuatorPort,
        sink: &mut impl EventSink,
    ) {
        let outcome = match &cmd {
            RemoteCommand::ToggleIrrigation => hw.toggle_irrigation().map(|on| {
                info!("command: irrigation {}", if on { "on" } else { "off" });
            }),
            RemoteCommand::SetDesiredTemperature(celsius) => {
                self.pid.set_setpoint(*celsius);
                info!("command: setpoint {:.3} C", celsius);
                Ok(())
            }
            RemoteCommand::SetFanPower(power) => hw.set_fan_power(*power).map(|()| {
                info!("command: fan power {:.3}", power);
            }),
            RemoteCommand::Unknown(name) => {
                warn!("command: unknown function {:?}", name.as_str());
                sink.emit(&AppEvent::CommandIgnored(cmd.clone()));
                return;
            }
        };
        match outcome {
            Ok(()) => sink.emit(&AppEvent::CommandExecuted(cmd)),
            Err(e) => sink.emit(&AppEvent::ActuatorFault(e)),
        }
    }

    // ── Queries ───────────────────────────────────────────────

    pub fn build_telemetry(&self, sensors: &impl ClimateSensorPort) -> TelemetryReport {
        TelemetryReport {
            probe_c: sensors.last_probe_celsius(),
            climate: sensors.last_climate(),
        }
    }

    pub fn setpoint(&self) -> f32 {
        self.pid.setpoint()
    }

    pub fn pid(&self) -> &PidController {
        &self.pid
    }

    /// Power applied by the most recent successful control tick.
    pub fn last_power(&self) -> f32 {
        self.last_power
    }

    pub fn control_ticks(&self) -> u64 {
        self.control_ticks
    }

    pub fn link_up(&self) -> bool {
        self.link_up
    }

    pub fn set_link_up(&mut self, up: bool) {
        self.link_up = up;
    }

    pub fn config(&self) -> &SystemConfig {
        &self.config
    }
}
