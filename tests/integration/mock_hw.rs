//! Mock adapters for integration tests.
//!
//! Records every actuator call, event and outbound message so tests can
//! assert on the full history without touching real GPIO/PWM registers
//! or sockets.

use std::collections::VecDeque;

use greenhouse::app::events::AppEvent;
use greenhouse::app::ports::{
    ActuatorPort, ClimateSensorPort, CommandPort, EventSink, TelemetryPort,
};
use greenhouse::error::{ActuatorError, CommsError, DimmerError, SensorError};
use greenhouse::sensors::frame::ClimateReading;

// ── Actuator call record ──────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub enum ActuatorCall {
    BulbPower(f32),
    FanPower(f32),
    ToggleIrrigation,
}

// ── MockHardware ──────────────────────────────────────────────

pub struct MockHardware {
    pub calls: Vec<ActuatorCall>,
    pub dimmer_ready: bool,
    pub fan: f32,
    pub irrigation: bool,
    pub fail_fan: bool,
}

#[allow(dead_code)]
impl MockHardware {
    pub fn new() -> Self {
        Self {
            calls: Vec::new(),
            dimmer_ready: true,
            fan: 0.0,
            irrigation: false,
            fail_fan: false,
        }
    }

    pub fn without_dimmer() -> Self {
        Self {
            dimmer_ready: false,
            ..Self::new()
        }
    }

    pub fn bulb_powers(&self) -> Vec<f32> {
        self.calls
            .iter()
            .filter_map(|c| match c {
                ActuatorCall::BulbPower(p) => Some(*p),
                _ => None,
            })
            .collect()
    }

    pub fn last_call(&self) -> Option<&ActuatorCall> {
        self.calls.last()
    }
}

impl Default for MockHardware {
    fn default() -> Self {
        Self::new()
    }
}

impl ActuatorPort for MockHardware {
    fn dimmer_ready(&self) -> bool {
        self.dimmer_ready
    }

    fn set_bulb_power(&mut self, power: f32) -> Result<u32, DimmerError> {
        if !self.dimmer_ready {
            return Err(DimmerError::NotInitialized);
        }
        self.calls.push(ActuatorCall::BulbPower(power));
        Ok(((1.0 - power) * 8000.0) as u32)
    }

    fn set_fan_power(&mut self, power: f32) -> Result<(), ActuatorError> {
        if self.fail_fan {
            return Err(ActuatorError::PwmWriteFailed);
        }
        self.calls.push(ActuatorCall::FanPower(power));
        self.fan = power;
        Ok(())
    }

    fn fan_power(&self) -> f32 {
        self.fan
    }

    fn toggle_irrigation(&mut self) -> Result<bool, ActuatorError> {
        self.calls.push(ActuatorCall::ToggleIrrigation);
        self.irrigation = !self.irrigation;
        Ok(self.irrigation)
    }

    fn irrigation_on(&self) -> bool {
        self.irrigation
    }
}

// ── MockSensors ───────────────────────────────────────────────

/// Sensors whose next samples are queued by the test.
pub struct MockSensors {
    pub climate_ready: bool,
    pub probe_ready: bool,
    pub climate_samples: VecDeque<Result<ClimateReading, SensorError>>,
    pub probe_samples: VecDeque<Result<f32, SensorError>>,
    pub last_climate: ClimateReading,
    pub last_probe: f32,
}

#[allow(dead_code)]
impl MockSensors {
    pub fn new() -> Self {
        Self {
            climate_ready: true,
            probe_ready: true,
            climate_samples: VecDeque::new(),
            probe_samples: VecDeque::new(),
            last_climate: ClimateReading::default(),
            last_probe: 0.0,
        }
    }

    pub fn with_climate(temperature: f32, humidity: f32) -> Self {
        let mut s = Self::new();
        s.last_climate = ClimateReading {
            humidity,
            temperature,
        };
        s
    }
}

impl Default for MockSensors {
    fn default() -> Self {
        Self::new()
    }
}

impl ClimateSensorPort for MockSensors {
    fn climate_ready(&self) -> bool {
        self.climate_ready
    }

    fn sample_climate(&mut self) -> Result<ClimateReading, SensorError> {
        let next = self
            .climate_samples
            .pop_front()
            .unwrap_or(Err(SensorError::NotReady));
        self.last_climate = next.unwrap_or_default();
        next
    }

    fn last_climate(&self) -> ClimateReading {
        self.last_climate
    }

    fn probe_ready(&self) -> bool {
        self.probe_ready
    }

    fn sample_probe(&mut self) -> Result<f32, SensorError> {
        let next = self
            .probe_samples
            .pop_front()
            .unwrap_or(Err(SensorError::AdcReadFailed));
        self.last_probe = next.unwrap_or(0.0);
        next
    }

    fn last_probe_celsius(&self) -> f32 {
        self.last_probe
    }
}

// ── MockLink ──────────────────────────────────────────────────

/// In-memory peer: `sent` collects telemetry, `inbox` feeds commands.
pub struct MockLink {
    pub sent: Vec<String>,
    pub inbox: VecDeque<Vec<u8>>,
    pub fail_send: bool,
    pub fail_poll: bool,
}

#[allow(dead_code)]
impl MockLink {
    pub fn new() -> Self {
        Self {
            sent: Vec::new(),
            inbox: VecDeque::new(),
            fail_send: false,
            fail_poll: false,
        }
    }

    pub fn queue(&mut self, message: &str) {
        self.inbox.push_back(message.as_bytes().to_vec());
    }
}

impl Default for MockLink {
    fn default() -> Self {
        Self::new()
    }
}

impl TelemetryPort for MockLink {
    fn send(&mut self, payload: &str) -> Result<(), CommsError> {
        if self.fail_send {
            return Err(CommsError::SendFailed);
        }
        self.sent.push(payload.to_owned());
        Ok(())
    }
}

impl CommandPort for MockLink {
    fn poll(&mut self, buf: &mut [u8]) -> Result<Option<usize>, CommsError> {
        if self.fail_poll {
            return Err(CommsError::ConnectionClosed);
        }
        let Some(msg) = self.inbox.pop_front() else {
            return Ok(None);
        };
        let n = msg.len().min(buf.len());
        buf[..n].copy_from_slice(&msg[..n]);
        Ok(Some(n))
    }
}

// ── RecordingSink ─────────────────────────────────────────────

pub struct RecordingSink {
    pub events: Vec<AppEvent>,
}

#[allow(dead_code)]
impl RecordingSink {
    pub fn new() -> Self {
        Self { events: Vec::new() }
    }

    pub fn count(&self, pred: impl Fn(&AppEvent) -> bool) -> usize {
        self.events.iter().filter(|e| pred(e)).count()
    }
}

impl Default for RecordingSink {
    fn default() -> Self {
        Self::new()
    }
}

impl EventSink for RecordingSink {
    fn emit(&mut self, event: &AppEvent) {
        self.events.push(event.clone());
    }
}
