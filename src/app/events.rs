//! Outbound application events.
//!
//! The [`AppService`](super::service::AppService) emits these through the
//! [`EventSink`](super::ports::EventSink) port.  Adapters on the other
//! side decide what to do with them (serial log, test recorder).

use super::commands::RemoteCommand;
use crate::error::{ActuatorError, CommsError, DimmerError, SensorError};
use crate::sensors::frame::ClimateReading;

/// Which sensor channel an event refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SensorChannel {
    Climate,
    Probe,
}

/// Structured events emitted by the application core.
#[derive(Debug, Clone, PartialEq)]
pub enum AppEvent {
    /// The service started; carries which optional features are live.
    Started {
        climate_ready: bool,
        probe_ready: bool,
        dimmer_ready: bool,
    },

    /// A good humidity/temperature frame was acquired.
    ClimateSampled(ClimateReading),

    /// The analog probe was sampled (°C).
    ProbeSampled(f32),

    /// A sensor read failed; its cached value is now 0.
    SensorFault(SensorChannel, SensorError),

    /// One feedback-loop tick applied a new bulb power.
    ControlApplied {
        temperature: f32,
        power: f32,
        delay_us: u32,
    },

    /// The phase controller refused a power update.
    DimmerFault(DimmerError),

    /// A remote command was executed.
    CommandExecuted(RemoteCommand),

    /// A remote command named an unknown function and was ignored.
    CommandIgnored(RemoteCommand),

    /// An inbound message could not be decoded.
    CommandRejected(CommsError),

    /// An actuator write failed.
    ActuatorFault(ActuatorError),

    /// A telemetry report was delivered.
    TelemetrySent,

    /// The link to the peer failed and was dropped.
    LinkLost(CommsError),
}
