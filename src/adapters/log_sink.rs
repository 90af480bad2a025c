//! Log-based event sink adapter.
//!
//! Implements [`EventSink`] by writing structured application events to
//! the ESP-IDF logger (which goes to UART in production).

use log::{info, warn};

use crate::app::events::{AppEvent, SensorChannel};
use crate::app::ports::EventSink;

/// Adapter that logs every [`AppEvent`] to the serial console.
#[derive(Default)]
pub struct LogEventSink;

impl LogEventSink {
    pub fn new() -> Self {
        Self
    }
}

impl EventSink for LogEventSink {
    fn emit(&mut self, event: &AppEvent) {
        match event {
            AppEvent::Started {
                climate_ready,
                probe_ready,
                dimmer_ready,
            } => {
                info!(
                    "START | am2302={} lm35={} dimmer={}",
                    climate_ready, probe_ready, dimmer_ready
                );
            }
            AppEvent::ClimateSampled(r) => {
                info!("AM2302 | T={:.1}\u{00b0}C | RH={:.1}%", r.temperature, r.humidity);
            }
            AppEvent::ProbeSampled(c) => {
                info!("LM35 | T={:.1}\u{00b0}C", c);
            }
            AppEvent::SensorFault(channel, e) => {
                let name = match channel {
                    SensorChannel::Climate => "AM2302",
                    SensorChannel::Probe => "LM35",
                };
                warn!("{} | read failed: {} (value reset to 0)", name, e);
            }
            AppEvent::ControlApplied {
                temperature,
                power,
                delay_us,
            } => {
                log::debug!(
                    "PID | T={:.1}\u{00b0}C -> power={:.3} delay={}us",
                    temperature, power, delay_us
                );
            }
            AppEvent::DimmerFault(e) => {
                warn!("DIMMER | {}", e);
            }
            AppEvent::CommandExecuted(cmd) => {
                info!("CMD | executed {}", cmd.name());
            }
            AppEvent::CommandIgnored(cmd) => {
                warn!("CMD | unknown function {:?}", cmd.name());
            }
            AppEvent::CommandRejected(e) => {
                warn!("CMD | rejected: {}", e);
            }
            AppEvent::ActuatorFault(e) => {
                warn!("ACTUATOR | {}", e);
            }
            AppEvent::TelemetrySent => {
                log::debug!("TELEM | sent");
            }
            AppEvent::LinkLost(e) => {
                warn!("LINK | lost: {}", e);
            }
        }
    }
}
