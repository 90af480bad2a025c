//! Outbound telemetry message.
//!
//! ```text
//! {"sensors":[
//!     {"sensor":"LM135","temperature":24.8},
//!     {"sensor":"AM2302","temperature":25.1,"humidity":61.0}
//! ]}
//! ```

use serde::Serialize;

use crate::error::CommsError;
use crate::sensors::frame::ClimateReading;

/// Label the peer uses for the analog probe channel.
pub const PROBE_LABEL: &str = "LM135";
/// Label the peer uses for the single-wire sensor.
pub const CLIMATE_LABEL: &str = "AM2302";

/// A point-in-time snapshot of both temperature channels.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct TelemetryReport {
    pub probe_c: f32,
    pub climate: ClimateReading,
}

#[derive(Serialize)]
struct Wire {
    sensors: (ProbeEntry, ClimateEntry),
}

#[derive(Serialize)]
struct ProbeEntry {
    sensor: &'static str,
    temperature: f32,
}

#[derive(Serialize)]
struct ClimateEntry {
    sensor: &'static str,
    temperature: f32,
    humidity: f32,
}

impl TelemetryReport {
    pub fn to_json(&self) -> Result<String, CommsError> {
        let wire = Wire {
            sensors: (
                ProbeEntry {
                    sensor: PROBE_LABEL,
                    temperature: self.probe_c,
                },
                ClimateEntry {
                    sensor: CLIMATE_LABEL,
                    temperature: self.climate.temperature,
                    humidity: self.climate.humidity,
                },
            ),
        };
        serde_json::to_string(&wire).map_err(|_| CommsError::SendFailed)
    }
}
