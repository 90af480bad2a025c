//! Inbound commands to the application service.
//!
//! The telemetry peer sends one JSON object per message:
//!
//! ```text
//! {"function": "setDesiredTemperature", "argument": 28.5}
//! ```
//!
//! The [`AppService`](super::service::AppService) interprets the decoded
//! [`RemoteCommand`] and acts upon it.

use heapless::String;
use serde::Deserialize;

use crate::error::CommsError;

/// Longest function name accepted on the wire.
pub const MAX_FUNCTION_NAME: usize = 32;

/// Commands the remote peer can send into the application core.
#[derive(Debug, Clone, PartialEq)]
pub enum RemoteCommand {
    /// Flip the irrigation output.
    ToggleIrrigation,

    /// New feedback-loop setpoint in °C.
    SetDesiredTemperature(f32),

    /// Fan power in [0, 1].
    SetFanPower(f32),

    /// Well-formed message naming a function this node does not know.
    Unknown(String<MAX_FUNCTION_NAME>),
}

#[derive(Deserialize)]
struct WireCommand {
    function: String<MAX_FUNCTION_NAME>,
    #[serde(default)]
    argument: Option<f32>,
}

impl RemoteCommand {
    /// Decode one message.  A missing or null `argument` reads as 0.
    pub fn from_json(bytes: &[u8]) -> Result<Self, CommsError> {
        let wire: WireCommand =
            serde_json::from_slice(bytes).map_err(|_| CommsError::MalformedCommand)?;
        let arg = wire.argument.unwrap_or(0.0);
        if !arg.is_finite() {
            return Err(CommsError::MalformedCommand);
        }

        Ok(match wire.function.as_str() {
            "toggleIrrigation" => Self::ToggleIrrigation,
            "setDesiredTemperature" => Self::SetDesiredTemperature(arg),
            "setFanPower" => Self::SetFanPower(arg),
            _ => Self::Unknown(wire.function),
        })
    }

    /// Wire name of the command.
    pub fn name(&self) -> &str {
        match self {
            Self::ToggleIrrigation => "toggleIrrigation",
            Self::SetDesiredTemperature(_) => "setDesiredTemperature",
            Self::SetFanPower(_) => "setFanPower",
            Self::Unknown(name) => name.as_str(),
        }
    }
}
