pub mod controls;
pub mod format;
pub mod stream_ipc;
pub mod table;

pub use controls::{ControlButton, ControlPanel, TriState, CHANNELS};
pub use table::{DisplayRow, RowUpdate, TableView};

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

/// Periodic stats broadcast. Either section may be absent; an absent
/// section is skipped by the consumer, not treated as an error. Sections
/// decode independently: a malformed section (or a malformed entry inside
/// one) is dropped without losing its siblings in the same event.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct StatsPayload {
    #[serde(
        default,
        deserialize_with = "lenient_fps_section",
        skip_serializing_if = "Option::is_none"
    )]
    pub fps: Option<HashMap<String, f64>>,
    #[serde(
        default,
        deserialize_with = "lenient_system_section",
        skip_serializing_if = "Option::is_none"
    )]
    pub system: Option<HashMap<String, SystemStat>>,
}

fn lenient_fps_section<'de, D>(deserializer: D) -> Result<Option<HashMap<String, f64>>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let raw = match Option::<Value>::deserialize(deserializer)? {
        Some(Value::Object(map)) => map,
        _ => return Ok(None),
    };
    Ok(Some(
        raw.into_iter()
            .filter_map(|(channel, rate)| rate.as_f64().map(|rate| (channel, rate)))
            .collect(),
    ))
}

fn lenient_system_section<'de, D>(
    deserializer: D,
) -> Result<Option<HashMap<String, SystemStat>>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let raw = match Option::<Value>::deserialize(deserializer)? {
        Some(Value::Object(map)) => map,
        _ => return Ok(None),
    };
    Ok(Some(
        raw.into_iter()
            .filter_map(|(item, value)| {
                serde_json::from_value(value).ok().map(|stat| (item, stat))
            })
            .collect(),
    ))
}

/// A system stat item: either a bare scalar (older publishers) or an
/// object carrying an explicit unit.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum SystemStat {
    Detailed {
        value: Value,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        unit: Option<String>,
    },
    Scalar(Value),
}

impl SystemStat {
    pub fn value(&self) -> &Value {
        match self {
            SystemStat::Detailed { value, .. } => value,
            SystemStat::Scalar(value) => value,
        }
    }

    pub fn unit(&self) -> Option<&str> {
        match self {
            SystemStat::Detailed { unit, .. } => unit.as_deref().filter(|u| !u.is_empty()),
            SystemStat::Scalar(_) => None,
        }
    }

    /// Boolean reading of the stat for tri-state control resolution.
    /// Non-boolean values (file names, counters) read as `None`.
    pub fn as_flag(&self) -> Option<bool> {
        match self.value() {
            Value::Bool(flag) => Some(*flag),
            Value::String(text) => {
                if text.eq_ignore_ascii_case("true") {
                    Some(true)
                } else if text.eq_ignore_ascii_case("false") {
                    Some(false)
                } else {
                    None
                }
            }
            _ => None,
        }
    }
}

/// Decoded vehicle signals, keyed by message name then signal name.
pub type VehicleStatsPayload = HashMap<String, VehicleMessage>;

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct VehicleMessage {
    #[serde(default)]
    pub data: HashMap<String, VehicleSignal>,
    #[serde(default, flatten)]
    pub extra: HashMap<String, Value>,
}

/// A decoded signal. Older decoder generations publish a bare scalar;
/// newer ones publish `{value, name?, unit?}`. Both are accepted with a
/// per-field shape check.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum VehicleSignal {
    Detailed {
        value: Value,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        name: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        unit: Option<String>,
    },
    Scalar(Value),
}

impl VehicleSignal {
    pub fn value(&self) -> &Value {
        match self {
            VehicleSignal::Detailed { value, .. } => value,
            VehicleSignal::Scalar(value) => value,
        }
    }

    pub fn name(&self) -> Option<&str> {
        match self {
            VehicleSignal::Detailed { name, .. } => name.as_deref().filter(|n| !n.is_empty()),
            VehicleSignal::Scalar(_) => None,
        }
    }

    pub fn unit(&self) -> Option<&str> {
        match self {
            VehicleSignal::Detailed { unit, .. } => unit.as_deref().filter(|u| !u.is_empty()),
            VehicleSignal::Scalar(_) => None,
        }
    }
}

/// Remote logging control vocabulary. The emitter never changes local
/// state; effects arrive back through the stats stream.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ControlCommand {
    Start,
    Stop,
    AutoOn,
    AutoOff,
}

impl ControlCommand {
    pub fn as_str(&self) -> &'static str {
        match self {
            ControlCommand::Start => "start",
            ControlCommand::Stop => "stop",
            ControlCommand::AutoOn => "auto_on",
            ControlCommand::AutoOff => "auto_off",
        }
    }
}

impl fmt::Display for ControlCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ControlCommand {
    type Err = String;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        let normalized = input.trim().to_lowercase();
        match normalized.as_str() {
            "start" => Ok(ControlCommand::Start),
            "stop" => Ok(ControlCommand::Stop),
            "auto_on" | "auto-on" => Ok(ControlCommand::AutoOn),
            "auto_off" | "auto-off" => Ok(ControlCommand::AutoOff),
            other => Err(format!("Unknown control command: {other}")),
        }
    }
}
