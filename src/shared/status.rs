use serde::{Deserialize, Serialize};

use crate::domain::SensorReading;
use crate::sensor_schema::ReadingFields;

/// Raw code the source sends when the controller did not report a state
pub const UNRESOLVED_CODE: &str = "None";

/// Native display tokens for the canonical states
pub const AUTO_TOKEN: &str = "AUTO";
pub const COOLING_TOKEN: &str = "冷却";
pub const LOADING_ASH_TOKEN: &str = "投入・灰出";

/// Below this furnace temperature (with the valve shut) an unresolved unit is being loaded
pub const LOADING_TEMPERATURE_LIMIT_C: f64 = 40.0;

/// Normalized furnace operating state
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CanonicalStatus {
    Auto,
    Cooling,
    LoadingAsh,
    Unknown,
}

impl CanonicalStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            CanonicalStatus::Auto => "AUTO",
            CanonicalStatus::Cooling => "COOLING",
            CanonicalStatus::LoadingAsh => "LOADING_ASH",
            CanonicalStatus::Unknown => "UNKNOWN",
        }
    }

    /// Display token shown on the panel, None for Unknown
    pub fn native_token(&self) -> Option<&'static str> {
        match self {
            CanonicalStatus::Auto => Some(AUTO_TOKEN),
            CanonicalStatus::Cooling => Some(COOLING_TOKEN),
            CanonicalStatus::LoadingAsh => Some(LOADING_ASH_TOKEN),
            CanonicalStatus::Unknown => None,
        }
    }

    /// Map a native display token to its state
    fn from_native_token(code: &str) -> Option<Self> {
        match code {
            AUTO_TOKEN => Some(CanonicalStatus::Auto),
            COOLING_TOKEN => Some(CanonicalStatus::Cooling),
            LOADING_ASH_TOKEN => Some(CanonicalStatus::LoadingAsh),
            _ => None,
        }
    }

    /// Map a legacy alias code to its state
    ///
    /// The source still emits these alongside the native tokens; both paths are kept.
    fn from_alias(code: &str) -> Option<Self> {
        match code {
            "Cooling" => Some(CanonicalStatus::Cooling),
            "Auto" => Some(CanonicalStatus::Auto),
            "None2" => Some(CanonicalStatus::LoadingAsh),
            _ => None,
        }
    }
}

/// A resolved furnace status with the label to display
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ResolvedStatus {
    pub status: CanonicalStatus,
    /// Native token for known states, the raw code for unrecognised ones,
    /// None when the reading has no status field at all
    pub label: Option<String>,
}

impl ResolvedStatus {
    fn canonical(status: CanonicalStatus) -> Self {
        Self {
            status,
            label: status.native_token().map(str::to_string),
        }
    }
}

/// Resolve a furnace unit's operating status
///
/// Aliases and native tokens map directly. The unresolved sentinel is inferred
/// from the furnace temperature and the paired valve opening: a cold furnace with
/// a shut (or missing) valve is being loaded, anything else is cooling. Any other
/// code passes through as Unknown with its raw text as the label.
pub fn resolve_status(furnace: &SensorReading, paired_valve: Option<&SensorReading>) -> ResolvedStatus {
    let furnace_fields = ReadingFields::of(furnace);

    let code = match furnace_fields.status {
        Some(value) if !value.is_null() => value.to_string(),
        _ => {
            return ResolvedStatus {
                status: CanonicalStatus::Unknown,
                label: None,
            }
        }
    };

    if let Some(status) = CanonicalStatus::from_alias(&code) {
        return ResolvedStatus::canonical(status);
    }

    if code == UNRESOLVED_CODE {
        let temperature = furnace_fields.temperature_or_zero();
        let opening = paired_valve
            .map(|valve| ReadingFields::of(valve).opening_or_zero())
            .unwrap_or(0.0);
        return ResolvedStatus::canonical(infer_unresolved(temperature, opening));
    }

    match CanonicalStatus::from_native_token(&code) {
        Some(status) => ResolvedStatus::canonical(status),
        None => ResolvedStatus {
            status: CanonicalStatus::Unknown,
            label: Some(code),
        },
    }
}

/// Fallback rule for the unresolved sentinel
pub fn infer_unresolved(temperature_c: f64, valve_opening: f64) -> CanonicalStatus {
    if temperature_c < LOADING_TEMPERATURE_LIMIT_C && valve_opening == 0.0 {
        CanonicalStatus::LoadingAsh
    } else {
        CanonicalStatus::Cooling
    }
}
