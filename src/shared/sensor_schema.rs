use crate::domain::{FieldValue, SensorReading};
use crate::units::infer_unit;

// ============================================================================
// Sensor families
// ============================================================================

/// Name fragment shared by every dry-distillation gasification furnace unit
pub const FURNACE_FAMILY: &str = "乾溜ガス化炉";
/// Name fragment shared by every dry-distillation air valve unit
pub const VALVE_FAMILY: &str = "乾溜空気弁";
/// Exact name of the combustion furnace sensor
pub const COMBUSTION_FURNACE: &str = "燃焼炉";
/// Exact name of the exhaust-gas concentration panel
pub const EXHAUST_PANEL: &str = "排ガス濃度";

/// What a named sensor entry represents
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SensorKind {
    /// A gasification furnace; the suffix pairs it with a valve
    FurnaceUnit { suffix: Option<char> },
    /// An air valve; the suffix pairs it with a furnace
    ValveUnit { suffix: Option<char> },
    CombustionFurnace,
    ExhaustPanel,
    Other,
}

/// Classify a sensor by its name
///
/// Exact names are checked before family fragments, so a sensor literally named
/// "燃焼炉" is never mistaken for a family member.
pub fn classify_sensor(name: &str) -> SensorKind {
    if name == COMBUSTION_FURNACE {
        SensorKind::CombustionFurnace
    } else if name == EXHAUST_PANEL {
        SensorKind::ExhaustPanel
    } else if name.contains(FURNACE_FAMILY) {
        SensorKind::FurnaceUnit {
            suffix: unit_suffix(name),
        }
    } else if name.contains(VALVE_FAMILY) {
        SensorKind::ValveUnit {
            suffix: unit_suffix(name),
        }
    } else {
        SensorKind::Other
    }
}

/// Unit suffix of a sensor name: its last character when that is 'A'..='Z'
pub fn unit_suffix(name: &str) -> Option<char> {
    name.chars().last().filter(|c| c.is_ascii_uppercase())
}

// ============================================================================
// Field roles
// ============================================================================

/// What a field inside a sensor reading measures
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldRole {
    Status,
    Temperature,
    Opening,
    CarbonMonoxide,
    Oxygen,
}

impl FieldRole {
    /// Whether a field label carries this role
    ///
    /// Roles are not exclusive: "valve temp" is both a temperature and an opening.
    pub fn matches(self, label: &str) -> bool {
        match self {
            FieldRole::Status => {
                label.contains("運転状況") || label.to_lowercase().contains("status")
            }
            FieldRole::Temperature => {
                label.contains("温度") || label.to_lowercase().contains("temp")
            }
            FieldRole::Opening => {
                label.contains("開度") || label.contains('%') || label.to_lowercase().contains("valve")
            }
            // Exhaust gas labels are matched case-sensitively
            FieldRole::CarbonMonoxide => label.contains("CO"),
            FieldRole::Oxygen => label.contains("O2"),
        }
    }
}

/// A located field value together with its inferred unit
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Measurement<'a> {
    pub label: &'a str,
    pub value: &'a FieldValue,
    pub unit: &'static str,
}

impl Measurement<'_> {
    /// Numeric value with missing or malformed input read as 0
    pub fn number_or_zero(&self) -> f64 {
        self.value.as_number_or_zero()
    }
}

/// The interesting fields of one reading, located in a single pass
///
/// For each role the first matching field (in the reading's own order) wins.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReadingFields<'a> {
    pub status: Option<&'a FieldValue>,
    pub temperature: Option<Measurement<'a>>,
    pub opening: Option<Measurement<'a>>,
    pub carbon_monoxide: Option<&'a FieldValue>,
    pub oxygen: Option<&'a FieldValue>,
}

impl<'a> ReadingFields<'a> {
    pub fn of(reading: &'a SensorReading) -> Self {
        let mut fields = ReadingFields::default();

        for (label, value) in reading.fields() {
            let measurement = || Measurement {
                label,
                value,
                unit: infer_unit(label),
            };

            if fields.status.is_none() && FieldRole::Status.matches(label) {
                fields.status = Some(value);
            }
            if fields.temperature.is_none() && FieldRole::Temperature.matches(label) {
                fields.temperature = Some(measurement());
            }
            if fields.opening.is_none() && FieldRole::Opening.matches(label) {
                fields.opening = Some(measurement());
            }
            if fields.carbon_monoxide.is_none() && FieldRole::CarbonMonoxide.matches(label) {
                fields.carbon_monoxide = Some(value);
            }
            if fields.oxygen.is_none() && FieldRole::Oxygen.matches(label) {
                fields.oxygen = Some(value);
            }
        }

        fields
    }

    /// Temperature as a number, 0 when absent or malformed
    pub fn temperature_or_zero(&self) -> f64 {
        self.temperature.map(|m| m.number_or_zero()).unwrap_or(0.0)
    }

    /// Opening as a number, 0 when absent or malformed
    pub fn opening_or_zero(&self) -> f64 {
        self.opening.map(|m| m.number_or_zero()).unwrap_or(0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_sensor_families() {
        assert_eq!(
            classify_sensor("乾溜ガス化炉A"),
            SensorKind::FurnaceUnit { suffix: Some('A') }
        );
        assert_eq!(
            classify_sensor("乾溜空気弁C"),
            SensorKind::ValveUnit { suffix: Some('C') }
        );
        assert_eq!(
            classify_sensor("乾溜ガス化炉"),
            SensorKind::FurnaceUnit { suffix: None }
        );
        assert_eq!(classify_sensor("燃焼炉"), SensorKind::CombustionFurnace);
        assert_eq!(classify_sensor("排ガス濃度"), SensorKind::ExhaustPanel);
        assert_eq!(classify_sensor("燃焼炉B"), SensorKind::Other);
        assert_eq!(classify_sensor("外気温"), SensorKind::Other);
    }

    #[test]
    fn test_unit_suffix() {
        assert_eq!(unit_suffix("乾溜ガス化炉Z"), Some('Z'));
        assert_eq!(unit_suffix("乾溜ガス化炉a"), None);
        assert_eq!(unit_suffix("乾溜ガス化炉1"), None);
        assert_eq!(unit_suffix("乾溜ガス化炉Ａ"), None); // full-width letter
        assert_eq!(unit_suffix(""), None);
    }

    #[test]
    fn test_field_roles() {
        assert!(FieldRole::Status.matches("運転状況"));
        assert!(FieldRole::Status.matches("Status"));
        assert!(FieldRole::Temperature.matches("温度(℃)"));
        assert!(FieldRole::Temperature.matches("Temp"));
        assert!(FieldRole::Opening.matches("開度(%)"));
        assert!(FieldRole::Opening.matches("Valve"));
        assert!(FieldRole::CarbonMonoxide.matches("CO濃度(ppm)"));
        assert!(!FieldRole::CarbonMonoxide.matches("co濃度"));
        assert!(FieldRole::Oxygen.matches("O2濃度(%)"));
    }

    #[test]
    fn test_reading_fields_first_match_wins() {
        let reading: SensorReading = vec![
            ("運転状況", FieldValue::from("AUTO")),
            ("温度(℃)", FieldValue::from(650.0)),
            ("出口温度(℃)", FieldValue::from(120.0)),
        ]
        .into_iter()
        .collect();

        let fields = ReadingFields::of(&reading);
        assert_eq!(fields.status, Some(&FieldValue::from("AUTO")));
        let temperature = fields.temperature.unwrap();
        assert_eq!(temperature.label, "温度(℃)");
        assert_eq!(temperature.unit, "°C");
        assert_eq!(fields.temperature_or_zero(), 650.0);
        assert!(fields.opening.is_none());
        assert_eq!(fields.opening_or_zero(), 0.0);
    }

    #[test]
    fn test_reading_fields_malformed_numbers_are_zero() {
        let reading: SensorReading = vec![
            ("温度", FieldValue::from("---")),
            ("開度", FieldValue::Null),
        ]
        .into_iter()
        .collect();

        let fields = ReadingFields::of(&reading);
        assert_eq!(fields.temperature_or_zero(), 0.0);
        assert_eq!(fields.opening_or_zero(), 0.0);
        assert_eq!(fields.opening.unwrap().unit, "%");
    }
}
