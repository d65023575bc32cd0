/// Celsius display unit
pub const UNIT_CELSIUS: &str = "°C";
/// Percentage display unit (valve opening, O2 concentration)
pub const UNIT_PERCENT: &str = "%";
/// Parts-per-million display unit (CO concentration)
pub const UNIT_PPM: &str = "ppm";

const TEMPERATURE_TOKENS: &[&str] = &["℃", "温度", "temp"];
const PERCENT_TOKENS: &[&str] = &["%", "開度", "valve", "o2"];
const PPM_TOKENS: &[&str] = &["ppm"];

/// Infer a display unit from a sensor field label
///
/// Rules are checked in priority order (temperature, percentage, ppm) against the
/// lowercased label and the first hit wins, so "O2 temp" is still Celsius.
/// Returns an empty string when nothing matches.
pub fn infer_unit(label: &str) -> &'static str {
    let label = label.to_lowercase();
    let has_any = |tokens: &[&str]| tokens.iter().any(|token| label.contains(token));

    if has_any(TEMPERATURE_TOKENS) {
        UNIT_CELSIUS
    } else if has_any(PERCENT_TOKENS) {
        UNIT_PERCENT
    } else if has_any(PPM_TOKENS) {
        UNIT_PPM
    } else {
        ""
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_infer_unit_temperature_tokens() {
        assert_eq!(infer_unit("温度(℃)"), "°C");
        assert_eq!(infer_unit("炉内温度"), "°C");
        assert_eq!(infer_unit("Furnace TEMP"), "°C");
        assert_eq!(infer_unit("出口℃"), "°C");
    }

    #[test]
    fn test_infer_unit_percent_tokens() {
        assert_eq!(infer_unit("開度"), "%");
        assert_eq!(infer_unit("Air Valve"), "%");
        assert_eq!(infer_unit("O2濃度"), "%");
        assert_eq!(infer_unit("load %"), "%");
    }

    #[test]
    fn test_infer_unit_ppm() {
        assert_eq!(infer_unit("CO濃度(PPM)"), "ppm");
    }

    #[test]
    fn test_infer_unit_priority_order() {
        // Temperature wins over every later rule
        assert_eq!(infer_unit("valve temp"), "°C");
        assert_eq!(infer_unit("O2 温度 ppm"), "°C");
        // Percentage wins over ppm
        assert_eq!(infer_unit("O2 ppm"), "%");
    }

    #[test]
    fn test_infer_unit_no_match() {
        assert_eq!(infer_unit(""), "");
        assert_eq!(infer_unit("運転状況"), "");
        assert_eq!(infer_unit("CO濃度"), "");
    }
}
