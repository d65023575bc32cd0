use std::str::FromStr;
use std::time::Duration;

use incinerator_monitor::{DEFAULT_RANGE_STEP, DEFAULT_REFRESH_INTERVAL};

const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;
const DEFAULT_DISPLAY_UTC_OFFSET_HOURS: i32 = 9;

/// Configuration shared by the monitor and history binaries
#[derive(Debug, Clone, PartialEq)]
pub struct MonitorConfig {
    /// Telemetry endpoint URL
    pub endpoint: String,
    /// Period between automatic refreshes
    pub refresh_interval: Duration,
    /// Per-request timeout for the telemetry source
    pub request_timeout: Duration,
    /// Initial dashboard search query
    pub search_query: String,
    /// UTC offset used for human-readable timestamps
    pub display_utc_offset_hours: i32,
    /// Detail chart range selector step
    pub history_range_step: u32,
}

impl MonitorConfig {
    /// Create a new MonitorConfig from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Create a MonitorConfig from an arbitrary variable lookup
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let endpoint = required(&lookup, "TELEMETRY_ENDPOINT")?;

        let refresh_secs = parsed(&lookup, "REFRESH_INTERVAL_SECS", DEFAULT_REFRESH_INTERVAL.as_secs())?;
        if refresh_secs == 0 {
            return Err(ConfigError::InvalidValue {
                name: "REFRESH_INTERVAL_SECS".to_string(),
                value: "0".to_string(),
            });
        }

        Ok(MonitorConfig {
            endpoint,
            refresh_interval: Duration::from_secs(refresh_secs),
            request_timeout: Duration::from_secs(parsed(
                &lookup,
                "REQUEST_TIMEOUT_SECS",
                DEFAULT_REQUEST_TIMEOUT_SECS,
            )?),
            search_query: lookup("SEARCH_QUERY").unwrap_or_default(),
            display_utc_offset_hours: parsed(
                &lookup,
                "DISPLAY_UTC_OFFSET_HOURS",
                DEFAULT_DISPLAY_UTC_OFFSET_HOURS,
            )?,
            history_range_step: parsed(&lookup, "HISTORY_RANGE_STEP", DEFAULT_RANGE_STEP)?,
        })
    }

    /// Plant model whose history the history binary fetches
    pub fn history_model_from_env() -> Result<String, ConfigError> {
        required(&|name: &str| std::env::var(name).ok(), "HISTORY_MODEL")
    }
}

fn required(lookup: &impl Fn(&str) -> Option<String>, name: &str) -> Result<String, ConfigError> {
    lookup(name)
        .filter(|value| !value.trim().is_empty())
        .ok_or_else(|| ConfigError::MissingEnvVar(name.to_string()))
}

fn parsed<T: FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    name: &str,
    default: T,
) -> Result<T, ConfigError> {
    match lookup(name) {
        None => Ok(default),
        Some(raw) => raw.trim().parse().map_err(|_| ConfigError::InvalidValue {
            name: name.to_string(),
            value: raw,
        }),
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Invalid value for {name}: {value:?}")]
    InvalidValue { name: String, value: String },
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| vars.get(name).cloned()
    }

    #[test]
    fn test_config_missing_endpoint() {
        let result = MonitorConfig::from_lookup(lookup(&[]));
        assert_eq!(
            result,
            Err(ConfigError::MissingEnvVar("TELEMETRY_ENDPOINT".to_string()))
        );
    }

    #[test]
    fn test_config_defaults() {
        let config =
            MonitorConfig::from_lookup(lookup(&[("TELEMETRY_ENDPOINT", "https://example.test/api")]))
                .unwrap();

        assert_eq!(config.endpoint, "https://example.test/api");
        assert_eq!(config.refresh_interval, Duration::from_secs(60));
        assert_eq!(config.request_timeout, Duration::from_secs(30));
        assert_eq!(config.search_query, "");
        assert_eq!(config.display_utc_offset_hours, 9);
        assert_eq!(config.history_range_step, 24);
    }

    #[test]
    fn test_config_overrides() {
        let config = MonitorConfig::from_lookup(lookup(&[
            ("TELEMETRY_ENDPOINT", "http://localhost:8080"),
            ("REFRESH_INTERVAL_SECS", "15"),
            ("REQUEST_TIMEOUT_SECS", " 5 "),
            ("SEARCH_QUERY", "acme"),
            ("DISPLAY_UTC_OFFSET_HOURS", "-5"),
            ("HISTORY_RANGE_STEP", "30"),
        ]))
        .unwrap();

        assert_eq!(config.refresh_interval, Duration::from_secs(15));
        assert_eq!(config.request_timeout, Duration::from_secs(5));
        assert_eq!(config.search_query, "acme");
        assert_eq!(config.display_utc_offset_hours, -5);
        assert_eq!(config.history_range_step, 30);
    }

    #[test]
    fn test_config_invalid_values() {
        let result = MonitorConfig::from_lookup(lookup(&[
            ("TELEMETRY_ENDPOINT", "http://localhost:8080"),
            ("REFRESH_INTERVAL_SECS", "soon"),
        ]));
        assert_eq!(
            result,
            Err(ConfigError::InvalidValue {
                name: "REFRESH_INTERVAL_SECS".to_string(),
                value: "soon".to_string(),
            })
        );

        let zero = MonitorConfig::from_lookup(lookup(&[
            ("TELEMETRY_ENDPOINT", "http://localhost:8080"),
            ("REFRESH_INTERVAL_SECS", "0"),
        ]));
        assert!(matches!(zero, Err(ConfigError::InvalidValue { .. })));
    }

    #[test]
    fn test_blank_endpoint_is_missing() {
        let result = MonitorConfig::from_lookup(lookup(&[("TELEMETRY_ENDPOINT", "  ")]));
        assert!(matches!(result, Err(ConfigError::MissingEnvVar(_))));
    }
}
