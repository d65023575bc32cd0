use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde_json::value::RawValue;
use tracing::{debug, warn};

use crate::domain::{HistorySeries, PlantSnapshot};
use crate::error::FetchError;

/// Where plant snapshots and history come from
#[async_trait]
pub trait TelemetrySource: Send + Sync {
    /// Current snapshot of every plant; an empty list when the source has none
    async fn fetch_overview(&self) -> Result<Vec<PlantSnapshot>, FetchError>;

    /// History of one plant's sensors over the last `range_hours` hours
    async fn fetch_history(&self, model: &str, range_hours: u32) -> Result<HistorySeries, FetchError>;
}

/// Telemetry source backed by the HTTP endpoint
///
/// Both calls hit the same URL and select the payload with an `endpoint`
/// query parameter.
pub struct HttpTelemetrySource {
    client: Client,
    endpoint: String,
}

impl HttpTelemetrySource {
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Result<Self, FetchError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            endpoint: endpoint.into(),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    async fn get_body(&self, query: &[(&str, String)]) -> Result<String, FetchError> {
        debug!(endpoint = %self.endpoint, query = ?query, "Requesting telemetry");

        let response = self.client.get(&self.endpoint).query(query).send().await?;

        let status = response.status();
        if !status.is_success() {
            warn!(endpoint = %self.endpoint, status = %status, "Telemetry source rejected request");
            return Err(FetchError::Status(status.as_u16()));
        }

        Ok(response.text().await?)
    }
}

#[async_trait]
impl TelemetrySource for HttpTelemetrySource {
    async fn fetch_overview(&self) -> Result<Vec<PlantSnapshot>, FetchError> {
        let body = self.get_body(&[("endpoint", "overview".to_string())]).await?;
        decode_overview(&body)
    }

    async fn fetch_history(&self, model: &str, range_hours: u32) -> Result<HistorySeries, FetchError> {
        let body = self
            .get_body(&[
                ("endpoint", "history".to_string()),
                ("model", model.to_string()),
                ("range_hours", range_hours.to_string()),
            ])
            .await?;
        decode_or_default(&body)
    }
}

/// Decode a JSON body where `null` (or an empty body) means "nothing"
pub fn decode_or_default<T: DeserializeOwned + Default>(body: &str) -> Result<T, FetchError> {
    if body.trim().is_empty() {
        return Ok(T::default());
    }
    let value: Option<T> = serde_json::from_str(body)?;
    Ok(value.unwrap_or_default())
}

/// Decode an overview body one plant at a time
///
/// A plant that fails to decode is logged and skipped so the rest still arrive.
/// Only a body that is not a JSON array (or null) fails as a whole.
pub fn decode_overview(body: &str) -> Result<Vec<PlantSnapshot>, FetchError> {
    let entries: Vec<Box<RawValue>> = decode_or_default(body)?;

    let plants = entries
        .iter()
        .enumerate()
        .filter_map(|(index, raw)| match serde_json::from_str::<PlantSnapshot>(raw.get()) {
            Ok(plant) => Some(plant),
            Err(e) => {
                warn!(index, error = %e, "Skipping undecodable plant snapshot");
                None
            }
        })
        .collect();

    Ok(plants)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_null_overview_is_empty() {
        let plants: Vec<PlantSnapshot> = decode_or_default("null").unwrap();
        assert!(plants.is_empty());

        let plants: Vec<PlantSnapshot> = decode_or_default("  ").unwrap();
        assert!(plants.is_empty());
    }

    #[test]
    fn test_null_history_is_empty() {
        let history: HistorySeries = decode_or_default("null").unwrap();
        assert!(history.is_empty());
    }

    #[test]
    fn test_overview_decodes_embedded_history() {
        let body = r#"[{
            "model": "KS-300",
            "customer": "Acme Corp",
            "province": "Aichi",
            "sensors": {"燃焼炉": {"温度(℃)": 700}},
            "history": {"燃焼炉": [{"time": "2024-01-01T00:00:00Z", "value": 700, "field": "温度(℃)"}]}
        }]"#;

        let plants: Vec<PlantSnapshot> = decode_or_default(body).unwrap();
        assert_eq!(plants.len(), 1);
        assert_eq!(plants[0].history.as_ref().unwrap().len(), 1);
    }

    #[test]
    fn test_empty_sensor_array_lands_plant_in_other() {
        let body = r#"[
            {"model": "KS-1", "sensors": {"燃焼炉": {"温度(℃)": 700}}},
            {"model": "KS-2", "sensors": []}
        ]"#;

        let plants = decode_overview(body).unwrap();
        assert_eq!(plants.len(), 2);
        assert!(plants[0].has_sensors());
        assert_eq!(plants[1].model, "KS-2");
        assert!(!plants[1].has_sensors());
    }

    #[test]
    fn test_undecodable_plant_is_skipped() {
        let body = r#"[
            {"model": "KS-1", "sensors": {"燃焼炉": {"温度(℃)": 700}}},
            {"model": "KS-2", "sensors": 42},
            {"model": "KS-3", "sensors": {"燃焼炉": {"温度(℃)": 650}}}
        ]"#;

        let plants = decode_overview(body).unwrap();
        let models: Vec<&str> = plants.iter().map(|p| p.model.as_str()).collect();
        assert_eq!(models, vec!["KS-1", "KS-3"]);
    }

    #[test]
    fn test_null_and_non_array_overview() {
        assert!(decode_overview("null").unwrap().is_empty());
        assert!(matches!(decode_overview("{}"), Err(FetchError::Decode(_))));
    }

    #[test]
    fn test_malformed_body_is_decode_error() {
        let result: Result<Vec<PlantSnapshot>, _> = decode_or_default("<html>");
        assert!(matches!(result, Err(FetchError::Decode(_))));
    }

    #[test]
    fn test_http_source_construction() {
        let source = HttpTelemetrySource::new("http://localhost:9/api", Duration::from_secs(5)).unwrap();
        assert_eq!(source.endpoint(), "http://localhost:9/api");
    }
}
