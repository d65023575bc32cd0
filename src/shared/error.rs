use thiserror::Error;

/// Failure of a telemetry request
///
/// Domain operations never fail; only the trip to the telemetry source does.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("Telemetry request failed: {0}")]
    Transport(String),

    #[error("Telemetry source returned HTTP {0}")]
    Status(u16),

    #[error("Telemetry payload could not be decoded: {0}")]
    Decode(String),
}

impl FetchError {
    /// Stable machine-readable code for logs
    pub fn code(&self) -> &'static str {
        match self {
            FetchError::Transport(_) => error_codes::TRANSPORT_ERROR,
            FetchError::Status(_) => error_codes::UPSTREAM_STATUS,
            FetchError::Decode(_) => error_codes::DECODE_ERROR,
        }
    }
}

impl From<reqwest::Error> for FetchError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            FetchError::Decode(err.to_string())
        } else if let Some(status) = err.status() {
            FetchError::Status(status.as_u16())
        } else {
            FetchError::Transport(err.to_string())
        }
    }
}

impl From<serde_json::Error> for FetchError {
    fn from(err: serde_json::Error) -> Self {
        FetchError::Decode(err.to_string())
    }
}

/// Error codes attached to fetch failures in logs
pub mod error_codes {
    pub const TRANSPORT_ERROR: &str = "TRANSPORT_ERROR";
    pub const UPSTREAM_STATUS: &str = "UPSTREAM_STATUS";
    pub const DECODE_ERROR: &str = "DECODE_ERROR";
}
