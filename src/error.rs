use reqwest::StatusCode;
use thiserror::Error;

/// Estimator error types
#[derive(Debug, Error)]
pub enum EstimatorError {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),
    /// HTTP request error (connection refused, timeout, ...)
    #[error("HTTP request error: {0}")]
    HttpRequest(#[from] reqwest::Error),
    /// Pricing API answered with a non-success status
    #[error("Upstream error ({status}): {message}")]
    Upstream { status: StatusCode, message: String },
    /// Response body could not be decoded
    #[error("Decode error: {0}")]
    Decode(String),
    /// Pricing API reported an error for an estimate
    #[error("Pricing error: {0}")]
    Pricing(String),
    /// Region code is not one of the supported regions
    #[error("Unknown region: {0}")]
    UnknownRegion(String),
    /// Plan file could not be loaded or applied
    #[error("Plan error: {0}")]
    Plan(String),
}

impl EstimatorError {
    /// Short machine-readable name, used in JSON output and logs
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Config(_) => "config_error",
            Self::HttpRequest(_) => "http_request_error",
            Self::Upstream { .. } => "upstream_error",
            Self::Decode(_) => "decode_error",
            Self::Pricing(_) => "pricing_error",
            Self::UnknownRegion(_) => "unknown_region",
            Self::Plan(_) => "plan_error",
        }
    }
}

impl From<serde_json::Error> for EstimatorError {
    fn from(err: serde_json::Error) -> Self {
        Self::Decode(format!("JSON error: {}", err))
    }
}
