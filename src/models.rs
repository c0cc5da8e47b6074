use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Body of `POST /api/estimate`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EstimateRequest {
    pub service: String,
    pub selections: BTreeMap<String, String>,
    pub quantity: u32,
}

/// Response of `POST /api/estimate`
///
/// Only `monthly_estimate` is required by the estimator, and even that one
/// defaults to zero when the pricing API leaves it out.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EstimateResponse {
    #[serde(default)]
    pub monthly_estimate: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit_price: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl EstimateResponse {
    pub fn monthly_estimate_or_zero(&self) -> f64 {
        self.monthly_estimate.unwrap_or(0.0)
    }

    /// The pricing API reports lookup failures inside a 200 response. It is
    /// only treated as a failure when no usable estimate came back.
    pub fn failure(&self) -> Option<&str> {
        match (&self.error, self.monthly_estimate) {
            (Some(err), None) => Some(err.as_str()),
            (Some(err), Some(v)) if v == 0.0 => Some(err.as_str()),
            _ => None,
        }
    }
}
