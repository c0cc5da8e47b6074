use crate::{
    config::ApiConfig,
    error::EstimatorError,
    models::{EstimateRequest, EstimateResponse},
};
use async_trait::async_trait;
use reqwest::{Client, Response, Url};
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::debug;

/// Remote pricing service the editor talks to.
///
/// The HTTP implementation is [`HttpPricingClient`]; tests and embedders can
/// substitute their own.
#[async_trait]
pub trait PricingApi: Send + Sync {
    /// Service codes, in the order the pricing API lists them
    async fn list_services(&self) -> Result<Vec<String>, EstimatorError>;

    /// Every attribute name applicable to a service
    async fn list_attributes(&self, service: &str) -> Result<Vec<String>, EstimatorError>;

    /// Allowed values for one attribute of a service
    async fn list_attribute_values(
        &self,
        service: &str,
        attribute: &str,
    ) -> Result<Vec<String>, EstimatorError>;

    /// Monthly estimate for a fully specified resource
    async fn estimate(&self, request: &EstimateRequest) -> Result<EstimateResponse, EstimatorError>;
}

/// Pricing API over HTTP
pub struct HttpPricingClient {
    client: Client,
    base_url: Url,
    timeout: Option<Duration>,
}

impl HttpPricingClient {
    pub fn new(config: &ApiConfig) -> Result<Self, EstimatorError> {
        let base_url = Url::parse(&config.base_url).map_err(|e| {
            EstimatorError::Config(format!("Invalid base URL '{}': {}", config.base_url, e))
        })?;

        if base_url.cannot_be_a_base() {
            return Err(EstimatorError::Config(format!(
                "Base URL '{}' cannot carry a path",
                config.base_url
            )));
        }

        Ok(Self {
            client: Client::new(),
            base_url,
            timeout: config.timeout_seconds.map(Duration::from_secs),
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Build `{base}/api/{segments...}`, percent-encoding each segment
    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().push("api").extend(segments);
        }
        url
    }

    async fn get_json<T: DeserializeOwned>(&self, url: Url) -> Result<T, EstimatorError> {
        debug!(url = %url, "GET");

        let mut req = self.client.get(url);
        if let Some(timeout) = self.timeout {
            req = req.timeout(timeout);
        }

        let response = check_status(req.send().await?).await?;
        decode(response).await
    }
}

#[async_trait]
impl PricingApi for HttpPricingClient {
    async fn list_services(&self) -> Result<Vec<String>, EstimatorError> {
        self.get_json(self.endpoint(&["services"])).await
    }

    async fn list_attributes(&self, service: &str) -> Result<Vec<String>, EstimatorError> {
        self.get_json(self.endpoint(&["attributes", service])).await
    }

    async fn list_attribute_values(
        &self,
        service: &str,
        attribute: &str,
    ) -> Result<Vec<String>, EstimatorError> {
        self.get_json(self.endpoint(&["attribute-values", service, attribute]))
            .await
    }

    async fn estimate(&self, request: &EstimateRequest) -> Result<EstimateResponse, EstimatorError> {
        let url = self.endpoint(&["estimate"]);
        debug!(url = %url, service = %request.service, quantity = request.quantity, "POST");

        let mut req = self.client.post(url).json(request);
        if let Some(timeout) = self.timeout {
            req = req.timeout(timeout);
        }

        let response = check_status(req.send().await?).await?;
        decode(response).await
    }
}

async fn check_status(response: Response) -> Result<Response, EstimatorError> {
    if response.status().is_success() {
        return Ok(response);
    }

    let status = response.status();
    let message = response
        .text()
        .await
        .unwrap_or_else(|_| "Unknown error".to_string());
    Err(EstimatorError::Upstream { status, message })
}

async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, EstimatorError> {
    let body = response.bytes().await?;
    Ok(serde_json::from_slice(&body)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client(base_url: &str) -> HttpPricingClient {
        HttpPricingClient::new(&ApiConfig {
            base_url: base_url.to_string(),
            timeout_seconds: None,
        })
        .unwrap()
    }

    #[test]
    fn test_endpoint_paths() {
        let c = client("http://localhost:5000");
        assert_eq!(c.endpoint(&["services"]).as_str(), "http://localhost:5000/api/services");
        assert_eq!(
            c.endpoint(&["attribute-values", "AmazonEC2", "instanceType"]).as_str(),
            "http://localhost:5000/api/attribute-values/AmazonEC2/instanceType"
        );
    }

    #[test]
    fn test_endpoint_keeps_base_path() {
        let c = client("http://proxy.local/pricing/");
        assert_eq!(
            c.endpoint(&["estimate"]).as_str(),
            "http://proxy.local/pricing/api/estimate"
        );
    }

    #[test]
    fn test_endpoint_encodes_segments() {
        let c = client("http://localhost:5000");
        assert_eq!(
            c.endpoint(&["attributes", "Amazon EC2/x"]).as_str(),
            "http://localhost:5000/api/attributes/Amazon%20EC2%2Fx"
        );
    }

    #[test]
    fn test_invalid_base_url() {
        let result = HttpPricingClient::new(&ApiConfig {
            base_url: "mailto:ops@example.com".to_string(),
            timeout_seconds: None,
        });
        assert!(matches!(result, Err(EstimatorError::Config(_))));
    }
}
