//! HTTP transport for the webhook sink

use std::time::Duration;

use async_trait::async_trait;
use contracts::ContractError;
use reqwest::header::CONTENT_TYPE;

use super::WEBHOOK_SINK_NAME;

/// Content type of every webhook request
pub const CONTENT_TYPE_JSON: &str = "application/json";
/// Per-request timeout of the HTTP client
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Sends one JSON document to an endpoint
#[async_trait]
pub trait WebhookTransport: Send + Sync {
    /// POST `body` to `endpoint`, returning the HTTP status code
    async fn post_json(&self, endpoint: &str, body: Vec<u8>) -> Result<u16, ContractError>;
}

/// reqwest-backed transport
///
/// Receivers are expected inside the cluster network, so proxy environment
/// variables are not consulted.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
}

impl HttpTransport {
    pub fn new() -> Result<Self, ContractError> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .no_proxy()
            .build()
            .map_err(|e| ContractError::sink_config(WEBHOOK_SINK_NAME, e.to_string()))?;
        Ok(Self { client })
    }
}

#[async_trait]
impl WebhookTransport for HttpTransport {
    async fn post_json(&self, endpoint: &str, body: Vec<u8>) -> Result<u16, ContractError> {
        let response = self
            .client
            .post(endpoint)
            .header(CONTENT_TYPE, CONTENT_TYPE_JSON)
            .body(body)
            .send()
            .await
            .map_err(|e| ContractError::delivery(WEBHOOK_SINK_NAME, e.to_string()))?;
        Ok(response.status().as_u16())
    }
}
