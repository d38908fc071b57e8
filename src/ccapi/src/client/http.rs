//! CCAPI over HTTP with JSON bodies.
use async_trait::async_trait;
use reqwest::{Client, Response};
use serde_json::Value;

use super::{CcapiClient, CcapiError, Payload};
use crate::capability::{CapabilityMap, Endpoint};

/// JSON-over-HTTP client for cameras serving CCAPI.
///
/// No timeout is configured on the underlying client: callers bound every
/// request with their own deadline and dropping the request future aborts it.
#[derive(Debug, Clone)]
pub struct HttpCcapiClient {
    http: Client,
    port: u16,
}

impl HttpCcapiClient {
    pub fn new(port: u16) -> Self {
        Self::with_client(Client::new(), port)
    }

    pub fn with_client(http: Client, port: u16) -> Self {
        Self { http, port }
    }

    /// URL of the root capability document.
    pub fn root_url(&self, address: &str) -> String {
        format!("http://{}:{}/ccapi", address, self.port)
    }

    async fn get_json(&self, url: &str) -> Result<Value, CcapiError> {
        let response = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|e| CcapiError::Unreachable(e.to_string()))?;
        let response = check_status(response).await?;
        response
            .json::<Value>()
            .await
            .map_err(|e| CcapiError::Malformed(format!("decode: {}", e)))
    }
}

async fn check_status(response: Response) -> Result<Response, CcapiError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    // CCAPI reports failures as {"message": "..."}.
    let message = response
        .json::<Value>()
        .await
        .ok()
        .and_then(|body| body.get("message").and_then(Value::as_str).map(str::to_string))
        .unwrap_or_else(|| status.canonical_reason().unwrap_or("unknown").to_string());
    Err(CcapiError::Rejected {
        status: status.as_u16(),
        message,
    })
}

pub(crate) fn into_payload(body: Value) -> Result<Payload, CcapiError> {
    match body {
        Value::Object(map) => Ok(map),
        other => Err(CcapiError::Malformed(format!(
            "expected a JSON object, got {}",
            kind_of(&other)
        ))),
    }
}

pub(crate) fn into_capabilities(body: Value) -> Result<CapabilityMap, CcapiError> {
    serde_json::from_value(body).map_err(|e| CcapiError::Malformed(format!("capabilities: {}", e)))
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[async_trait]
impl CcapiClient for HttpCcapiClient {
    async fn discover(&self, address: &str) -> Result<CapabilityMap, CcapiError> {
        let body = self.get_json(&self.root_url(address)).await?;
        into_capabilities(body)
    }

    async fn get(&self, endpoint: &Endpoint) -> Result<Payload, CcapiError> {
        let body = self.get_json(&endpoint.path).await?;
        into_payload(body)
    }
}
