use std::time::Duration;

use async_trait::async_trait;
use metrics::counter;
use reqwest::{Client, Method};
use serde_json::Value;

use crate::errors::{AppError, AppResult};

/// Authenticated access to the chat backend's REST API.
///
/// Paths are relative to the API root (`/safety/reports`, `/servers/{id}`).
/// Successful responses are returned as raw JSON; an empty body is `null`.
#[async_trait]
pub trait ModerationApi: Send + Sync {
    async fn get(&self, path: &str) -> AppResult<Value>;
    async fn post(&self, path: &str, body: &Value) -> AppResult<Value>;
    async fn put(&self, path: &str, body: &Value) -> AppResult<Value>;
    async fn delete(&self, path: &str) -> AppResult<Value>;
}

#[derive(Clone)]
pub struct HttpApiClient {
    client: Client,
    base_url: String,
    token: String,
}

impl HttpApiClient {
    pub fn new(base_url: &str, token: &str, timeout: Duration) -> AppResult<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AppError::internal(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            token: token.to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    async fn send(&self, method: Method, path: &str, body: Option<&Value>) -> AppResult<Value> {
        let url = self.url(path);
        let mut request = self.client.request(method.clone(), &url);
        if !self.token.trim().is_empty() {
            request = request.bearer_auth(&self.token);
        }
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request.send().await.map_err(|e| {
            counter!("modpanel_http_requests_total", "method" => method.to_string(), "status" => "error").increment(1);
            AppError::transport(format!("{method} {path} failed: {e}"))
        })?;

        let status = response.status();
        counter!(
            "modpanel_http_requests_total",
            "method" => method.to_string(),
            "status" => status.as_u16().to_string()
        )
        .increment(1);

        let text = response
            .text()
            .await
            .map_err(|e| AppError::transport(format!("failed to read response body: {e}")))?;

        if !status.is_success() {
            tracing::debug!(method = %method, path = %path, status = status.as_u16(), "request rejected");
            return Err(AppError::from_response(status.as_u16(), &text));
        }

        tracing::debug!(method = %method, path = %path, status = status.as_u16(), "request completed");

        if text.trim().is_empty() {
            return Ok(Value::Null);
        }

        serde_json::from_str(&text).map_err(|e| AppError::decode(format!("invalid JSON from {path}: {e}")))
    }
}

#[async_trait]
impl ModerationApi for HttpApiClient {
    async fn get(&self, path: &str) -> AppResult<Value> {
        self.send(Method::GET, path, None).await
    }

    async fn post(&self, path: &str, body: &Value) -> AppResult<Value> {
        self.send(Method::POST, path, Some(body)).await
    }

    async fn put(&self, path: &str, body: &Value) -> AppResult<Value> {
        self.send(Method::PUT, path, Some(body)).await
    }

    async fn delete(&self, path: &str) -> AppResult<Value> {
        self.send(Method::DELETE, path, None).await
    }
}
