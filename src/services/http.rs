use axum::body::Bytes;
use reqwest::{Client, RequestBuilder, Response, multipart::Form};
use serde::{Serialize, de::DeserializeOwned};
use serde_json::Value;
use std::time::Duration;
use tracing::debug;

use crate::config::UpstreamConfig;
use crate::error::{GatewayError, Result};

/// Upper bound on how much of an upstream error body is echoed back
const MAX_ERROR_MESSAGE_CHARS: usize = 300;

/// Build the shared reqwest client used by every service
pub fn build_client(config: &UpstreamConfig) -> Result<Client> {
    Client::builder()
        .user_agent(config.user_agent.as_str())
        .timeout(config.timeout())
        .build()
        .map_err(|e| GatewayError::Internal(format!("Failed to build HTTP client: {e}")))
}

/// Raw response body plus its declared content type
#[derive(Debug, Clone)]
pub struct Fetched {
    pub bytes: Bytes,
    pub content_type: Option<String>,
}

/// HTTP client bound to one upstream service
#[derive(Clone)]
pub struct HttpClient {
    client: Client,
    base_url: String,
    service: &'static str,
    max_body_bytes: Option<usize>,
}

impl HttpClient {
    pub fn new(service: &'static str, client: Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            service,
            max_body_bytes: None,
        }
    }

    /// Reject raw bodies larger than `limit` bytes
    #[must_use]
    pub const fn with_max_body_bytes(mut self, limit: usize) -> Self {
        self.max_body_bytes = Some(limit);
        self
    }

    #[must_use]
    pub const fn service(&self) -> &'static str {
        self.service
    }

    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Build full URL from endpoint; absolute URLs pass through
    #[must_use]
    pub fn url(&self, endpoint: &str) -> String {
        if endpoint.starts_with("http://") || endpoint.starts_with("https://") {
            endpoint.to_string()
        } else {
            format!("{}{}", self.base_url, endpoint)
        }
    }

    /// GET with query parameters and parse JSON response
    pub async fn get<T: DeserializeOwned>(&self, endpoint: &str, params: &[(&str, &str)]) -> Result<T> {
        self.get_with_headers(endpoint, params, &[]).await
    }

    /// GET with query parameters and extra headers
    pub async fn get_with_headers<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        params: &[(&str, &str)],
        headers: &[(&str, &str)],
    ) -> Result<T> {
        let mut request = self.client.get(self.url(endpoint)).query(params);
        for (name, value) in headers {
            request = request.header(*name, *value);
        }

        let response = self.send(request).await?;
        self.parse_json(response).await
    }

    /// GET with query parameters and return the body as text
    pub async fn get_text(&self, endpoint: &str, params: &[(&str, &str)]) -> Result<String> {
        let response = self.send(self.client.get(self.url(endpoint)).query(params)).await?;
        response.text().await.map_err(|e| self.transport(&e))
    }

    /// GET and return the raw body
    pub async fn get_bytes(&self, endpoint: &str) -> Result<Fetched> {
        let response = self.send(self.client.get(self.url(endpoint))).await?;
        self.read_bytes(response).await
    }

    /// POST JSON body with extra headers and parse JSON response
    pub async fn post_json<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        endpoint: &str,
        body: &B,
        headers: &[(&str, &str)],
    ) -> Result<T> {
        let mut request = self
            .client
            .post(self.url(endpoint))
            .header("Accept", "application/json")
            .json(body);
        for (name, value) in headers {
            request = request.header(*name, *value);
        }

        let response = self.send(request).await?;
        self.parse_json(response).await
    }

    /// POST a multipart form and return the raw body
    pub async fn post_form(
        &self,
        endpoint: &str,
        form: Form,
        headers: &[(&str, &str)],
        timeout: Duration,
    ) -> Result<Fetched> {
        let mut request = self.client.post(self.url(endpoint)).multipart(form).timeout(timeout);
        for (name, value) in headers {
            request = request.header(*name, *value);
        }

        let response = self.send(request).await?;
        self.read_bytes(response).await
    }

    /// Send a request and turn non-2xx statuses into upstream errors
    async fn send(&self, request: RequestBuilder) -> Result<Response> {
        let response = request.send().await.map_err(|e| self.transport(&e))?;
        let status = response.status();
        debug!(service = self.service, status = status.as_u16(), url = %response.url(), "Upstream responded");

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(GatewayError::Upstream {
                service: self.service,
                status: Some(status.as_u16()),
                message: upstream_message(&body)
                    .unwrap_or_else(|| status.canonical_reason().unwrap_or("error").to_string()),
            });
        }

        Ok(response)
    }

    async fn parse_json<T: DeserializeOwned>(&self, response: Response) -> Result<T> {
        response.json::<T>().await.map_err(|e| {
            GatewayError::upstream(self.service, format!("Invalid JSON response: {e}"))
        })
    }

    async fn read_bytes(&self, mut response: Response) -> Result<Fetched> {
        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(ToString::to_string);

        let Some(limit) = self.max_body_bytes else {
            let bytes = response.bytes().await.map_err(|e| self.transport(&e))?;
            return Ok(Fetched { bytes, content_type });
        };

        if response.content_length().is_some_and(|len| len > limit as u64) {
            return Err(self.too_large(limit));
        }

        let mut body = Vec::new();
        while let Some(chunk) = response.chunk().await.map_err(|e| self.transport(&e))? {
            if body.len() + chunk.len() > limit {
                return Err(self.too_large(limit));
            }
            body.extend_from_slice(&chunk);
        }

        Ok(Fetched {
            bytes: Bytes::from(body),
            content_type,
        })
    }

    fn too_large(&self, limit: usize) -> GatewayError {
        debug!(service = self.service, limit, "Upstream body over size limit");
        GatewayError::upstream(self.service, format!("Response exceeds {limit} bytes"))
    }

    fn transport(&self, err: &reqwest::Error) -> GatewayError {
        GatewayError::Upstream {
            service: self.service,
            status: err.status().map(|s| s.as_u16()),
            message: if err.is_timeout() {
                "Upstream request timed out".to_string()
            } else {
                err.to_string()
            },
        }
    }
}

/// Best human-readable message from an upstream error body
pub fn upstream_message(body: &str) -> Option<String> {
    let body = body.trim();
    if body.is_empty() {
        return None;
    }

    if let Ok(json) = serde_json::from_str::<Value>(body) {
        let candidates = [
            json.get("message"),
            json.get("error").filter(|v| v.is_string()),
            json.get("error").and_then(|e| e.get("message")),
            json.get("detail"),
        ];
        if let Some(message) = candidates
            .into_iter()
            .flatten()
            .find_map(Value::as_str)
            .filter(|m| !m.is_empty())
        {
            return Some(truncate(message));
        }
    }

    Some(truncate(body))
}

fn truncate(text: &str) -> String {
    if text.chars().count() <= MAX_ERROR_MESSAGE_CHARS {
        text.to_string()
    } else {
        let mut cut: String = text.chars().take(MAX_ERROR_MESSAGE_CHARS).collect();
        cut.push_str("...");
        cut
    }
}
