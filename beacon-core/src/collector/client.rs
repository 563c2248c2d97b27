//! HTTP client for the analytics collector API
//!
//! Implements the collector protocol: one JSON event per
//! `POST /api/analytics/track`, plus the two authenticated read
//! endpoints (dashboard data and privacy export) consumed outside the
//! pipeline.

use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE};

use crate::config::CollectorConfig;
use crate::error::{Error, Result};

use super::dispatcher::EventSink;
use super::events::Event;

/// HTTP client for the collector API
///
/// The bearer credential lives behind a mutex so the host's auth layer
/// can install or revoke it at runtime without rebuilding the client.
pub struct CollectorClient {
    http_client: reqwest::Client,
    base_url: String,
    token: Mutex<Option<String>>,
}

impl CollectorClient {
    /// Create a new collector client from configuration
    ///
    /// Returns an error if the configuration is invalid or missing required fields.
    pub fn new(config: CollectorConfig) -> Result<Self> {
        config.validate()?;

        let base_url = config
            .server_url
            .clone()
            .ok_or_else(|| Error::Config("collector.server_url is required".to_string()))?
            .trim_end_matches('/')
            .to_string();

        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .default_headers(headers)
            .build()
            .map_err(|e| Error::Config(format!("failed to create HTTP client: {}", e)))?;

        Ok(Self {
            http_client,
            base_url,
            token: Mutex::new(config.api_token),
        })
    }

    /// Install the bearer credential used for subsequent requests.
    pub fn set_token(&self, token: impl Into<String>) {
        *self.token.lock().unwrap() = Some(token.into());
    }

    /// Remove the bearer credential (e.g. on logout).
    pub fn clear_token(&self) {
        *self.token.lock().unwrap() = None;
    }

    fn current_token(&self) -> Option<String> {
        self.token.lock().unwrap().clone()
    }

    /// Attach the bearer header when a credential is available.
    fn authorize(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match self.current_token() {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    /// Fetch aggregated dashboard data (bearer-authenticated).
    pub async fn dashboard_data(&self) -> Result<serde_json::Value> {
        let url = format!("{}/api/analytics/dashboard", self.base_url);
        self.authenticated_json(self.http_client.get(&url)).await
    }

    /// Request a privacy export of the user's data (bearer-authenticated).
    pub async fn export_user_data(&self) -> Result<serde_json::Value> {
        let url = format!("{}/api/privacy/export-data", self.base_url);
        self.authenticated_json(self.http_client.post(&url)).await
    }

    async fn authenticated_json(
        &self,
        request: reqwest::RequestBuilder,
    ) -> Result<serde_json::Value> {
        if self.current_token().is_none() {
            return Err(Error::Collector(
                "bearer token required but not available".to_string(),
            ));
        }

        let response = self
            .authorize(request)
            .send()
            .await
            .map_err(|e| Error::Collector(format!("HTTP request failed: {}", e)))?;

        let status = response.status();
        if status.is_success() {
            response
                .json()
                .await
                .map_err(|e| Error::Collector(format!("failed to parse response: {}", e)))
        } else {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "unknown".to_string());
            Err(Error::Collector(format!(
                "API error ({}): {}",
                status, error_text
            )))
        }
    }
}

#[async_trait]
impl EventSink for CollectorClient {
    /// Send one event to `POST /api/analytics/track`.
    ///
    /// A non-2xx status is reported as a `Collector` error. The response
    /// body is never parsed; delivery is fire-and-forget and the caller
    /// is expected to log and swallow whatever comes back.
    async fn send_one(&self, event: Event) -> Result<()> {
        let url = format!("{}/api/analytics/track", self.base_url);

        let response = self
            .authorize(self.http_client.post(&url).json(&event))
            .send()
            .await
            .map_err(|e| Error::Collector(format!("HTTP request failed: {}", e)))?;

        let status = response.status();
        if status.is_success() {
            Ok(())
        } else {
            Err(Error::Collector(format!("API error ({})", status)))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_requires_server_url() {
        let config = CollectorConfig::default();
        assert!(CollectorClient::new(config).is_err());
    }

    #[test]
    fn test_client_with_valid_config() {
        let config = CollectorConfig {
            server_url: Some("https://collector.example.com/".to_string()),
            ..Default::default()
        };
        let client = CollectorClient::new(config).unwrap();
        assert_eq!(client.base_url, "https://collector.example.com");
    }

    #[test]
    fn test_token_lifecycle() {
        let config = CollectorConfig {
            server_url: Some("https://collector.example.com".to_string()),
            api_token: Some("seed-token".to_string()),
            ..Default::default()
        };
        let client = CollectorClient::new(config).unwrap();
        assert_eq!(client.current_token().as_deref(), Some("seed-token"));

        client.set_token("fresh-token");
        assert_eq!(client.current_token().as_deref(), Some("fresh-token"));

        client.clear_token();
        assert!(client.current_token().is_none());
    }
}
