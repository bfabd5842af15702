//! Backend API client
//!
//! Thin wrapper over `reqwest` shared by the session and balance adapters.
//! Every call is timed and counted, and non-2xx responses are mapped to
//! `ApiError::Status` using the body's `message` field when present.

use std::time::Instant;

use reqwest::{RequestBuilder, Response};
use serde::de::DeserializeOwned;
use tracing::{debug, instrument, warn};

use crate::config::ApiSettings;
use crate::infrastructure::metrics;
use crate::shared::error::ApiError;

/// HTTP client bound to one backend base URL.
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
}

impl ApiClient {
    /// Build a client from API settings.
    pub fn new(settings: &ApiSettings) -> Result<Self, ApiError> {
        let http = reqwest::Client::builder()
            .timeout(settings.request_timeout())
            .build()?;

        Ok(Self {
            http,
            base_url: settings.base_url().to_string(),
        })
    }

    /// Wrap an existing reqwest client.
    pub fn with_client(http: reqwest::Client, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into();
        Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    pub fn get(&self, path: &str) -> RequestBuilder {
        self.http.get(self.url(path))
    }

    pub fn post(&self, path: &str) -> RequestBuilder {
        self.http.post(self.url(path))
    }

    /// Send a request and fail on non-2xx status.
    #[instrument(skip(self, request))]
    pub async fn send(
        &self,
        operation: &'static str,
        request: RequestBuilder,
    ) -> Result<Response, ApiError> {
        let started = Instant::now();
        let result = request.send().await;
        let elapsed = started.elapsed().as_secs_f64();

        let response = match result {
            Ok(response) => response,
            Err(e) => {
                metrics::record_api_call(operation, "transport_error", elapsed);
                warn!(operation, error = %e, "Backend request failed");
                return Err(ApiError::Transport(e));
            }
        };

        let status = response.status();
        if status.is_success() {
            metrics::record_api_call(operation, "ok", elapsed);
            debug!(operation, status = status.as_u16(), "Backend request succeeded");
            return Ok(response);
        }

        metrics::record_api_call(operation, "http_error", elapsed);
        let body = response.text().await.unwrap_or_default();
        let error = ApiError::from_status(status.as_u16(), &body);
        debug!(operation, status = status.as_u16(), error = %error, "Backend returned error status");
        Err(error)
    }

    /// Send a request and decode its JSON body.
    pub async fn send_json<T: DeserializeOwned>(
        &self,
        operation: &'static str,
        request: RequestBuilder,
    ) -> Result<T, ApiError> {
        let response = self.send(operation, request).await?;
        let body = response.text().await?;

        serde_json::from_str(&body).map_err(|e| {
            warn!(operation, error = %e, "Undecodable backend response");
            ApiError::Decode(e.to_string())
        })
    }
}
