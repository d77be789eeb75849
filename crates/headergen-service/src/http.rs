//! HTTP client for the analysis server
//!
//! Posts the notebook as a multipart upload: one part named `file`, carrying
//! the serialized notebook with content type `application/json` and the
//! notebook path as its file name.

use crate::error::ServiceError;
use crate::service::AnalysisService;
use async_trait::async_trait;
use headergen_analysis::{AnalysisPayload, ParsedPayload};
use reqwest::multipart::{Form, Part};
use reqwest::Client;
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, warn};

/// Default analysis server
pub const DEFAULT_SERVER_URL: &str = "http://3di-1.cs.upb.de:80";
/// Default analysis endpoint
pub const DEFAULT_ENDPOINT_PATH: &str = "/get_analysis_notebook/";
/// Multipart field carrying the notebook
pub const UPLOAD_FIELD: &str = "file";

/// Where and how to reach the analysis server
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpServiceConfig {
    /// Server base URL
    pub server_url: String,
    /// Endpoint path, starting with `/`
    pub endpoint_path: String,
    /// Per-request timeout, `None` waits indefinitely
    pub timeout: Option<Duration>,
}

impl Default for HttpServiceConfig {
    fn default() -> Self {
        Self {
            server_url: DEFAULT_SERVER_URL.to_string(),
            endpoint_path: DEFAULT_ENDPOINT_PATH.to_string(),
            timeout: None,
        }
    }
}

impl HttpServiceConfig {
    /// Config for a server, default endpoint and no timeout
    #[must_use]
    pub fn new(server_url: impl Into<String>) -> Self {
        Self {
            server_url: server_url.into(),
            ..Self::default()
        }
    }

    /// Set the endpoint path
    #[inline]
    #[must_use]
    pub fn with_endpoint_path(mut self, path: impl Into<String>) -> Self {
        self.endpoint_path = path.into();
        self
    }

    /// Set the request timeout
    #[inline]
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Full endpoint URL
    #[must_use]
    pub fn endpoint_url(&self) -> String {
        format!(
            "{}/{}",
            self.server_url.trim_end_matches('/'),
            self.endpoint_path.trim_start_matches('/')
        )
    }
}

/// [`AnalysisService`] over HTTP
#[derive(Debug, Clone)]
pub struct HttpAnalysisService {
    client: Client,
    endpoint: String,
}

impl HttpAnalysisService {
    /// Build a client for `config`
    ///
    /// # Errors
    /// Returns `ServiceError::Config` if the URL is empty, the endpoint path
    /// does not start with `/`, or the HTTP client cannot be built.
    pub fn new(config: &HttpServiceConfig) -> Result<Self, ServiceError> {
        if config.server_url.trim().is_empty() {
            return Err(ServiceError::Config("server URL is empty".to_string()));
        }
        if !config.endpoint_path.starts_with('/') {
            return Err(ServiceError::Config(format!(
                "endpoint path must start with '/': {}",
                config.endpoint_path
            )));
        }

        let mut builder = Client::builder();
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder
            .build()
            .map_err(|e| ServiceError::Config(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            endpoint: config.endpoint_url(),
        })
    }

    /// Endpoint requests are posted to
    #[inline]
    #[must_use]
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn transport_error(&self, error: &reqwest::Error) -> ServiceError {
        ServiceError::Transport {
            url: self.endpoint.clone(),
            message: error.to_string(),
            timed_out: error.is_timeout(),
        }
    }
}

#[async_trait]
impl AnalysisService for HttpAnalysisService {
    async fn submit(&self, snapshot: &Value, file_name: &str) -> Result<ParsedPayload, ServiceError> {
        let document = serde_json::to_vec(snapshot)?;
        let part = Part::bytes(document)
            .file_name(file_name.to_string())
            .mime_str("application/json")
            .map_err(|e| ServiceError::Config(format!("invalid upload content type: {e}")))?;
        // keep the notebook path verbatim in the part header
        let form = Form::new().percent_encode_noop().part(UPLOAD_FIELD, part);

        debug!(endpoint = %self.endpoint, file_name, "submitting notebook for analysis");
        let response = self
            .client
            .post(&self.endpoint)
            .multipart(form)
            .send()
            .await
            .map_err(|e| self.transport_error(&e))?;

        let status = response.status();
        let body = response.text().await.map_err(|e| self.transport_error(&e))?;

        if !status.is_success() {
            warn!(status = status.as_u16(), "analysis service rejected the notebook");
            return Err(ServiceError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let parsed = AnalysisPayload::from_json_str(&body)
            .map_err(|e| ServiceError::MalformedBody(e.to_string()))?;
        debug!(
            cells = parsed.payload.len(),
            issues = parsed.issues.len(),
            "analysis response decoded"
        );
        Ok(parsed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoint_url_joins_cleanly() {
        assert_eq!(
            HttpServiceConfig::default().endpoint_url(),
            "http://3di-1.cs.upb.de:80/get_analysis_notebook/"
        );
        assert_eq!(
            HttpServiceConfig::new("http://localhost:8000/").endpoint_url(),
            "http://localhost:8000/get_analysis_notebook/"
        );
    }

    #[test]
    fn rejects_bad_config() {
        assert!(matches!(
            HttpAnalysisService::new(&HttpServiceConfig::new("  ")),
            Err(ServiceError::Config(_))
        ));
        assert!(matches!(
            HttpAnalysisService::new(&HttpServiceConfig::new("http://x").with_endpoint_path("analyze")),
            Err(ServiceError::Config(_))
        ));
    }

    #[test]
    fn builds_with_timeout() {
        let config = HttpServiceConfig::new("http://127.0.0.1:9").with_timeout(Duration::from_secs(2));
        let service = HttpAnalysisService::new(&config).unwrap();
        assert_eq!(service.endpoint(), "http://127.0.0.1:9/get_analysis_notebook/");
    }
}
