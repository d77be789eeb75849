//! Headergen configuration
//!
//! Defaults reproduce the stock extension. A TOML file may override any
//! field, and a handful of `HEADERGEN_*` environment variables override the
//! file.
//!
//! ```toml
//! server_url = "http://localhost:8000"
//! request_timeout_secs = 120
//! log_filter = "headergen=debug"
//! ```

use crate::error::{HeadergenError, Result};
use headergen_render::DEFAULT_PHASE_SEPARATOR;
use headergen_service::{HttpServiceConfig, DEFAULT_ENDPOINT_PATH, DEFAULT_SERVER_URL};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Environment variable overriding `server_url`
pub const ENV_SERVER_URL: &str = "HEADERGEN_SERVER_URL";
/// Environment variable overriding `endpoint_path`
pub const ENV_ENDPOINT_PATH: &str = "HEADERGEN_ENDPOINT_PATH";
/// Environment variable overriding `request_timeout_secs`
pub const ENV_REQUEST_TIMEOUT_SECS: &str = "HEADERGEN_REQUEST_TIMEOUT_SECS";
/// Environment variable overriding `log_filter`
pub const ENV_LOG: &str = "HEADERGEN_LOG";

/// Headergen configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct HeadergenConfig {
    /// Analysis server base URL
    pub server_url: String,
    /// Analysis endpoint path
    pub endpoint_path: String,
    /// Request timeout in seconds, `None` waits indefinitely
    pub request_timeout_secs: Option<u64>,
    /// Separator between phases in a cell header
    pub phase_separator: String,
    /// Open the sidebar after a successful run
    pub open_sidebar_after_run: bool,
    /// Show a failure notice when a run fails
    pub surface_failures: bool,
    /// Fallback tracing filter when `RUST_LOG` is unset
    pub log_filter: String,
    /// Emit JSON log lines
    pub log_json: bool,
}

impl Default for HeadergenConfig {
    fn default() -> Self {
        Self {
            server_url: DEFAULT_SERVER_URL.to_string(),
            endpoint_path: DEFAULT_ENDPOINT_PATH.to_string(),
            request_timeout_secs: None,
            phase_separator: DEFAULT_PHASE_SEPARATOR.to_string(),
            open_sidebar_after_run: true,
            surface_failures: true,
            log_filter: "info".to_string(),
            log_json: false,
        }
    }
}

impl HeadergenConfig {
    /// Create default configuration
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// With analysis server URL
    #[inline]
    #[must_use]
    pub fn with_server_url(mut self, url: impl Into<String>) -> Self {
        self.server_url = url.into();
        self
    }

    /// With analysis endpoint path
    #[inline]
    #[must_use]
    pub fn with_endpoint_path(mut self, path: impl Into<String>) -> Self {
        self.endpoint_path = path.into();
        self
    }

    /// With request timeout
    #[inline]
    #[must_use]
    pub fn with_request_timeout_secs(mut self, secs: u64) -> Self {
        self.request_timeout_secs = Some(secs);
        self
    }

    /// With phase separator
    #[inline]
    #[must_use]
    pub fn with_phase_separator(mut self, separator: impl Into<String>) -> Self {
        self.phase_separator = separator.into();
        self
    }

    /// With sidebar opening after success
    #[inline]
    #[must_use]
    pub fn with_open_sidebar_after_run(mut self, open: bool) -> Self {
        self.open_sidebar_after_run = open;
        self
    }

    /// With failure notices
    #[inline]
    #[must_use]
    pub fn with_surface_failures(mut self, surface: bool) -> Self {
        self.surface_failures = surface;
        self
    }

    /// Parse and validate TOML
    ///
    /// # Errors
    /// Returns `HeadergenError::ConfigParse` for malformed TOML or unknown
    /// keys, `HeadergenError::Config` if validation fails.
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Read a TOML file
    ///
    /// # Errors
    /// Returns `HeadergenError::ConfigIo` if the file cannot be read, plus
    /// everything [`from_toml_str`](Self::from_toml_str) returns.
    pub async fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = tokio::fs::read_to_string(path)
            .await
            .map_err(|source| HeadergenError::ConfigIo {
                path: path.to_path_buf(),
                source,
            })?;
        Self::from_toml_str(&text)
    }

    /// Apply `HEADERGEN_*` overrides from the process environment
    ///
    /// # Errors
    /// Returns `HeadergenError::Config` if an override is malformed.
    pub fn apply_env_overrides(self) -> Result<Self> {
        self.apply_overrides_from(|name| std::env::var(name).ok())
    }

    /// Apply `HEADERGEN_*` overrides from an arbitrary lookup
    ///
    /// Blank values are ignored.
    ///
    /// # Errors
    /// Returns `HeadergenError::Config` if an override is malformed.
    pub fn apply_overrides_from(mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let get = |name: &str| {
            lookup(name)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        if let Some(url) = get(ENV_SERVER_URL) {
            self.server_url = url;
        }
        if let Some(path) = get(ENV_ENDPOINT_PATH) {
            self.endpoint_path = path;
        }
        if let Some(raw) = get(ENV_REQUEST_TIMEOUT_SECS) {
            let secs = raw.parse::<u64>().map_err(|_| {
                HeadergenError::Config(format!(
                    "{ENV_REQUEST_TIMEOUT_SECS} must be a whole number of seconds, got '{raw}'"
                ))
            })?;
            self.request_timeout_secs = Some(secs);
        }
        if let Some(filter) = get(ENV_LOG) {
            self.log_filter = filter;
        }

        self.validate()?;
        Ok(self)
    }

    /// Check field constraints
    ///
    /// # Errors
    /// Returns `HeadergenError::Config` for an empty server URL, an endpoint
    /// path not starting with `/`, or a zero timeout.
    pub fn validate(&self) -> Result<()> {
        if self.server_url.trim().is_empty() {
            return Err(HeadergenError::Config("server_url must not be empty".to_string()));
        }
        if !self.endpoint_path.starts_with('/') {
            return Err(HeadergenError::Config(format!(
                "endpoint_path must start with '/', got '{}'",
                self.endpoint_path
            )));
        }
        if self.request_timeout_secs == Some(0) {
            return Err(HeadergenError::Config(
                "request_timeout_secs must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }

    /// Request timeout as a duration
    #[must_use]
    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout_secs.map(Duration::from_secs)
    }

    /// Settings for the HTTP analysis client
    #[must_use]
    pub fn service_config(&self) -> HttpServiceConfig {
        HttpServiceConfig {
            server_url: self.server_url.clone(),
            endpoint_path: self.endpoint_path.clone(),
            timeout: self.request_timeout(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::collections::HashMap;

    #[test]
    fn defaults_match_stock_extension() {
        let config = HeadergenConfig::default();
        assert_eq!(config.server_url, "http://3di-1.cs.upb.de:80");
        assert_eq!(config.endpoint_path, "/get_analysis_notebook/");
        assert_eq!(config.request_timeout(), None);
        assert_eq!(config.phase_separator, " | ");
        assert!(config.open_sidebar_after_run);
        assert!(config.validate().is_ok());
        assert_eq!(
            config.service_config().endpoint_url(),
            "http://3di-1.cs.upb.de:80/get_analysis_notebook/"
        );
    }

    #[test]
    fn partial_toml_keeps_defaults() {
        let config = HeadergenConfig::from_toml_str(
            r#"
            server_url = "http://localhost:8000"
            request_timeout_secs = 90
            log_json = true
            "#,
        )
        .unwrap();

        assert_eq!(config.server_url, "http://localhost:8000");
        assert_eq!(config.request_timeout(), Some(Duration::from_secs(90)));
        assert!(config.log_json);
        assert_eq!(config.endpoint_path, "/get_analysis_notebook/");
    }

    #[test]
    fn toml_errors() {
        assert!(matches!(
            HeadergenConfig::from_toml_str("server_urll = \"x\""),
            Err(HeadergenError::ConfigParse(_))
        ));
        assert!(matches!(
            HeadergenConfig::from_toml_str("endpoint_path = \"analyze\""),
            Err(HeadergenError::Config(_))
        ));
        assert!(matches!(
            HeadergenConfig::from_toml_str("server_url = \"  \""),
            Err(HeadergenError::Config(_))
        ));
    }

    #[test]
    fn overrides_from_lookup() {
        let vars: HashMap<&str, &str> = [
            (ENV_SERVER_URL, " http://analysis.internal "),
            (ENV_REQUEST_TIMEOUT_SECS, "30"),
            (ENV_LOG, ""),
        ]
        .into_iter()
        .collect();

        let config = HeadergenConfig::new()
            .apply_overrides_from(|name| vars.get(name).map(|v| (*v).to_string()))
            .unwrap();

        assert_eq!(config.server_url, "http://analysis.internal");
        assert_eq!(config.request_timeout_secs, Some(30));
        assert_eq!(config.log_filter, "info");
    }

    #[test]
    fn malformed_timeout_override() {
        let result = HeadergenConfig::new().apply_overrides_from(|name| {
            (name == ENV_REQUEST_TIMEOUT_SECS).then(|| "soon".to_string())
        });
        assert!(matches!(result, Err(HeadergenError::Config(_))));
    }

    #[tokio::test]
    async fn load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("headergen.toml");
        tokio::fs::write(&path, "phase_separator = \" / \"\n").await.unwrap();

        let config = HeadergenConfig::load(&path).await.unwrap();
        assert_eq!(config.phase_separator, " / ");

        let missing = HeadergenConfig::load(dir.path().join("absent.toml")).await;
        assert!(matches!(missing, Err(HeadergenError::ConfigIo { .. })));
    }
}
