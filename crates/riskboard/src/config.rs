//! Client configuration
//!
//! The backend is located by one base URL; every endpoint hangs off
//! `{base}/api`.

use thiserror::Error;
use url::Url;

pub const BACKEND_URL_ENV: &str = "RISKBOARD_BACKEND_URL";
pub const TIMEOUT_ENV: &str = "RISKBOARD_TIMEOUT_SECS";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

#[derive(Error, Debug, PartialEq)]
pub enum ConfigError {
  #[error("RISKBOARD_BACKEND_URL is not set")]
  MissingBackendUrl,

  #[error("Invalid backend URL '{url}': {reason}")]
  InvalidBackendUrl { url: String, reason: String },
}

/// Configuration for the prediction API client
#[derive(Debug, Clone, PartialEq)]
pub struct ClientConfig {
  /// Backend base URL without the `/api` suffix (e.g. "http://localhost:8000")
  pub base_url: String,
  /// Request timeout in seconds
  pub timeout_secs: u64,
}

impl ClientConfig {
  pub fn new(base_url: &str, timeout_secs: u64) -> Result<Self, ConfigError> {
    let invalid = |reason: String| ConfigError::InvalidBackendUrl { url: base_url.to_string(), reason };

    let parsed = Url::parse(base_url.trim()).map_err(|e| invalid(e.to_string()))?;
    if !matches!(parsed.scheme(), "http" | "https") {
      return Err(invalid(format!("unsupported scheme '{}'", parsed.scheme())));
    }

    let base_url = parsed.as_str().trim_end_matches('/').to_string();
    Ok(Self { base_url, timeout_secs })
  }

  /// Load from `RISKBOARD_BACKEND_URL` / `RISKBOARD_TIMEOUT_SECS`
  pub fn from_env() -> Result<Self, ConfigError> {
    let base_url = std::env::var(BACKEND_URL_ENV).map_err(|_| ConfigError::MissingBackendUrl)?;

    let timeout_secs =
      std::env::var(TIMEOUT_ENV).ok().and_then(|s| s.parse().ok()).unwrap_or(DEFAULT_TIMEOUT_SECS);

    Self::new(&base_url, timeout_secs)
  }

  /// Root every endpoint path is appended to
  pub fn api_root(&self) -> String {
    format!("{}/api", self.base_url)
  }
}
