use std::env;
use std::time::Duration;

use thiserror::Error;
use url::Url;

const DEFAULT_BASE_URL: &str = "http://localhost:8000";
const DEFAULT_TIMEOUT_SECS: u64 = 30;
const API_PREFIX: &str = "api/v1/";

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ConfigError {
    #[error("invalid value for {0}: {1}")]
    InvalidValue(String, String),
}

/// Where the quiz services live and how long to wait for them.
#[derive(Clone, Debug)]
pub struct ApiConfig {
    base_url: Url,
    timeout: Duration,
}

impl ApiConfig {
    /// Build a config for the service rooted at `base_url`.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` if `base_url` is not an absolute
    /// http(s) URL.
    pub fn new(base_url: &str) -> Result<Self, ConfigError> {
        Ok(Self {
            base_url: parse_base_url(base_url)?,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        })
    }

    /// Read `QUIZ_API_BASE_URL` and `QUIZ_HTTP_TIMEOUT_SECS`, with defaults.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` if either variable is set but unusable.
    pub fn from_env() -> Result<Self, ConfigError> {
        let base_url =
            env::var("QUIZ_API_BASE_URL").unwrap_or_else(|_| DEFAULT_BASE_URL.to_string());
        let mut config = Self::new(&base_url)?;

        if let Ok(raw) = env::var("QUIZ_HTTP_TIMEOUT_SECS") {
            let secs: u64 = raw.trim().parse().map_err(|_| {
                ConfigError::InvalidValue("QUIZ_HTTP_TIMEOUT_SECS".into(), raw.clone())
            })?;
            if secs == 0 {
                return Err(ConfigError::InvalidValue(
                    "QUIZ_HTTP_TIMEOUT_SECS".into(),
                    raw,
                ));
            }
            config.timeout = Duration::from_secs(secs);
        }

        Ok(config)
    }

    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    #[must_use]
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    #[must_use]
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Root every endpoint path is resolved against (`{base}/api/v1/`).
    ///
    /// # Errors
    ///
    /// Returns `url::ParseError` if the prefix cannot be joined.
    pub fn api_root(&self) -> Result<Url, url::ParseError> {
        self.base_url.join(API_PREFIX)
    }
}

fn parse_base_url(raw: &str) -> Result<Url, ConfigError> {
    let invalid = || ConfigError::InvalidValue("QUIZ_API_BASE_URL".into(), raw.to_string());
    let mut url = Url::parse(raw.trim()).map_err(|_| invalid())?;
    if url.cannot_be_a_base() || !matches!(url.scheme(), "http" | "https") {
        return Err(invalid());
    }
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    Ok(url)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn api_root_appends_prefix() {
        let config = ApiConfig::new("http://localhost:8000").unwrap();
        assert_eq!(
            config.api_root().unwrap().as_str(),
            "http://localhost:8000/api/v1/"
        );
    }

    #[test]
    fn api_root_keeps_existing_path() {
        let config = ApiConfig::new("https://example.com/quiz").unwrap();
        assert_eq!(
            config.api_root().unwrap().as_str(),
            "https://example.com/quiz/api/v1/"
        );
    }

    #[test]
    fn rejects_non_http_urls() {
        assert!(ApiConfig::new("not a url").is_err());
        assert!(ApiConfig::new("mailto:someone@example.com").is_err());
        assert!(ApiConfig::new("ftp://example.com").is_err());
    }
}
