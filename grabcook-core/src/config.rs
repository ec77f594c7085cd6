//! Client configuration from environment variables.

use std::env;
use std::path::PathBuf;
use std::time::Duration;

use url::Url;

use crate::error::ConfigError;

/// Default API base URL.
pub const DEFAULT_API_URL: &str = "http://localhost:8000";

/// Default address of the web front-end, used for shareable links.
pub const DEFAULT_WEB_URL: &str = "http://localhost:3000";

/// Default HTTP timeout in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Default delay before a draft change is written to storage.
pub const DEFAULT_DRAFT_DEBOUNCE_MS: u64 = 1000;

/// Default delay before a typed search query is sent.
pub const DEFAULT_SEARCH_DEBOUNCE_MS: u64 = 300;

#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base URL of the recipe API, e.g. "http://localhost:8000".
    pub api_url: Url,
    /// Base URL of the web front-end.
    pub web_url: Url,
    /// Directory holding persistent storage (drafts, caches, session).
    pub data_dir: PathBuf,
    /// Timeout applied to every HTTP request.
    pub timeout: Duration,
    pub draft_debounce: Duration,
    pub search_debounce: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_url: Url::parse(DEFAULT_API_URL).expect("default API URL is valid"),
            web_url: Url::parse(DEFAULT_WEB_URL).expect("default web URL is valid"),
            data_dir: Self::default_data_dir(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            draft_debounce: Duration::from_millis(DEFAULT_DRAFT_DEBOUNCE_MS),
            search_debounce: Duration::from_millis(DEFAULT_SEARCH_DEBOUNCE_MS),
        }
    }
}

impl ClientConfig {
    /// Load configuration from environment variables.
    ///
    /// Optional:
    /// - `GRABCOOK_API_URL`: API base URL (default: "http://localhost:8000")
    /// - `GRABCOOK_WEB_URL`: Front-end URL for links (default: "http://localhost:3000")
    /// - `GRABCOOK_DATA_DIR`: Storage directory (default: "~/.grabcook")
    /// - `GRABCOOK_HTTP_TIMEOUT_SECS`: Request timeout (default: 30)
    /// - `GRABCOOK_DRAFT_DEBOUNCE_MS`: Draft save debounce (default: 1000)
    /// - `GRABCOOK_SEARCH_DEBOUNCE_MS`: Search debounce (default: 300)
    pub fn from_env() -> Result<Self, ConfigError> {
        let api_url = match env::var("GRABCOOK_API_URL") {
            Ok(raw) => Url::parse(&raw)?,
            Err(_) => Url::parse(DEFAULT_API_URL)?,
        };

        let web_url = match env::var("GRABCOOK_WEB_URL") {
            Ok(raw) => Url::parse(&raw)?,
            Err(_) => Url::parse(DEFAULT_WEB_URL)?,
        };

        let data_dir = env::var("GRABCOOK_DATA_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| Self::default_data_dir());

        let timeout =
            Duration::from_secs(parse_var("GRABCOOK_HTTP_TIMEOUT_SECS", DEFAULT_TIMEOUT_SECS)?);
        let draft_debounce = Duration::from_millis(parse_var(
            "GRABCOOK_DRAFT_DEBOUNCE_MS",
            DEFAULT_DRAFT_DEBOUNCE_MS,
        )?);
        let search_debounce = Duration::from_millis(parse_var(
            "GRABCOOK_SEARCH_DEBOUNCE_MS",
            DEFAULT_SEARCH_DEBOUNCE_MS,
        )?);

        Ok(Self {
            api_url,
            web_url,
            data_dir,
            timeout,
            draft_debounce,
            search_debounce,
        })
    }

    /// Replace the API base URL.
    pub fn with_api_url(mut self, raw: &str) -> Result<Self, ConfigError> {
        self.api_url = Url::parse(raw)?;
        Ok(self)
    }

    /// Front-end search page, the base of shareable search links.
    pub fn search_page_url(&self) -> Result<Url, ConfigError> {
        Ok(self.web_url.join("search")?)
    }

    /// Get the default data directory: ~/.grabcook
    pub fn default_data_dir() -> PathBuf {
        dirs::home_dir()
            .map(|h| h.join(".grabcook"))
            .unwrap_or_else(|| PathBuf::from("data"))
    }

    pub fn storage_dir(&self) -> PathBuf {
        self.data_dir.join("storage")
    }
}

fn parse_var(key: &str, default: u64) -> Result<u64, ConfigError> {
    match env::var(key) {
        Ok(raw) => raw.trim().parse().map_err(|e| ConfigError::InvalidValue {
            key: key.to_string(),
            message: format!("{}: {}", raw, e),
        }),
        Err(_) => Ok(default),
    }
}
