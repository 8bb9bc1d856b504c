//! Storefront configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! All variables are optional.
//!
//! - `RYJ_API_URL` - Backend REST API base URL (default: `http://localhost:4000`)
//! - `RYJ_STORAGE_DIR` - Directory for session storage (default: `.ryj`)
//! - `RYJ_CATALOG_FILE` - Serve the catalog from a JSON file instead of the API
//! - `RYJ_HTTP_TIMEOUT_SECS` - HTTP request timeout (default: 10)
//! - `RYJ_PRODUCT_CACHE_TTL_SECS` - Product detail cache TTL (default: 300)
//! - `RYJ_CURRENCY` - Display currency (default: `PEN`)
//! - `SENTRY_DSN` - Sentry error tracking DSN

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use ryj_core::CurrencyCode;
use thiserror::Error;
use url::Url;

const DEFAULT_API_URL: &str = "http://localhost:4000";
const DEFAULT_STORAGE_DIR: &str = ".ryj";
const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 10;
const DEFAULT_PRODUCT_CACHE_TTL_SECS: u64 = 300;

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Storefront configuration.
#[derive(Debug, Clone)]
pub struct StorefrontConfig {
    /// Base URL of the backend REST API
    pub api_base_url: Url,
    /// Directory holding persisted session records (cart, auth)
    pub storage_dir: PathBuf,
    /// Optional static catalog file used instead of the API
    pub catalog_file: Option<PathBuf>,
    /// Timeout applied to every HTTP request
    pub http_timeout: Duration,
    /// How long product detail responses are cached
    pub product_cache_ttl: Duration,
    /// Currency used when formatting prices
    pub currency: CurrencyCode,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
}

impl StorefrontConfig {
    /// Create a configuration with defaults for everything but the API URL
    /// and storage directory.
    #[must_use]
    pub fn new(api_base_url: Url, storage_dir: impl Into<PathBuf>) -> Self {
        Self {
            api_base_url,
            storage_dir: storage_dir.into(),
            catalog_file: None,
            http_timeout: Duration::from_secs(DEFAULT_HTTP_TIMEOUT_SECS),
            product_cache_ttl: Duration::from_secs(DEFAULT_PRODUCT_CACHE_TTL_SECS),
            currency: CurrencyCode::default(),
            sentry_dsn: None,
        }
    }

    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a variable is present but invalid.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration from an arbitrary variable lookup.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a variable is present but invalid.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let env = Env(lookup);

        let api_base_url = env.or_default("RYJ_API_URL", DEFAULT_API_URL);
        let api_base_url = Url::parse(&api_base_url)
            .map_err(|e| ConfigError::InvalidEnvVar("RYJ_API_URL".to_string(), e.to_string()))?;
        if api_base_url.cannot_be_a_base() {
            return Err(ConfigError::InvalidEnvVar(
                "RYJ_API_URL".to_string(),
                "must be an absolute http(s) URL".to_string(),
            ));
        }

        let storage_dir = PathBuf::from(env.or_default("RYJ_STORAGE_DIR", DEFAULT_STORAGE_DIR));
        let catalog_file = env.optional("RYJ_CATALOG_FILE").map(PathBuf::from);
        let http_timeout = Duration::from_secs(
            env.parse_or("RYJ_HTTP_TIMEOUT_SECS", DEFAULT_HTTP_TIMEOUT_SECS)?,
        );
        let product_cache_ttl = Duration::from_secs(
            env.parse_or("RYJ_PRODUCT_CACHE_TTL_SECS", DEFAULT_PRODUCT_CACHE_TTL_SECS)?,
        );
        let currency = env.parse_or("RYJ_CURRENCY", CurrencyCode::default())?;
        let sentry_dsn = env.optional("SENTRY_DSN");

        Ok(Self {
            api_base_url,
            storage_dir,
            catalog_file,
            http_timeout,
            product_cache_ttl,
            currency,
            sentry_dsn,
        })
    }
}

/// Variable lookup with the usual accessors.
struct Env<F>(F);

impl<F> Env<F>
where
    F: Fn(&str) -> Option<String>,
{
    /// Get an optional variable. Blank values count as unset.
    fn optional(&self, key: &str) -> Option<String> {
        (self.0)(key).filter(|value| !value.trim().is_empty())
    }

    /// Get a variable with a default value.
    fn or_default(&self, key: &str, default: &str) -> String {
        self.optional(key).unwrap_or_else(|| default.to_string())
    }

    /// Parse a variable, falling back to `default` when unset.
    fn parse_or<T>(&self, key: &str, default: T) -> Result<T, ConfigError>
    where
        T: FromStr,
        T::Err: std::fmt::Display,
    {
        self.optional(key).map_or(Ok(default), |raw| {
            raw.trim()
                .parse::<T>()
                .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
        })
    }
}
