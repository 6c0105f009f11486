//! Cart client configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Optional
//! - `CART_API_BASE_URL` - Base URL of the cart API (default: <http://127.0.0.1:5000>)
//! - `CART_ROW_EXIT_DELAY_MS` - Wait after a removed row starts its exit transition (default: 300)
//! - `CART_CLEAR_REFRESH_DELAY_MS` - Wait before re-rendering after clearing the cart (default: 500)
//! - `CART_REQUEST_TIMEOUT_SECS` - Per-request timeout; unset means requests never time out

use std::time::Duration;

use thiserror::Error;
use url::Url;

const DEFAULT_BASE_URL: &str = "http://127.0.0.1:5000";
const DEFAULT_ROW_EXIT_DELAY_MS: u64 = 300;
const DEFAULT_CLEAR_REFRESH_DELAY_MS: u64 = 500;

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Cart client configuration.
#[derive(Debug, Clone)]
pub struct CartClientConfig {
    /// Base URL every endpoint path is joined onto (always ends in `/`)
    pub base_url: Url,
    /// How long a removed row's exit transition runs before the view refreshes
    pub row_exit_delay: Duration,
    /// How long the "Cart cleared" toast shows before the view refreshes
    pub clear_refresh_delay: Duration,
    /// Optional per-request timeout
    pub request_timeout: Option<Duration>,
}

impl CartClientConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a variable is set but cannot be parsed.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary key lookup.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a value is present but invalid.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let base_url = lookup("CART_API_BASE_URL").unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
        let base_url = parse_base_url(&base_url)
            .map_err(|e| ConfigError::InvalidEnvVar("CART_API_BASE_URL".to_string(), e))?;

        let row_exit_delay = Duration::from_millis(parse_or_default(
            &lookup,
            "CART_ROW_EXIT_DELAY_MS",
            DEFAULT_ROW_EXIT_DELAY_MS,
        )?);
        let clear_refresh_delay = Duration::from_millis(parse_or_default(
            &lookup,
            "CART_CLEAR_REFRESH_DELAY_MS",
            DEFAULT_CLEAR_REFRESH_DELAY_MS,
        )?);

        let request_timeout = lookup("CART_REQUEST_TIMEOUT_SECS")
            .map(|raw| parse_u64("CART_REQUEST_TIMEOUT_SECS", &raw))
            .transpose()?
            .map(Duration::from_secs);

        Ok(Self {
            base_url,
            row_exit_delay,
            clear_refresh_delay,
            request_timeout,
        })
    }

    /// Configuration pointing at `base_url` with no delays.
    ///
    /// Useful for tests and for frontends that animate on their own.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if `base_url` is not an absolute HTTP(S) URL.
    pub fn immediate(base_url: &str) -> Result<Self, ConfigError> {
        Ok(Self {
            base_url: parse_base_url(base_url)
                .map_err(|e| ConfigError::InvalidEnvVar("base_url".to_string(), e))?,
            row_exit_delay: Duration::ZERO,
            clear_refresh_delay: Duration::ZERO,
            request_timeout: None,
        })
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Parse a base URL and make sure relative joins append rather than replace.
fn parse_base_url(raw: &str) -> Result<Url, String> {
    let mut url = Url::parse(raw.trim()).map_err(|e| e.to_string())?;

    if !matches!(url.scheme(), "http" | "https") {
        return Err(format!("unsupported scheme '{}'", url.scheme()));
    }

    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }

    Ok(url)
}

fn parse_u64(key: &str, raw: &str) -> Result<u64, ConfigError> {
    raw.trim()
        .parse::<u64>()
        .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
}

/// Get a numeric variable with a default value.
fn parse_or_default(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
    default: u64,
) -> Result<u64, ConfigError> {
    lookup(key).map_or(Ok(default), |raw| parse_u64(key, &raw))
}
