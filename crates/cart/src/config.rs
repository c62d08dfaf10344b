//! Cart configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `CART_API_URL` - Base URL of the stock/products API
//!
//! ## Optional
//! - `CART_API_TOKEN` - Bearer token for the API
//! - `CART_STORAGE_KEY` - Snapshot key (default: `@RocketShoes:cart`)
//! - `CART_STORAGE_DIR` - Directory for the file store (default: `.rocketshoes`)
//! - `CART_REQUEST_TIMEOUT_SECS` - Per-request timeout (default: 10)
//! - `CART_PRODUCT_CACHE_TTL_SECS` - Product metadata cache TTL (default: 300)
//! - `CART_LOCALE` - Notice language, `en` or `pt-BR` (default: en)
//! - `CART_SERIALIZE_MUTATIONS` - Run cart mutations one at a time (default: false)

use std::path::PathBuf;
use std::time::Duration;

use secrecy::SecretString;
use thiserror::Error;
use url::Url;

use crate::notify::Locale;

/// Snapshot key used when `CART_STORAGE_KEY` is not set.
pub const DEFAULT_STORAGE_KEY: &str = "@RocketShoes:cart";

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Cart service configuration.
#[derive(Clone)]
pub struct CartConfig {
    /// Base URL of the stock/products API
    pub api_url: Url,
    /// Bearer token for the API
    pub api_token: Option<SecretString>,
    /// Key the cart snapshot is stored under
    pub storage_key: String,
    /// Directory for the file-backed store
    pub storage_dir: PathBuf,
    /// Per-request timeout for API calls
    pub request_timeout: Duration,
    /// How long product metadata stays cached
    pub product_cache_ttl: Duration,
    /// Language for failure notices
    pub locale: Locale,
    /// Hold a single-writer lock for the duration of each mutation
    pub serialize_mutations: bool,
}

impl std::fmt::Debug for CartConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CartConfig")
            .field("api_url", &self.api_url.as_str())
            .field(
                "api_token",
                &self.api_token.as_ref().map(|_| "[REDACTED]"),
            )
            .field("storage_key", &self.storage_key)
            .field("storage_dir", &self.storage_dir)
            .field("request_timeout", &self.request_timeout)
            .field("product_cache_ttl", &self.product_cache_ttl)
            .field("locale", &self.locale)
            .field("serialize_mutations", &self.serialize_mutations)
            .finish()
    }
}

impl CartConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing or invalid.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        Self::from_vars(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    ///
    /// Empty values are treated as unset.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing or invalid.
    pub fn from_vars<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        let api_url = get("CART_API_URL")
            .ok_or_else(|| ConfigError::MissingEnvVar("CART_API_URL".to_string()))?;
        let api_url = Url::parse(&api_url)
            .map_err(|e| ConfigError::InvalidEnvVar("CART_API_URL".to_string(), e.to_string()))?;

        let locale = get("CART_LOCALE")
            .map(|value| value.parse::<Locale>())
            .transpose()
            .map_err(|e| ConfigError::InvalidEnvVar("CART_LOCALE".to_string(), e))?
            .unwrap_or_default();

        Ok(Self {
            api_url,
            api_token: get("CART_API_TOKEN").map(SecretString::from),
            storage_key: get("CART_STORAGE_KEY").unwrap_or_else(|| DEFAULT_STORAGE_KEY.to_string()),
            storage_dir: get("CART_STORAGE_DIR").map_or_else(|| PathBuf::from(".rocketshoes"), PathBuf::from),
            request_timeout: parse_secs(get("CART_REQUEST_TIMEOUT_SECS"), "CART_REQUEST_TIMEOUT_SECS", 10)?,
            product_cache_ttl: parse_secs(
                get("CART_PRODUCT_CACHE_TTL_SECS"),
                "CART_PRODUCT_CACHE_TTL_SECS",
                300,
            )?,
            locale,
            serialize_mutations: parse_bool(get("CART_SERIALIZE_MUTATIONS"), "CART_SERIALIZE_MUTATIONS")?,
        })
    }
}

fn parse_secs(value: Option<String>, key: &str, default: u64) -> Result<Duration, ConfigError> {
    value
        .map_or(Ok(default), |v| v.trim().parse::<u64>())
        .map(Duration::from_secs)
        .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
}

fn parse_bool(value: Option<String>, key: &str) -> Result<bool, ConfigError> {
    match value.as_deref().map(str::trim) {
        None => Ok(false),
        Some("1" | "true" | "TRUE" | "yes") => Ok(true),
        Some("0" | "false" | "FALSE" | "no") => Ok(false),
        Some(other) => Err(ConfigError::InvalidEnvVar(
            key.to_string(),
            format!("expected a boolean, got '{other}'"),
        )),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::collections::HashMap;

    use secrecy::ExposeSecret;

    use super::*;

    fn config_from(pairs: &[(&str, &str)]) -> Result<CartConfig, ConfigError> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        CartConfig::from_vars(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = config_from(&[("CART_API_URL", "http://localhost:3333")]).unwrap();

        assert_eq!(config.storage_key, "@RocketShoes:cart");
        assert_eq!(config.storage_dir, PathBuf::from(".rocketshoes"));
        assert_eq!(config.request_timeout, Duration::from_secs(10));
        assert_eq!(config.product_cache_ttl, Duration::from_secs(300));
        assert_eq!(config.locale, Locale::En);
        assert!(!config.serialize_mutations);
        assert!(config.api_token.is_none());
    }

    #[test]
    fn test_missing_api_url() {
        let err = config_from(&[]).unwrap_err();
        assert!(matches!(err, ConfigError::MissingEnvVar(ref key) if key == "CART_API_URL"));

        // Blank counts as missing
        let err = config_from(&[("CART_API_URL", "  ")]).unwrap_err();
        assert!(matches!(err, ConfigError::MissingEnvVar(_)));
    }

    #[test]
    fn test_invalid_values() {
        let err = config_from(&[("CART_API_URL", "not a url")]).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidEnvVar(ref key, _) if key == "CART_API_URL"));

        let err = config_from(&[
            ("CART_API_URL", "http://localhost:3333"),
            ("CART_REQUEST_TIMEOUT_SECS", "ten"),
        ])
        .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidEnvVar(ref key, _) if key == "CART_REQUEST_TIMEOUT_SECS"));

        let err = config_from(&[
            ("CART_API_URL", "http://localhost:3333"),
            ("CART_SERIALIZE_MUTATIONS", "maybe"),
        ])
        .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidEnvVar(ref key, _) if key == "CART_SERIALIZE_MUTATIONS"));
    }

    #[test]
    fn test_overrides() {
        let config = config_from(&[
            ("CART_API_URL", "https://api.rocketshoes.dev/v1"),
            ("CART_API_TOKEN", "tok_live_9f8e7d"),
            ("CART_STORAGE_KEY", "@RocketShoes:cart:guest"),
            ("CART_LOCALE", "pt-BR"),
            ("CART_SERIALIZE_MUTATIONS", "true"),
            ("CART_PRODUCT_CACHE_TTL_SECS", "0"),
        ])
        .unwrap();

        assert_eq!(config.api_url.as_str(), "https://api.rocketshoes.dev/v1");
        assert_eq!(config.api_token.as_ref().unwrap().expose_secret(), "tok_live_9f8e7d");
        assert_eq!(config.storage_key, "@RocketShoes:cart:guest");
        assert_eq!(config.locale, Locale::PtBr);
        assert!(config.serialize_mutations);
        assert_eq!(config.product_cache_ttl, Duration::ZERO);
    }

    #[test]
    fn test_debug_redacts_token() {
        let config = config_from(&[
            ("CART_API_URL", "http://localhost:3333"),
            ("CART_API_TOKEN", "tok_live_9f8e7d"),
        ])
        .unwrap();

        let debug = format!("{config:?}");
        assert!(debug.contains("[REDACTED]"));
        assert!(!debug.contains("tok_live_9f8e7d"));
    }
}
