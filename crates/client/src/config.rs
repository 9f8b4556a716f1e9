//! Client configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `INVENTORY_API_URL` - Base URL of the REST API (e.g. `http://localhost:8000/`)
//!
//! ## Optional
//! - `INVENTORY_WS_URL` - Base URL of the live channel (default: derived from
//!   the API URL, `http` -> `ws` and `https` -> `wss`)
//! - `INVENTORY_SESSION_FILE` - Where the session is persisted
//!   (default: `.inventory-session.json`)

use std::path::PathBuf;

use thiserror::Error;
use url::Url;

const DEFAULT_SESSION_FILE: &str = ".inventory-session.json";

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Where the client talks to and where it keeps its session.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// REST base, always ending in `/`
    pub api_url: Url,
    /// Live channel base, always ending in `/`
    pub ws_url: Url,
    /// Session file path
    pub session_file: PathBuf,
}

impl ClientConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if `INVENTORY_API_URL` is missing or any URL is
    /// invalid.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let api_url = get_required_env("INVENTORY_API_URL")?;
        let ws_url = get_optional_env("INVENTORY_WS_URL");
        let session_file = get_env_or_default("INVENTORY_SESSION_FILE", DEFAULT_SESSION_FILE);

        Self::new(&api_url, ws_url.as_deref(), PathBuf::from(session_file))
    }

    /// Build a configuration from explicit values.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidEnvVar` naming the variable the value
    /// would have come from.
    pub fn new(
        api_url: &str,
        ws_url: Option<&str>,
        session_file: PathBuf,
    ) -> Result<Self, ConfigError> {
        let api_url = parse_base_url("INVENTORY_API_URL", api_url, &["http", "https"])?;
        let ws_url = match ws_url {
            Some(raw) => parse_base_url("INVENTORY_WS_URL", raw, &["ws", "wss"])?,
            None => derive_ws_url(&api_url)?,
        };

        Ok(Self {
            api_url,
            ws_url,
            session_file,
        })
    }
}

/// Parse a base URL, check its scheme and make sure it ends in `/` so that
/// relative joins append instead of replacing the last segment.
fn parse_base_url(var: &str, raw: &str, schemes: &[&str]) -> Result<Url, ConfigError> {
    let mut url = Url::parse(raw.trim())
        .map_err(|e| ConfigError::InvalidEnvVar(var.to_string(), e.to_string()))?;

    if !schemes.contains(&url.scheme()) {
        return Err(ConfigError::InvalidEnvVar(
            var.to_string(),
            format!("expected scheme {}, got {}", schemes.join(" or "), url.scheme()),
        ));
    }

    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    Ok(url)
}

/// `http://host:8000/` -> `ws://host:8000/`
fn derive_ws_url(api_url: &Url) -> Result<Url, ConfigError> {
    let scheme = match api_url.scheme() {
        "https" => "wss",
        _ => "ws",
    };
    let mut ws_url = api_url.clone();
    ws_url.set_scheme(scheme).map_err(|()| {
        ConfigError::InvalidEnvVar(
            "INVENTORY_WS_URL".to_string(),
            format!("cannot derive a websocket URL from {api_url}"),
        )
    })?;
    Ok(ws_url)
}

/// Get a required environment variable.
fn get_required_env(key: &str) -> Result<String, ConfigError> {
    std::env::var(key).map_err(|_| ConfigError::MissingEnvVar(key.to_string()))
}

/// Get an optional environment variable.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    get_optional_env(key).unwrap_or_else(|| default.to_string())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn config(api: &str, ws: Option<&str>) -> Result<ClientConfig, ConfigError> {
        ClientConfig::new(api, ws, PathBuf::from("session.json"))
    }

    #[test]
    fn test_trailing_slash_is_added() {
        let config = config("http://localhost:8000", None).unwrap();
        assert_eq!(config.api_url.as_str(), "http://localhost:8000/");
        assert_eq!(
            config.api_url.join("api/products/").unwrap().as_str(),
            "http://localhost:8000/api/products/"
        );
    }

    #[test]
    fn test_nested_base_keeps_prefix() {
        let config = config("https://example.com/inventory", None).unwrap();
        assert_eq!(
            config.api_url.join("api/user/").unwrap().as_str(),
            "https://example.com/inventory/api/user/"
        );
    }

    #[test]
    fn test_ws_url_is_derived() {
        assert_eq!(
            config("http://localhost:8000/", None).unwrap().ws_url.as_str(),
            "ws://localhost:8000/"
        );
        assert_eq!(
            config("https://example.com", None).unwrap().ws_url.as_str(),
            "wss://example.com/"
        );
    }

    #[test]
    fn test_explicit_ws_url_wins() {
        let config = config("http://localhost:8000/", Some("ws://localhost:9000")).unwrap();
        assert_eq!(config.ws_url.as_str(), "ws://localhost:9000/");
    }

    #[test]
    fn test_invalid_urls_are_rejected() {
        assert!(matches!(
            config("not a url", None),
            Err(ConfigError::InvalidEnvVar(var, _)) if var == "INVENTORY_API_URL"
        ));
        assert!(matches!(
            config("ftp://example.com", None),
            Err(ConfigError::InvalidEnvVar(_, _))
        ));
        assert!(matches!(
            config("http://example.com", Some("http://example.com")),
            Err(ConfigError::InvalidEnvVar(var, _)) if var == "INVENTORY_WS_URL"
        ));
    }
}
