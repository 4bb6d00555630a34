//! Application configuration loaded from environment variables.
//!
//! Fail-fast loading with validation: the required CRM access token must be
//! present or the application exits with a clear error message.

use std::env;
use thiserror::Error;

/// Default CRM API base URL.
pub const DEFAULT_CRM_BASE_URL: &str = "https://api.hubapi.com";

/// Configuration errors that can occur during environment loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingVar(String),

    #[error("Invalid value for {var}: {message}")]
    InvalidValue { var: String, message: String },
}

/// Application configuration.
#[derive(Clone)]
pub struct Config {
    /// CRM API base URL.
    pub crm_base_url: String,

    /// CRM private app access token.
    pub crm_access_token: String,

    /// API key gating full health diagnostics. When unset, the health
    /// endpoint only ever serves the minimal shape.
    pub health_check_api_key: Option<String>,

    /// Allowed CORS origins (comma-separated URLs or "*" for development).
    pub cors_origins: Vec<String>,

    /// Server bind address.
    pub host: String,

    /// Server listen port.
    pub port: u16,

    /// Tracing filter directive (e.g., "info,sow_crm=debug").
    pub rust_log: String,
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("crm_base_url", &self.crm_base_url)
            .field("crm_access_token", &"[redacted]")
            .field("health_check_api_key", &self.health_check_api_key.as_ref().map(|_| "[redacted]"))
            .field("cors_origins", &self.cors_origins)
            .field("host", &self.host)
            .field("port", &self.port)
            .finish_non_exhaustive()
    }
}

impl Config {
    /// Load configuration from process environment variables.
    ///
    /// # Required Variables
    ///
    /// - `CRM_ACCESS_TOKEN` - CRM private app access token
    ///
    /// # Optional Variables
    ///
    /// - `CRM_BASE_URL` - CRM API base URL (default: `https://api.hubapi.com`)
    /// - `HEALTH_CHECK_API_KEY` - key unlocking full health diagnostics
    /// - `CORS_ORIGINS` - comma-separated allowed origins (default: "*")
    /// - `HOST` - bind address (default: "0.0.0.0")
    /// - `PORT` - listen port (default: 3000)
    /// - `RUST_LOG` - log level filter (default: "info")
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_vars(|name| env::var(name).ok())
    }

    /// Load configuration through an arbitrary variable lookup (for testing).
    pub fn from_vars(get: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let crm_access_token = get("CRM_ACCESS_TOKEN")
            .filter(|v| !v.is_empty())
            .ok_or_else(|| ConfigError::MissingVar("CRM_ACCESS_TOKEN".to_string()))?;

        let crm_base_url =
            get("CRM_BASE_URL").unwrap_or_else(|| DEFAULT_CRM_BASE_URL.to_string());

        let health_check_api_key = get("HEALTH_CHECK_API_KEY").filter(|v| !v.is_empty());

        let cors_origins = get("CORS_ORIGINS")
            .map(|s| s.split(',').map(|o| o.trim().to_string()).collect())
            .unwrap_or_else(|| vec!["*".to_string()]);

        let host = get("HOST").unwrap_or_else(|| "0.0.0.0".to_string());

        let port: u16 = match get("PORT") {
            Some(raw) => raw.parse().map_err(|_| ConfigError::InvalidValue {
                var: "PORT".to_string(),
                message: format!("'{raw}' is not a valid port number"),
            })?,
            None => 3000,
        };
        if port == 0 {
            return Err(ConfigError::InvalidValue {
                var: "PORT".to_string(),
                message: "Port must be between 1 and 65535".to_string(),
            });
        }

        let rust_log = get("RUST_LOG").unwrap_or_else(|| "info".to_string());

        Ok(Self {
            crm_base_url,
            crm_access_token,
            health_check_api_key,
            cors_origins,
            host,
            port,
            rust_log,
        })
    }

    /// Get the server bind address as a socket address string.
    #[must_use]
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vars<'a>(pairs: &'a [(&'a str, &'a str)]) -> impl Fn(&str) -> Option<String> + 'a {
        move |name| {
            pairs
                .iter()
                .find(|(k, _)| *k == name)
                .map(|(_, v)| (*v).to_string())
        }
    }

    #[test]
    fn missing_access_token_is_rejected() {
        let result = Config::from_vars(vars(&[]));
        assert!(matches!(result, Err(ConfigError::MissingVar(v)) if v == "CRM_ACCESS_TOKEN"));
    }

    #[test]
    fn empty_access_token_is_rejected() {
        let result = Config::from_vars(vars(&[("CRM_ACCESS_TOKEN", "")]));
        assert!(matches!(result, Err(ConfigError::MissingVar(_))));
    }

    #[test]
    fn defaults_apply_when_only_token_is_set() {
        let config = Config::from_vars(vars(&[("CRM_ACCESS_TOKEN", "pat-secret")])).unwrap();
        assert_eq!(config.crm_base_url, DEFAULT_CRM_BASE_URL);
        assert_eq!(config.host, "0.0.0.0");
        assert_eq!(config.port, 3000);
        assert_eq!(config.cors_origins, vec!["*".to_string()]);
        assert!(config.health_check_api_key.is_none());
        assert_eq!(config.rust_log, "info");
    }

    #[test]
    fn invalid_port_is_rejected() {
        let result = Config::from_vars(vars(&[
            ("CRM_ACCESS_TOKEN", "pat-secret"),
            ("PORT", "not-a-port"),
        ]));
        assert!(matches!(result, Err(ConfigError::InvalidValue { var, .. }) if var == "PORT"));

        let result = Config::from_vars(vars(&[("CRM_ACCESS_TOKEN", "pat-secret"), ("PORT", "0")]));
        assert!(matches!(result, Err(ConfigError::InvalidValue { .. })));
    }

    #[test]
    fn cors_origins_are_split_and_trimmed() {
        let config = Config::from_vars(vars(&[
            ("CRM_ACCESS_TOKEN", "pat-secret"),
            ("CORS_ORIGINS", "https://a.example.com, https://b.example.com"),
        ]))
        .unwrap();
        assert_eq!(
            config.cors_origins,
            vec![
                "https://a.example.com".to_string(),
                "https://b.example.com".to_string()
            ]
        );
    }

    #[test]
    fn bind_addr_joins_host_and_port() {
        let config = Config::from_vars(vars(&[
            ("CRM_ACCESS_TOKEN", "pat-secret"),
            ("HOST", "127.0.0.1"),
            ("PORT", "8080"),
        ]))
        .unwrap();
        assert_eq!(config.bind_addr(), "127.0.0.1:8080");
    }

    #[test]
    fn debug_redacts_secrets() {
        let config = Config::from_vars(vars(&[
            ("CRM_ACCESS_TOKEN", "pat-secret"),
            ("HEALTH_CHECK_API_KEY", "hc-secret"),
        ]))
        .unwrap();
        let rendered = format!("{config:?}");
        assert!(!rendered.contains("pat-secret"));
        assert!(!rendered.contains("hc-secret"));
    }
}
