//! Application configuration.
//!
//! Built once at process start with [`AppConfig::from_env`] and passed to
//! collaborators explicitly. Nothing here is mutable after construction.
//!
//! | Variable                  | Default                     |
//! |---------------------------|-----------------------------|
//! | `VISTA_API_BASE_URL`      | `http://localhost:8000/api` |
//! | `VISTA_API_TIMEOUT_SECS`  | `30`                        |
//! | `VISTA_PORT`              | `3000`                      |

use serde::Serialize;
use std::env;
use std::time::Duration;

use crate::error::ConfigError;

pub const DEFAULT_API_BASE_URL: &str = "http://localhost:8000/api";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_PORT: u16 = 3000;

/// Remote REST collaborator settings.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ApiConfig {
    pub base_url: String,
    pub timeout: Duration,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_API_BASE_URL.to_string(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }
}

/// HTTP server settings.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ServerConfig {
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { port: DEFAULT_PORT }
    }
}

/// Branding shown by consoles.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Branding {
    pub app_name: String,
    pub description: String,
    pub version: String,
}

impl Default for Branding {
    fn default() -> Self {
        Self {
            app_name: "Vista Explorer".to_string(),
            description: "Portal Management System".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

/// Console colour palette.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Theme {
    pub primary: String,
    pub secondary: String,
    pub accent: String,
    pub neutral: String,
}

impl Default for Theme {
    fn default() -> Self {
        Self {
            primary: "#403E99".to_string(),
            secondary: "#CB1E1E".to_string(),
            accent: "#D9C663".to_string(),
            neutral: "#E4E4E4".to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AppConfig {
    pub api: ApiConfig,
    pub server: ServerConfig,
    pub branding: Branding,
    pub theme: Theme,
}

impl AppConfig {
    /// Load `.env` (if present) then read the environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build from an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = AppConfig::default();

        if let Some(url) = lookup("VISTA_API_BASE_URL").filter(|v| !v.trim().is_empty()) {
            config.api.base_url = url.trim().trim_end_matches('/').to_string();
        }

        if let Some(raw) = lookup("VISTA_API_TIMEOUT_SECS") {
            let secs = parse_var::<u64>("VISTA_API_TIMEOUT_SECS", &raw)?;
            config.api.timeout = Duration::from_secs(secs);
        }

        if let Some(raw) = lookup("VISTA_PORT") {
            config.server.port = parse_var("VISTA_PORT", &raw)?;
        }

        Ok(config)
    }
}

fn parse_var<T>(key: &str, raw: &str) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    raw.trim().parse::<T>().map_err(|e| ConfigError {
        key: key.to_string(),
        message: format!("'{}': {}", raw, e),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = AppConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config.api.base_url, DEFAULT_API_BASE_URL);
        assert_eq!(config.api.timeout, Duration::from_secs(30));
        assert_eq!(config.server.port, 3000);
        assert_eq!(config.branding.app_name, "Vista Explorer");
    }

    #[test]
    fn test_overrides() {
        let config = AppConfig::from_lookup(lookup(&[
            ("VISTA_API_BASE_URL", "https://api.example.com/api/"),
            ("VISTA_API_TIMEOUT_SECS", "5"),
            ("VISTA_PORT", "8080"),
        ]))
        .unwrap();

        assert_eq!(config.api.base_url, "https://api.example.com/api");
        assert_eq!(config.api.timeout, Duration::from_secs(5));
        assert_eq!(config.server.port, 8080);
    }

    #[test]
    fn test_invalid_port() {
        let err = AppConfig::from_lookup(lookup(&[("VISTA_PORT", "eighty")])).unwrap_err();
        assert_eq!(err.key, "VISTA_PORT");
    }
}
