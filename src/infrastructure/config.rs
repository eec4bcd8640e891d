use std::env;
use std::time::Duration;

use crate::domain::{Error, Fields};

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    /// Pool size override; `None` keeps the driver default.
    pub database_max_connections: Option<u32>,
    pub listen_host: String,
    pub listen_port: u16,
    /// Per-request timeout in seconds; 0 disables it.
    pub http_timeout_secs: u64,
    pub log_level: String,
    pub environment: String,
    pub debug: bool,
}

impl Config {
    pub fn from_env() -> Self {
        Self::from_vars(|key| env::var(key).ok())
    }

    /// Builds the configuration from any key lookup; missing or unparsable
    /// values fall back to defaults.
    pub fn from_vars(var: impl Fn(&str) -> Option<String>) -> Self {
        Self {
            database_url: var("DATABASE_URL").unwrap_or_else(|| "sqlite::memory:".to_string()),
            database_max_connections: var("DATABASE_MAX_CONNECTIONS").and_then(|v| v.parse().ok()),
            listen_host: var("HTTP_LISTEN_HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
            listen_port: var("HTTP_LISTEN_PORT")
                .and_then(|p| p.parse().ok())
                .unwrap_or(8000),
            http_timeout_secs: var("HTTP_TIMEOUT")
                .and_then(|t| t.parse().ok())
                .unwrap_or(30),
            log_level: var("LOG_LEVEL").unwrap_or_else(|| "info".to_string()),
            environment: var("ENVIRONMENT").unwrap_or_else(|| "development".to_string()),
            debug: var("DEBUG")
                .map(|v| v == "true" || v == "1")
                .unwrap_or(false),
        }
    }

    /// Rejects settings the service cannot start with.
    pub fn validate(&self) -> Result<(), Error> {
        let mut fields = Fields::new();
        if self.database_url.trim().is_empty() {
            fields.insert("DATABASE_URL".into(), "required".into());
        }
        if self.listen_host.trim().is_empty() {
            fields.insert("HTTP_LISTEN_HOST".into(), "required".into());
        }
        if self.listen_port == 0 {
            fields.insert("HTTP_LISTEN_PORT".into(), "must be non-zero".into());
        }
        if self.database_max_connections == Some(0) {
            fields.insert("DATABASE_MAX_CONNECTIONS".into(), "must be non-zero".into());
        }

        if fields.is_empty() {
            Ok(())
        } else {
            Err(Error::validation("config validation failed", fields))
        }
    }

    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.listen_host, self.listen_port)
    }

    pub fn http_timeout(&self) -> Option<Duration> {
        (self.http_timeout_secs > 0).then(|| Duration::from_secs(self.http_timeout_secs))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Kind;
    use std::collections::HashMap;

    fn config_from(pairs: &[(&str, &str)]) -> Config {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_vars(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = config_from(&[]);
        assert_eq!(config.database_url, "sqlite::memory:");
        assert_eq!(config.database_max_connections, None);
        assert_eq!(config.listen_addr(), "0.0.0.0:8000");
        assert_eq!(config.http_timeout(), Some(Duration::from_secs(30)));
        assert_eq!(config.log_level, "info");
        assert_eq!(config.environment, "development");
        assert!(!config.debug);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_overrides() {
        let config = config_from(&[
            ("DATABASE_URL", "postgres://svc@db/app"),
            ("DATABASE_MAX_CONNECTIONS", "4"),
            ("HTTP_LISTEN_HOST", "127.0.0.1"),
            ("HTTP_LISTEN_PORT", "9090"),
            ("HTTP_TIMEOUT", "5"),
            ("LOG_LEVEL", "debug"),
            ("DEBUG", "1"),
        ]);
        assert_eq!(config.database_url, "postgres://svc@db/app");
        assert_eq!(config.database_max_connections, Some(4));
        assert_eq!(config.listen_addr(), "127.0.0.1:9090");
        assert_eq!(config.http_timeout(), Some(Duration::from_secs(5)));
        assert_eq!(config.log_level, "debug");
        assert!(config.debug);
    }

    #[test]
    fn test_zero_timeout_disables_it() {
        let config = config_from(&[("HTTP_TIMEOUT", "0")]);
        assert_eq!(config.http_timeout(), None);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_unparsable_port_falls_back() {
        let config = config_from(&[("HTTP_LISTEN_PORT", "eighty")]);
        assert_eq!(config.listen_port, 8000);
    }

    #[test]
    fn test_validation_reports_every_field() {
        let config = config_from(&[
            ("DATABASE_URL", " "),
            ("HTTP_LISTEN_PORT", "0"),
        ]);
        let err = config.validate().unwrap_err();
        assert!(err.is(Kind::BadRequest));
        assert_eq!(err.fields.len(), 2);
        assert_eq!(err.fields["HTTP_LISTEN_PORT"], "must be non-zero");
        assert!(err.fields.contains_key("DATABASE_URL"));
    }
}
