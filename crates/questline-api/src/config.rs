//! Server configuration read from the environment.

use std::net::SocketAddr;
use std::num::NonZeroUsize;
use std::str::FromStr;
use std::time::Duration;

use questline_store::StoreConfig;

use crate::error::AppError;

const DEFAULT_HOST: &str = "0.0.0.0";
const DEFAULT_PORT: u16 = 3000;
const DEFAULT_DATABASE_MAX_CONNECTIONS: u32 = 10;
const DEFAULT_OPERATION_TIMEOUT_MS: u64 = 5000;

/// Settings for the API server and the store behind it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// `PostgreSQL` connection string (`DATABASE_URL`).
    pub database_url: String,
    /// Bind address (`HOST`).
    pub host: String,
    /// Bind port (`PORT`).
    pub port: u16,
    /// Pool size (`DATABASE_MAX_CONNECTIONS`).
    pub database_max_connections: u32,
    /// Units of work allowed to hold a transaction at once
    /// (`MAX_CONCURRENT_UNITS`).
    pub max_concurrent_units: NonZeroUsize,
    /// Deadline given to every request's unit of work
    /// (`OPERATION_TIMEOUT_MS`).
    pub operation_timeout: Duration,
    /// OTLP collector endpoint (`OTEL_EXPORTER_OTLP_ENDPOINT`). Span export
    /// is off when unset.
    pub otlp_endpoint: Option<String>,
}

impl Config {
    /// Reads the configuration from the process environment.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if `DATABASE_URL` is missing or a value
    /// does not parse.
    pub fn from_env() -> Result<Self, AppError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Reads the configuration through `lookup`, which returns the value
    /// of a variable or `None` when it is unset.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if `DATABASE_URL` is missing or a value
    /// does not parse.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, AppError> {
        let database_url = lookup("DATABASE_URL")
            .filter(|url| !url.trim().is_empty())
            .ok_or_else(|| {
                AppError::Config("DATABASE_URL environment variable must be set".to_owned())
            })?;
        let host = lookup("HOST").unwrap_or_else(|| DEFAULT_HOST.to_owned());
        let port = parse_or(&lookup, "PORT", DEFAULT_PORT)?;
        let database_max_connections = parse_or(
            &lookup,
            "DATABASE_MAX_CONNECTIONS",
            DEFAULT_DATABASE_MAX_CONNECTIONS,
        )?;
        let max_concurrent_units = parse_or(
            &lookup,
            "MAX_CONCURRENT_UNITS",
            StoreConfig::default().max_concurrent_units,
        )?;
        let timeout_ms = parse_or(&lookup, "OPERATION_TIMEOUT_MS", DEFAULT_OPERATION_TIMEOUT_MS)?;
        let otlp_endpoint =
            lookup("OTEL_EXPORTER_OTLP_ENDPOINT").filter(|endpoint| !endpoint.trim().is_empty());

        Ok(Self {
            database_url,
            host,
            port,
            database_max_connections,
            max_concurrent_units,
            operation_timeout: Duration::from_millis(timeout_ms),
            otlp_endpoint,
        })
    }

    /// The address to listen on.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if `HOST:PORT` is not a socket address.
    pub fn socket_addr(&self) -> Result<SocketAddr, AppError> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .map_err(|e| AppError::Config(format!("invalid HOST:PORT combination: {e}")))
    }

    /// Store-side settings.
    #[must_use]
    pub fn store_config(&self) -> StoreConfig {
        StoreConfig::new(self.max_concurrent_units)
    }
}

fn parse_or<T>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
    default: T,
) -> Result<T, AppError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(key) {
        None => Ok(default),
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|e| AppError::Config(format!("{key} is invalid: {e}"))),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup_from(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn test_defaults_apply_when_only_database_url_is_set() {
        // Arrange
        let lookup = lookup_from(&[("DATABASE_URL", "postgres://localhost/questline")]);

        // Act
        let config = Config::from_lookup(lookup).unwrap();

        // Assert
        assert_eq!(config.database_url, "postgres://localhost/questline");
        assert_eq!(config.host, "0.0.0.0");
        assert_eq!(config.port, 3000);
        assert_eq!(config.database_max_connections, 10);
        assert_eq!(config.max_concurrent_units.get(), 8);
        assert_eq!(config.operation_timeout, Duration::from_millis(5000));
        assert_eq!(config.otlp_endpoint, None);
    }

    #[test]
    fn test_every_variable_is_read() {
        // Arrange
        let lookup = lookup_from(&[
            ("DATABASE_URL", "postgres://db/questline"),
            ("HOST", "127.0.0.1"),
            ("PORT", "8080"),
            ("DATABASE_MAX_CONNECTIONS", "4"),
            ("MAX_CONCURRENT_UNITS", "2"),
            ("OPERATION_TIMEOUT_MS", "250"),
            ("OTEL_EXPORTER_OTLP_ENDPOINT", "http://collector:4317"),
        ]);

        // Act
        let config = Config::from_lookup(lookup).unwrap();

        // Assert
        assert_eq!(config.socket_addr().unwrap().to_string(), "127.0.0.1:8080");
        assert_eq!(config.database_max_connections, 4);
        assert_eq!(config.store_config().max_concurrent_units.get(), 2);
        assert_eq!(config.operation_timeout, Duration::from_millis(250));
        assert_eq!(config.otlp_endpoint.as_deref(), Some("http://collector:4317"));
    }

    #[test]
    fn test_missing_database_url_is_a_config_error() {
        // Act
        let result = Config::from_lookup(lookup_from(&[("PORT", "3000")]));

        // Assert
        match result.unwrap_err() {
            AppError::Config(message) => assert!(message.contains("DATABASE_URL")),
            other => panic!("expected Config error, got {other:?}"),
        }
    }

    #[test]
    fn test_zero_concurrent_units_is_rejected() {
        // Arrange
        let lookup = lookup_from(&[
            ("DATABASE_URL", "postgres://localhost/questline"),
            ("MAX_CONCURRENT_UNITS", "0"),
        ]);

        // Act
        let result = Config::from_lookup(lookup);

        // Assert
        match result.unwrap_err() {
            AppError::Config(message) => assert!(message.contains("MAX_CONCURRENT_UNITS")),
            other => panic!("expected Config error, got {other:?}"),
        }
    }

    #[test]
    fn test_unparseable_port_is_rejected() {
        // Arrange
        let lookup = lookup_from(&[
            ("DATABASE_URL", "postgres://localhost/questline"),
            ("PORT", "eighty"),
        ]);

        // Act
        let result = Config::from_lookup(lookup);

        // Assert
        assert!(matches!(result, Err(AppError::Config(_))));
    }

    #[test]
    fn test_blank_otlp_endpoint_disables_export() {
        // Arrange
        let lookup = lookup_from(&[
            ("DATABASE_URL", "postgres://localhost/questline"),
            ("OTEL_EXPORTER_OTLP_ENDPOINT", "  "),
        ]);

        // Act
        let config = Config::from_lookup(lookup).unwrap();

        // Assert
        assert_eq!(config.otlp_endpoint, None);
    }
}
