// Application configuration, loaded once at startup
// A missing or malformed required value aborts boot instead of surfacing
// mid-request

use std::env;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable {0}")]
    MissingVar(&'static str),
    #[error("invalid value for {key}: {reason}")]
    InvalidVar { key: &'static str, reason: String },
}

/// Deployment environment; controls nothing security-relevant, only log
/// phrasing and local defaults.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    Development,
    Production,
}

impl Environment {
    pub fn as_str(&self) -> &'static str {
        match self {
            Environment::Development => "development",
            Environment::Production => "production",
        }
    }
}

/// Immutable application configuration.
///
/// Built from environment variables exactly once in `main`; every component
/// receives its settings from here rather than reading the environment
/// itself.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub jwt_secret: String,
    pub redis_url: String,
    pub host: String,
    pub port: u16,
    pub environment: Environment,
}

impl AppConfig {
    /// Load configuration from the process environment.
    ///
    /// `DATABASE_URL`, `JWT_SECRET` and `REDIS_URL` are required. `HOST`
    /// defaults to 0.0.0.0, `PORT` to 3000, `APP_ENV` to development.
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            database_url: required_var("DATABASE_URL")?,
            jwt_secret: required_var("JWT_SECRET")?,
            redis_url: required_var("REDIS_URL")?,
            host: env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: match env::var("PORT") {
                Ok(value) => parse_port(&value)?,
                Err(_) => 3000,
            },
            environment: match env::var("APP_ENV") {
                Ok(value) => parse_environment(&value)?,
                Err(_) => Environment::Development,
            },
        })
    }

    /// Socket address string the server binds to
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn required_var(key: &'static str) -> Result<String, ConfigError> {
    match env::var(key) {
        Ok(value) if !value.trim().is_empty() => Ok(value),
        _ => Err(ConfigError::MissingVar(key)),
    }
}

fn parse_port(value: &str) -> Result<u16, ConfigError> {
    value
        .trim()
        .parse::<u16>()
        .map_err(|e| ConfigError::InvalidVar {
            key: "PORT",
            reason: e.to_string(),
        })
}

fn parse_environment(value: &str) -> Result<Environment, ConfigError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "development" | "dev" => Ok(Environment::Development),
        "production" | "prod" => Ok(Environment::Production),
        other => Err(ConfigError::InvalidVar {
            key: "APP_ENV",
            reason: format!("unknown environment '{}'", other),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn port_parses_valid_values() {
        assert_eq!(parse_port("3000").unwrap(), 3000);
        assert_eq!(parse_port(" 8080 ").unwrap(), 8080);
    }

    #[test]
    fn port_rejects_garbage() {
        assert!(parse_port("not-a-port").is_err());
        assert!(parse_port("70000").is_err());
    }

    #[test]
    fn environment_parses_aliases() {
        assert_eq!(parse_environment("dev").unwrap(), Environment::Development);
        assert_eq!(parse_environment("PRODUCTION").unwrap(), Environment::Production);
        assert!(parse_environment("staging").is_err());
    }

    #[test]
    fn bind_addr_joins_host_and_port() {
        let config = AppConfig {
            database_url: "postgres://localhost/users".to_string(),
            jwt_secret: "secret".to_string(),
            redis_url: "redis://localhost".to_string(),
            host: "127.0.0.1".to_string(),
            port: 4000,
            environment: Environment::Development,
        };
        assert_eq!(config.bind_addr(), "127.0.0.1:4000");
    }

    #[test]
    fn missing_required_var_is_reported_by_name() {
        // Key chosen to never exist in a real environment.
        let err = required_var("USERS_API_TEST_DOES_NOT_EXIST").unwrap_err();
        assert!(matches!(
            err,
            ConfigError::MissingVar("USERS_API_TEST_DOES_NOT_EXIST")
        ));
    }
}
