//! Database configuration loaded from the environment
//!
//! A connection URL is used as-is when present. Otherwise the URL is assembled
//! from its parts, and the database name defaults to `<bot name>_<environment>`.

use std::collections::HashMap;
use std::env;
use std::str::FromStr;
use std::time::Duration;

use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use thiserror::Error;

use crate::engine::EngineConfig;
use crate::error::ModelError;

/// Characters escaped in the user and password of an assembled URL
const USERINFO: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~');

/// Configuration loading and validation errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid value for {field}: '{value}', expected {expected}")]
    InvalidValue {
        field: String,
        value: String,
        expected: String,
    },

    #[error("Validation failed for {field}: {reason}")]
    ValidationFailed { field: String, reason: String },
}

impl From<ConfigError> for ModelError {
    fn from(err: ConfigError) -> Self {
        ModelError::Configuration(err.to_string())
    }
}

/// Deployment environment the bot runs in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Environment {
    #[default]
    Development,
    Test,
    Production,
}

impl Environment {
    pub fn as_str(&self) -> &'static str {
        match self {
            Environment::Development => "development",
            Environment::Test => "test",
            Environment::Production => "production",
        }
    }
}

impl FromStr for Environment {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "development" | "dev" => Ok(Environment::Development),
            "test" | "testing" => Ok(Environment::Test),
            "production" | "prod" => Ok(Environment::Production),
            _ => Err(ConfigError::InvalidValue {
                field: "environment".to_string(),
                value: s.to_string(),
                expected: "development, test, or production".to_string(),
            }),
        }
    }
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Database section of the bot configuration
#[derive(Debug, Clone, PartialEq)]
pub struct DatabaseConfig {
    pub bot_name: String,
    pub environment: Environment,
    pub url: Option<String>,
    pub adapter: String,
    pub user: Option<String>,
    pub password: Option<String>,
    pub host: Option<String>,
    pub port: Option<u16>,
    pub database: Option<String>,
    pub max_connections: u32,
    pub acquire_timeout_secs: u64,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            bot_name: "grace".to_string(),
            environment: Environment::Development,
            url: None,
            adapter: "sqlite".to_string(),
            user: None,
            password: None,
            host: None,
            port: None,
            database: None,
            max_connections: 5,
            acquire_timeout_secs: 30,
        }
    }
}

impl DatabaseConfig {
    /// Load configuration from process environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_source(|key| env::var(key).ok())
    }

    /// Load configuration from a fixed set of key/value pairs
    pub fn from_map(values: &HashMap<String, String>) -> Result<Self, ConfigError> {
        Self::from_source(|key| values.get(key).cloned())
    }

    fn from_source<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let environment = match lookup("BOT_ENV") {
            Some(value) => Environment::from_str(&value)?,
            None => defaults.environment,
        };

        let config = Self {
            bot_name: lookup("BOT_NAME").unwrap_or(defaults.bot_name),
            environment,
            url: lookup("DATABASE_URL").filter(|url| !url.is_empty()),
            adapter: lookup("DATABASE_ADAPTER").unwrap_or(defaults.adapter),
            user: lookup("DATABASE_USER"),
            password: lookup("DATABASE_PASSWORD"),
            host: lookup("DATABASE_HOST"),
            port: parse_optional(&lookup, "DATABASE_PORT")?,
            database: lookup("DATABASE_NAME"),
            max_connections: parse_optional(&lookup, "DATABASE_MAX_CONNECTIONS")?
                .unwrap_or(defaults.max_connections),
            acquire_timeout_secs: parse_optional(&lookup, "DATABASE_ACQUIRE_TIMEOUT")?
                .unwrap_or(defaults.acquire_timeout_secs),
        };

        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.bot_name.is_empty() {
            return Err(ConfigError::ValidationFailed {
                field: "bot_name".to_string(),
                reason: "Bot name cannot be empty".to_string(),
            });
        }

        if self.url.is_none() && self.adapter.is_empty() {
            return Err(ConfigError::ValidationFailed {
                field: "adapter".to_string(),
                reason: "An adapter is required when no database URL is given".to_string(),
            });
        }

        if self.max_connections == 0 {
            return Err(ConfigError::ValidationFailed {
                field: "max_connections".to_string(),
                reason: "Must allow at least one connection".to_string(),
            });
        }

        Ok(())
    }

    /// Database name used when none is configured
    pub fn database_name(&self) -> String {
        self.database
            .clone()
            .unwrap_or_else(|| format!("{}_{}", self.bot_name, self.environment))
    }

    /// Connection URL, either configured directly or assembled from its parts
    pub fn database_url(&self) -> String {
        if let Some(url) = &self.url {
            return url.clone();
        }

        let database = self.database_name();
        if self.adapter == "sqlite" {
            return format!("sqlite://{}.db?mode=rwc", database);
        }

        let mut url = format!("{}://", self.adapter);
        if let Some(user) = &self.user {
            url.extend(utf8_percent_encode(user, USERINFO));
            if let Some(password) = &self.password {
                url.push(':');
                url.extend(utf8_percent_encode(password, USERINFO));
            }
            url.push('@');
        }
        url.push_str(self.host.as_deref().unwrap_or("localhost"));
        if let Some(port) = self.port {
            url.push_str(&format!(":{}", port));
        }
        url.push('/');
        url.push_str(&database);
        url
    }

    /// Engine settings derived from this configuration
    pub fn engine_config(&self) -> EngineConfig {
        EngineConfig::new(self.database_url())
            .max_connections(self.max_connections)
            .acquire_timeout(Duration::from_secs(self.acquire_timeout_secs))
    }
}

fn parse_optional<F, T>(lookup: &F, key: &str) -> Result<Option<T>, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match lookup(key) {
        Some(raw) => match raw.trim().parse::<T>() {
            Ok(value) => Ok(Some(value)),
            Err(_) => Err(ConfigError::InvalidValue {
                field: key.to_string(),
                value: raw,
                expected: std::any::type_name::<T>().to_string(),
            }),
        },
        None => Ok(None),
    }
}
