//! Database configuration - environment loading
//!
//! Each target reads six required variables under its own prefix:
//! - `{PREFIX}_HOST`, `{PREFIX}_PORT`, `{PREFIX}_USER`
//! - `{PREFIX}_PASSWORD`, `{PREFIX}_NAME`, `{PREFIX}_SSLMODE`
//!
//! There are no defaults. A key that is unset or set to the empty string
//! is reported as missing.

use std::fmt;
use std::str::FromStr;

use sqlx::postgres::{PgConnectOptions, PgSslMode};
use thiserror::Error;

/// Logical write target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DbTarget {
    /// Written first (`RDS_DB_*`)
    Primary,
    /// Written second, only after the primary succeeded (`LOCAL_DB_*`)
    Secondary,
}

impl DbTarget {
    /// Environment variable prefix.
    pub fn prefix(self) -> &'static str {
        match self {
            Self::Primary => "RDS_DB",
            Self::Secondary => "LOCAL_DB",
        }
    }

    /// Short name used in client-facing messages.
    pub fn label(self) -> &'static str {
        match self {
            Self::Primary => "RDS",
            Self::Secondary => "local DB",
        }
    }
}

impl fmt::Display for DbTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.prefix())
    }
}

/// Configuration loading failure
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Missing environment variable: {key}")]
    Missing { key: String },

    #[error("Invalid port in {key}: '{value}'")]
    InvalidPort { key: String, value: String },

    #[error("Invalid SSL mode in {key}: '{value}'")]
    InvalidSslMode { key: String, value: String },
}

/// Connection parameters for one target
#[derive(Clone)]
pub struct DbConfig {
    pub target: DbTarget,
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: String,
    pub name: String,
    pub ssl_mode: PgSslMode,
}

impl DbConfig {
    /// Load the target's configuration from the process environment.
    pub fn from_env(target: DbTarget) -> Result<Self, ConfigError> {
        Self::from_lookup(target, |key| std::env::var(key).ok())
    }

    /// Load the target's configuration from an arbitrary key lookup.
    ///
    /// Keys are read in a fixed order and the first missing one is reported.
    pub fn from_lookup<F>(target: DbTarget, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let require = |suffix: &str| -> Result<(String, String), ConfigError> {
            let key = format!("{}_{}", target.prefix(), suffix);
            match lookup(&key) {
                Some(value) if !value.is_empty() => Ok((key, value)),
                _ => Err(ConfigError::Missing { key }),
            }
        };

        let (_, host) = require("HOST")?;
        let (port_key, port) = require("PORT")?;
        let (_, user) = require("USER")?;
        let (_, password) = require("PASSWORD")?;
        let (_, name) = require("NAME")?;
        let (ssl_key, ssl_mode) = require("SSLMODE")?;

        let port = port
            .parse::<u16>()
            .map_err(|_| ConfigError::InvalidPort {
                key: port_key,
                value: port,
            })?;

        let ssl_mode = PgSslMode::from_str(&ssl_mode).map_err(|_| ConfigError::InvalidSslMode {
            key: ssl_key,
            value: ssl_mode,
        })?;

        Ok(Self {
            target,
            host,
            port,
            user,
            password,
            name,
            ssl_mode,
        })
    }

    /// Assemble sqlx connect options from the discrete fields.
    pub fn connect_options(&self) -> PgConnectOptions {
        PgConnectOptions::new()
            .host(&self.host)
            .port(self.port)
            .username(&self.user)
            .password(&self.password)
            .database(&self.name)
            .ssl_mode(self.ssl_mode)
    }
}

impl fmt::Debug for DbConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DbConfig")
            .field("target", &self.target)
            .field("host", &self.host)
            .field("port", &self.port)
            .field("user", &self.user)
            .field("password", &"<redacted>")
            .field("name", &self.name)
            .field("ssl_mode", &self.ssl_mode)
            .finish()
    }
}

#[cfg(test)]
impl DbConfig {
    /// Points at a local port nothing listens on.
    pub(crate) fn unreachable(target: DbTarget) -> Self {
        Self {
            target,
            host: "127.0.0.1".into(),
            port: 1,
            user: "app".into(),
            password: "secret".into(),
            name: "users".into(),
            ssl_mode: PgSslMode::Disable,
        }
    }
}

/// Configuration for both write targets
#[derive(Debug, Clone)]
pub struct DualDbConfig {
    pub primary: DbConfig,
    pub secondary: DbConfig,
}

impl DualDbConfig {
    /// Load primary then secondary from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        Ok(Self {
            primary: DbConfig::from_lookup(DbTarget::Primary, &lookup)?,
            secondary: DbConfig::from_lookup(DbTarget::Secondary, &lookup)?,
        })
    }
}
