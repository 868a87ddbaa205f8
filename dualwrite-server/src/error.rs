//! Error types for dualwrite-server startup

use thiserror::Error;

use crate::config::{ConfigError, DbTarget};

pub type Result<T> = std::result::Result<T, Error>;

/// Fatal startup errors. None of these are retried.
#[derive(Error, Debug)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Failed to open {target} DB: {source}")]
    Connect {
        target: DbTarget,
        #[source]
        source: sqlx::Error,
    },

    #[error("Failed to connect to {target} DB: {source}")]
    Ping {
        target: DbTarget,
        #[source]
        source: sqlx::Error,
    },

    #[error("Failed to create table in {target} DB: {source}")]
    Schema {
        target: DbTarget,
        #[source]
        source: sqlx::Error,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
