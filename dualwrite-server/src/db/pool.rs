//! Database connection pool management
//!
//! Liveness is checked on a single direct connection so a refused or
//! rejected connection surfaces with its real cause. The pool handed to the
//! handlers is lazy and bounds how long an insert waits for a connection.

use std::time::Duration;

use sqlx::postgres::{PgConnectOptions, PgPoolOptions};
use sqlx::{Connection, PgConnection, PgPool};

use crate::config::DbConfig;
use crate::error::{Error, Result};

/// Default maximum connections per pool.
const DEFAULT_MAX_CONNECTIONS: u32 = 5;

/// How long an insert waits for a pooled connection before failing.
///
/// sqlx keeps redialing a refused connection until this runs out, so it
/// is kept short.
pub const ACQUIRE_TIMEOUT: Duration = Duration::from_secs(2);

/// Check one target with a direct connection, then build its pool.
///
/// # Errors
///
/// `Error::Connect` if the connection cannot be opened, `Error::Ping` if the
/// liveness check fails.
pub async fn connect(config: &DbConfig) -> Result<PgPool> {
    let target = config.target;
    let options = config.connect_options();

    let mut conn = PgConnection::connect_with(&options)
        .await
        .map_err(|source| Error::Connect { target, source })?;
    conn.ping()
        .await
        .map_err(|source| Error::Ping { target, source })?;
    if let Err(e) = conn.close().await {
        tracing::debug!(target_db = %target, "Closing liveness connection failed: {}", e);
    }

    tracing::info!(target_db = %target, "Connected to {} database successfully", target);
    Ok(lazy_pool(options))
}

/// Pool that opens connections on demand.
pub(crate) fn lazy_pool(options: PgConnectOptions) -> PgPool {
    PgPoolOptions::new()
        .max_connections(DEFAULT_MAX_CONNECTIONS)
        .acquire_timeout(ACQUIRE_TIMEOUT)
        .connect_lazy_with(options)
}

/// Live pools for both targets
#[derive(Clone)]
pub struct DualPools {
    pub primary: PgPool,
    pub secondary: PgPool,
}
