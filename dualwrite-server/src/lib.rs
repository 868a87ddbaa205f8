//! dualwrite-server: form intake with a sequential dual write
//!
//! Serves a static form and stores each submission in two independent
//! PostgreSQL databases, primary first. A request succeeds only when both
//! inserts do; there is no cross-database transaction or compensation.

pub mod config;
pub mod db;
pub mod error;
pub mod http;
pub mod state;

pub use config::{DbConfig, DbTarget, DualDbConfig};
pub use db::DualPools;
pub use error::{Error, Result};
pub use http::{build_router, run_server, ServerConfig};
pub use state::AppState;

/// Connect to both targets and make sure each has a `users` table.
///
/// Primary connects before secondary; tables are created after both
/// connections are live. The first failure is returned and nothing is
/// retried.
pub async fn bootstrap(config: &DualDbConfig) -> Result<DualPools> {
    let primary = db::connect(&config.primary).await?;
    let secondary = db::connect(&config.secondary).await?;

    db::ensure_users_table(&primary, DbTarget::Primary).await?;
    db::ensure_users_table(&secondary, DbTarget::Secondary).await?;

    Ok(DualPools { primary, secondary })
}
