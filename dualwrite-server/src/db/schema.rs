//! Schema setup for the `users` table

use sqlx::PgPool;

use crate::config::DbTarget;
use crate::error::{Error, Result};

const CREATE_USERS_TABLE: &str = r#"
    CREATE TABLE IF NOT EXISTS users (
        id SERIAL PRIMARY KEY,
        name TEXT NOT NULL,
        email TEXT NOT NULL,
        phone TEXT NOT NULL,
        created_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP
    )
"#;

/// Create the `users` table if it does not exist.
///
/// Safe to run on every startup.
pub async fn ensure_users_table(pool: &PgPool, target: DbTarget) -> Result<()> {
    tracing::debug!(target_db = %target, "Ensuring users table");

    sqlx::query(CREATE_USERS_TABLE)
        .execute(pool)
        .await
        .map_err(|source| Error::Schema { target, source })?;

    Ok(())
}
