//! User repository
//!
//! Insert-only. Records are never read back, updated, or deleted here.

use async_trait::async_trait;
use sqlx::PgPool;
use thiserror::Error;

/// Database error type
#[derive(Debug, Error)]
pub enum DbError {
    #[error("database error: {0}")]
    Sqlx(#[from] sqlx::Error),
}

/// A submitted user record, before the database assigns `id` and `created_at`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub phone: String,
}

/// Insert seam for one write target.
#[async_trait]
pub trait UserStore: Send + Sync {
    async fn insert(&self, user: &NewUser) -> Result<(), DbError>;
}

/// PostgreSQL-backed store
#[derive(Clone)]
pub struct PgUserStore {
    pool: PgPool,
}

impl PgUserStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserStore for PgUserStore {
    async fn insert(&self, user: &NewUser) -> Result<(), DbError> {
        sqlx::query(
            r#"
            INSERT INTO users (name, email, phone)
            VALUES ($1, $2, $3)
            "#,
        )
        .bind(&user.name)
        .bind(&user.email)
        .bind(&user.phone)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}
