//! Submit endpoint - dual write
//!
//! `received -> method-checked -> form-parsed -> insert-primary ->
//! insert-secondary -> responded`. Every failing step short-circuits.
//!
//! The two inserts are not one transaction. If the secondary insert fails
//! the primary row stays, and nothing reconciles the two databases.

use axum::extract::{Request, State};
use axum::http::Method;

use crate::config::DbTarget;
use crate::db::NewUser;
use crate::http::error::ApiError;
use crate::http::form::read_form;
use crate::state::AppState;

pub const SUCCESS_MESSAGE: &str = "User data stored in both databases successfully";

/// POST /submit - Store name/email/phone in both databases
pub async fn submit(
    State(state): State<AppState>,
    req: Request,
) -> Result<&'static str, ApiError> {
    if req.method() != Method::POST {
        return Err(ApiError::MethodNotAllowed { allow: Method::POST });
    }

    let (parts, body) = req.into_parts();
    let form = read_form(&parts, body).await?;

    let user = NewUser {
        name: form.value("name"),
        email: form.value("email"),
        phone: form.value("phone"),
    };

    state
        .primary()
        .insert(&user)
        .await
        .map_err(|source| ApiError::Store {
            target: DbTarget::Primary,
            source,
        })?;

    state
        .secondary()
        .insert(&user)
        .await
        .map_err(|source| ApiError::Store {
            target: DbTarget::Secondary,
            source,
        })?;

    tracing::info!(
        name = %user.name,
        email = %user.email,
        phone = %user.phone,
        "Stored user data in both databases"
    );
    Ok(SUCCESS_MESSAGE)
}
