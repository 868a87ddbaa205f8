//! API error types with IntoResponse
//!
//! Request-time failures become plain-text responses. The server keeps
//! serving after any of them.

use axum::http::header::{ALLOW, CONTENT_TYPE, X_CONTENT_TYPE_OPTIONS};
use axum::http::{HeaderValue, Method, StatusCode};
use axum::response::{IntoResponse, Response};

use super::form::FormError;
use crate::config::DbTarget;
use crate::db::DbError;

/// API error type with automatic HTTP status mapping
#[derive(Debug)]
pub enum ApiError {
    /// Wrong method for the endpoint (405)
    MethodNotAllowed { allow: Method },

    /// Body or query could not be decoded (400)
    BadForm(FormError),

    /// Insert into one target failed (500, logged)
    Store { target: DbTarget, source: DbError },
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::MethodNotAllowed { .. } => StatusCode::METHOD_NOT_ALLOWED,
            Self::BadForm(_) => StatusCode::BAD_REQUEST,
            Self::Store { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Client-facing message. Database details stay in the logs.
    pub fn message(&self) -> String {
        match self {
            Self::MethodNotAllowed { .. } => "Method not allowed".to_string(),
            Self::BadForm(_) => "Failed to parse form".to_string(),
            Self::Store { target, .. } => format!("Failed to store data in {}", target.label()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match &self {
            Self::MethodNotAllowed { allow } => {
                tracing::debug!(allow = %allow, "Method not allowed");
            }
            Self::BadForm(e) => {
                tracing::warn!("Form parse error: {}", e);
            }
            Self::Store { target, source } => {
                tracing::error!(target_db = %target, "Insert failed: {}", source);
            }
        }

        let mut response = (self.status(), format!("{}\n", self.message())).into_response();
        let headers = response.headers_mut();
        headers.insert(
            CONTENT_TYPE,
            HeaderValue::from_static("text/plain; charset=utf-8"),
        );
        headers.insert(X_CONTENT_TYPE_OPTIONS, HeaderValue::from_static("nosniff"));
        if let Self::MethodNotAllowed { allow } = &self {
            if let Ok(value) = HeaderValue::from_str(allow.as_str()) {
                headers.insert(ALLOW, value);
            }
        }

        response
    }
}

impl From<FormError> for ApiError {
    fn from(e: FormError) -> Self {
        Self::BadForm(e)
    }
}
