//! Form page endpoint

use axum::extract::{Request, State};
use axum::http::header::LOCATION;
use axum::http::{HeaderValue, Method, StatusCode};
use axum::response::{IntoResponse, Response};
use tower::ServiceExt;
use tower_http::services::ServeFile;

use crate::http::error::ApiError;
use crate::state::AppState;

/// GET / - Serve the static form page
///
/// Any method other than GET is rejected before the file is touched.
/// A path ending in `/index.html` is redirected to its directory.
/// A missing file is a 404; content type follows the file extension.
pub async fn form_page(State(state): State<AppState>, req: Request) -> Response {
    if req.method() != Method::GET {
        return ApiError::MethodNotAllowed { allow: Method::GET }.into_response();
    }

    if req.uri().path().ends_with("/index.html") {
        return index_redirect(req.uri().query());
    }

    ServeFile::new(state.form_page())
        .oneshot(req)
        .await
        .into_response()
}

/// 301 to `./`, keeping the query string.
fn index_redirect(query: Option<&str>) -> Response {
    let location = match query {
        Some(q) if !q.is_empty() => format!("./?{q}"),
        _ => "./".to_string(),
    };
    let location = HeaderValue::from_str(&location).unwrap_or(HeaderValue::from_static("./"));

    (StatusCode::MOVED_PERMANENTLY, [(LOCATION, location)]).into_response()
}
