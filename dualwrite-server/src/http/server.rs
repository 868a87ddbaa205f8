//! Axum server setup
//!
//! Server skeleton with:
//! - Fixed listen address (0.0.0.0:8080)
//! - Tracing middleware
//! - Graceful shutdown on SIGTERM/Ctrl+C

use std::net::SocketAddr;
use std::path::PathBuf;

use axum::routing::any;
use axum::Router;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;

use super::routes;
use crate::error::Result;
use crate::state::AppState;

/// Server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address to bind to (always 0.0.0.0:8080)
    pub bind_addr: SocketAddr,

    /// Static page served on GET, relative to the working directory
    pub form_page: PathBuf,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([0, 0, 0, 0], 8080)),
            form_page: PathBuf::from("index.html"),
        }
    }
}

/// Build the application router.
///
/// `/submit` matches exactly; everything else falls through to the form page.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/submit", any(routes::submit))
        .route("/", any(routes::form_page))
        .fallback(routes::form_page)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Run the HTTP server until a shutdown signal arrives.
///
/// # Example
///
/// ```ignore
/// let pools = bootstrap(&DualDbConfig::from_env()?).await?;
/// let config = ServerConfig::default();
/// let state = AppState::from_pools(pools, config.form_page.clone());
/// run_server(state, config).await?;
/// ```
pub async fn run_server(state: AppState, config: ServerConfig) -> Result<()> {
    let app = build_router(state);

    let listener = TcpListener::bind(config.bind_addr).await?;
    tracing::info!("Server started on {}", config.bind_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server shutdown complete");
    Ok(())
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!("failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, starting shutdown");
        }
        _ = terminate => {
            tracing::info!("Received SIGTERM, starting shutdown");
        }
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;
    use std::sync::{Arc, Mutex};

    use async_trait::async_trait;
    use axum::body::{to_bytes, Body};
    use axum::http::header::{CONTENT_TYPE, LOCATION};
    use axum::http::{Request, StatusCode};
    use axum::response::Response;
    use tempfile::TempDir;
    use tower::ServiceExt;

    use super::*;
    use crate::db::{DbError, NewUser, UserStore};
    use crate::http::routes::submit::SUCCESS_MESSAGE;

    /// In-memory store that records inserts or fails every call.
    #[derive(Default)]
    struct FakeStore {
        rows: Mutex<Vec<NewUser>>,
        fail: bool,
    }

    impl FakeStore {
        fn failing() -> Self {
            Self {
                fail: true,
                ..Self::default()
            }
        }

        fn rows(&self) -> Vec<NewUser> {
            self.rows.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl UserStore for FakeStore {
        async fn insert(&self, user: &NewUser) -> std::result::Result<(), DbError> {
            if self.fail {
                return Err(DbError::Sqlx(sqlx::Error::PoolClosed));
            }
            self.rows.lock().unwrap().push(user.clone());
            Ok(())
        }
    }

    struct Harness {
        app: Router,
        primary: Arc<FakeStore>,
        secondary: Arc<FakeStore>,
        _dir: TempDir,
    }

    const PAGE: &str = "<!doctype html><form action=\"/submit\" method=\"post\"></form>";

    fn harness(primary: FakeStore, secondary: FakeStore) -> Harness {
        let dir = TempDir::new().unwrap();
        let page = dir.path().join("index.html");
        std::fs::File::create(&page)
            .unwrap()
            .write_all(PAGE.as_bytes())
            .unwrap();

        let primary = Arc::new(primary);
        let secondary = Arc::new(secondary);
        let state = AppState::new(primary.clone(), secondary.clone(), page);

        Harness {
            app: build_router(state),
            primary,
            secondary,
            _dir: dir,
        }
    }

    fn healthy() -> Harness {
        harness(FakeStore::default(), FakeStore::default())
    }

    fn post_form(uri: &str, body: &'static str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header(CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(Body::from(body))
            .unwrap()
    }

    fn request(method: &str, uri: &str) -> Request<Body> {
        Request::builder()
            .method(method)
            .uri(uri)
            .body(Body::empty())
            .unwrap()
    }

    async fn body_text(response: Response) -> String {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    fn alice() -> NewUser {
        NewUser {
            name: "Alice".into(),
            email: "a@x.com".into(),
            phone: "555".into(),
        }
    }

    #[test]
    fn default_config() {
        let config = ServerConfig::default();
        assert_eq!(config.bind_addr.port(), 8080);
        assert!(config.bind_addr.ip().is_unspecified());
        assert_eq!(config.form_page, PathBuf::from("index.html"));
    }

    #[tokio::test]
    async fn get_root_serves_form_page() {
        let h = healthy();
        let response = h.app.oneshot(request("GET", "/")).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let content_type = response.headers()[CONTENT_TYPE].to_str().unwrap().to_owned();
        assert!(content_type.starts_with("text/html"), "{content_type}");
        assert_eq!(body_text(response).await, PAGE);
    }

    #[tokio::test]
    async fn unmatched_paths_serve_form_page() {
        let h = healthy();
        let response = h.app.oneshot(request("GET", "/signup")).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_text(response).await, PAGE);
    }

    #[tokio::test]
    async fn index_html_redirects_to_directory() {
        let h = healthy();
        let response = h
            .app
            .clone()
            .oneshot(request("GET", "/index.html"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::MOVED_PERMANENTLY);
        assert_eq!(response.headers()[LOCATION], "./");

        let response = h
            .app
            .oneshot(request("GET", "/docs/index.html?ref=mail"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::MOVED_PERMANENTLY);
        assert_eq!(response.headers()[LOCATION], "./?ref=mail");
    }

    #[tokio::test]
    async fn missing_form_page_is_404() {
        let state = AppState::new(
            Arc::new(FakeStore::default()),
            Arc::new(FakeStore::default()),
            "/nonexistent/dualwrite/index.html",
        );
        let response = build_router(state)
            .oneshot(request("GET", "/"))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn form_page_rejects_other_methods() {
        for method in ["POST", "PUT", "DELETE", "HEAD"] {
            let h = healthy();
            let response = h.app.oneshot(request(method, "/")).await.unwrap();
            assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED, "{method}");
        }
    }

    #[tokio::test]
    async fn submit_rejects_get_without_side_effects() {
        let h = healthy();
        let response = h
            .app
            .oneshot(request("GET", "/submit?name=Alice&email=a@x.com&phone=555"))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(body_text(response).await, "Method not allowed\n");
        assert!(h.primary.rows().is_empty());
        assert!(h.secondary.rows().is_empty());
    }

    #[tokio::test]
    async fn submit_writes_both_databases() {
        let h = healthy();
        let response = h
            .app
            .oneshot(post_form("/submit", "name=Alice&email=a@x.com&phone=555"))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_text(response).await, SUCCESS_MESSAGE);
        assert_eq!(h.primary.rows(), vec![alice()]);
        assert_eq!(h.secondary.rows(), vec![alice()]);
    }

    #[tokio::test]
    async fn missing_fields_are_stored_empty() {
        let h = healthy();
        let response = h
            .app
            .oneshot(post_form("/submit", "name=Bob"))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let expected = NewUser {
            name: "Bob".into(),
            ..NewUser::default()
        };
        assert_eq!(h.primary.rows(), vec![expected.clone()]);
        assert_eq!(h.secondary.rows(), vec![expected]);
    }

    #[tokio::test]
    async fn query_values_fill_in_for_body() {
        let h = healthy();
        let response = h
            .app
            .oneshot(post_form("/submit?phone=555", "name=Alice&email=a%40x.com"))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(h.primary.rows(), vec![alice()]);
    }

    #[tokio::test]
    async fn malformed_body_is_400_with_no_inserts() {
        let h = healthy();
        let response = h
            .app
            .oneshot(post_form("/submit", "name=%zz&email=a@x.com&phone=555"))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_text(response).await, "Failed to parse form\n");
        assert!(h.primary.rows().is_empty());
        assert!(h.secondary.rows().is_empty());
    }

    #[tokio::test]
    async fn malformed_content_type_is_400_with_no_inserts() {
        let h = healthy();
        let submission = Request::builder()
            .method("POST")
            .uri("/submit")
            .header(CONTENT_TYPE, "application/x-www-form-urlencoded; charset")
            .body(Body::from("name=Alice&email=a@x.com&phone=555"))
            .unwrap();

        let response = h.app.oneshot(submission).await.unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_text(response).await, "Failed to parse form\n");
        assert!(h.primary.rows().is_empty());
        assert!(h.secondary.rows().is_empty());
    }

    #[tokio::test]
    async fn primary_failure_skips_secondary() {
        let h = harness(FakeStore::failing(), FakeStore::default());
        let response = h
            .app
            .oneshot(post_form("/submit", "name=Alice&email=a@x.com&phone=555"))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body_text(response).await, "Failed to store data in RDS\n");
        assert!(h.primary.rows().is_empty());
        assert!(h.secondary.rows().is_empty());
    }

    #[tokio::test]
    async fn secondary_failure_leaves_primary_row() {
        let h = harness(FakeStore::default(), FakeStore::failing());
        let response = h
            .app
            .oneshot(post_form("/submit", "name=Alice&email=a@x.com&phone=555"))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body_text(response).await, "Failed to store data in local DB\n");
        // Not rolled back: the databases now disagree.
        assert_eq!(h.primary.rows(), vec![alice()]);
        assert!(h.secondary.rows().is_empty());
    }

    #[tokio::test]
    async fn server_keeps_serving_after_errors() {
        let h = harness(FakeStore::default(), FakeStore::failing());

        let first = h
            .app
            .clone()
            .oneshot(post_form("/submit", "name=a;b"))
            .await
            .unwrap();
        assert_eq!(first.status(), StatusCode::BAD_REQUEST);

        let second = h
            .app
            .clone()
            .oneshot(post_form("/submit", "name=Alice&email=a@x.com&phone=555"))
            .await
            .unwrap();
        assert_eq!(second.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let third = h.app.oneshot(request("GET", "/")).await.unwrap();
        assert_eq!(third.status(), StatusCode::OK);
    }
}
