//! HTTP surface: login gate, HTML pages and the JSON/file API.

pub mod handlers;
pub mod pages;

pub use handlers::*;

use crate::error::ReportError;
use crate::service::ReportService;
use axum::{
    extract::{Request, State},
    http::{header, HeaderMap, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Json, Redirect, Response},
    routing::{get, post},
    Router,
};
use serde::Serialize;
use std::sync::Arc;

/// Cookie set by a successful login
pub const ACCESS_COOKIE: &str = "access_code";
/// Header alternative to the cookie, for scripted clients
pub const ACCESS_HEADER: &str = "x-access-code";

/// Shared state of all handlers
#[derive(Clone)]
pub struct AppState {
    pub service: Arc<ReportService>,
    access_code: Arc<str>,
}

impl AppState {
    pub fn new(service: Arc<ReportService>, access_code: &str) -> Self {
        if access_code.is_empty() {
            tracing::warn!("No access code configured, every login will be refused");
        }
        Self {
            service,
            access_code: Arc::from(access_code),
        }
    }

    /// An empty configured code never matches
    pub fn accepts(&self, code: &str) -> bool {
        !self.access_code.is_empty() && code == &*self.access_code
    }

    fn is_authorized(&self, headers: &HeaderMap) -> bool {
        let from_header = headers
            .get(ACCESS_HEADER)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|code| self.accepts(code));
        from_header || cookie_value(headers, ACCESS_COOKIE).is_some_and(|code| self.accepts(code))
    }
}

/// Value of cookie `name` from the `Cookie` headers
pub fn cookie_value<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(key, _)| *key == name)
        .map(|(_, value)| value)
}

/// Lets authorized requests through; others get 401 JSON on `/api`, a redirect to login elsewhere
async fn require_access(State(state): State<AppState>, request: Request, next: Next) -> Response {
    if state.is_authorized(request.headers()) {
        return next.run(request).await;
    }
    tracing::warn!("Unauthorized request to {}", request.uri().path());
    if request.uri().path().starts_with("/api") {
        ReportError::Unauthorized.into_response()
    } else {
        Redirect::to("/").into_response()
    }
}

/// Error body of the JSON API
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub code: &'static str,
    pub message: String,
}

impl IntoResponse for ReportError {
    fn into_response(self) -> Response {
        let status =
            StatusCode::from_u16(self.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        if status.is_server_error() {
            tracing::error!("Request failed: {}", self);
        }
        let body = ErrorResponse {
            success: false,
            code: self.error_code(),
            message: self.to_string(),
        };
        (status, Json(body)).into_response()
    }
}

/// Builds the application router
pub fn build_router(state: AppState) -> Router {
    let gated = Router::new()
        .route("/home", get(pages::home))
        .route("/report", get(pages::report))
        .route("/api/period", get(handlers::period))
        .route("/api/report", get(handlers::summary))
        .route("/api/income/documents", get(handlers::income_documents))
        .route("/api/income/file", get(handlers::income_file))
        .route("/api/expenses/audit", get(handlers::expense_audit))
        .route("/api/expenses/unlinked", get(handlers::unlinked_expenses))
        .route("/api/expenses/file", get(handlers::expense_file))
        .route_layer(middleware::from_fn_with_state(state.clone(), require_access));

    Router::new()
        .route("/health", get(handlers::health_check))
        .route("/", get(pages::login_page))
        .route("/login", post(pages::login))
        .merge(gated)
        .with_state(state)
}
