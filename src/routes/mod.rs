//! Router assembly.
//!
//! SYSTEM CONTEXT
//! ==============
//! Page routes serve the HTML shell (the client renders the list, editor and
//! view screens), the JSON API exposes the record services, and the editor
//! websocket drives one [`crate::services::editor::EditorSession`] per
//! connection. Anything else falls through to static files.

pub mod dashboards;
pub mod extract;
pub mod pages;
pub mod ws;

use std::path::Path;

use axum::Router;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use axum::routing::{get, post};
use serde::Serialize;
use tower_http::compression::CompressionLayer;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tracing::warn;

use crate::state::AppState;
use crate::store::RecordError;

/// Full application router.
pub fn app(state: AppState, static_dir: &Path) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(pages::list_page))
        .route("/dashboard/{id}", get(pages::editor_page))
        .route("/dashboard/{id}/view", get(pages::view_page))
        .route(
            "/api/dashboards",
            get(dashboards::list_dashboards).post(dashboards::create_dashboard),
        )
        .route(
            "/api/dashboards/{id}",
            get(dashboards::get_dashboard)
                .patch(dashboards::update_dashboard)
                .delete(dashboards::delete_dashboard),
        )
        .route("/api/dashboards/{id}/duplicate", post(dashboards::duplicate_dashboard))
        .route(
            "/api/dashboards/{id}/blocks",
            get(dashboards::list_blocks).post(dashboards::create_block),
        )
        .route(
            "/api/blocks/{id}",
            get(dashboards::get_block)
                .patch(dashboards::update_block)
                .delete(dashboards::delete_block),
        )
        .route("/api/dashboards/{id}/editor", get(ws::handle_editor))
        .route("/healthz", get(healthz))
        .fallback_service(ServeDir::new(static_dir))
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

async fn healthz() -> StatusCode {
    StatusCode::OK
}

// =============================================================================
// ERRORS
// =============================================================================

/// Wire form of a failed request.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub code: &'static str,
    pub message: String,
}

/// A record error rendered as `{"code", "message"}` with a matching status.
#[derive(Debug)]
pub struct ApiError(pub RecordError);

impl From<RecordError> for ApiError {
    fn from(err: RecordError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = status_for(&self.0);
        if status.is_server_error() {
            warn!(error = %self.0, "request failed");
        }
        let body = ErrorBody { code: self.0.error_code(), message: self.0.to_string() };
        (status, Json(body)).into_response()
    }
}

pub(crate) fn status_for(err: &RecordError) -> StatusCode {
    match err {
        RecordError::Validation(_) => StatusCode::BAD_REQUEST,
        RecordError::NotFound { .. } => StatusCode::NOT_FOUND,
        RecordError::Database(_) | RecordError::Remote(_) | RecordError::RemoteStatus { .. } | RecordError::Decode(_) => {
            StatusCode::BAD_GATEWAY
        }
    }
}

#[cfg(test)]
#[path = "mod_test.rs"]
mod tests;
