//! Page routes. Each serves the HTML shell; the client reads the path and
//! renders the list, editor or read-only view.
//!
//! `/dashboard/new` is resolved here rather than in the client so that the
//! create happens once and the browser lands on the new id's own route.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Redirect, Response};
use tracing::{info, warn};
use uuid::Uuid;

use crate::routes::status_for;
use crate::services::editor::{self, Resolved};
use crate::state::AppState;
use crate::store::RecordError;

/// `GET /`: dashboard list.
pub async fn list_page(State(state): State<AppState>) -> Html<String> {
    Html(state.index_html.to_string())
}

/// `GET /dashboard/{id}`: editor. `new` creates and redirects.
pub async fn editor_page(State(state): State<AppState>, Path(target): Path<String>) -> Response {
    match editor::resolve(&state.dashboards, &target).await {
        Ok(Resolved::Redirect(id)) => {
            info!(dashboard_id = %id, "redirecting to new dashboard");
            Redirect::to(&editor_path(id)).into_response()
        }
        Ok(Resolved::Existing(_)) => Html(state.index_html.to_string()).into_response(),
        Err(e) => shell_with_error(&state, &target, &e),
    }
}

/// `GET /dashboard/{id}/view`: read-only view. Never creates.
pub async fn view_page(State(state): State<AppState>, Path(target): Path<String>) -> Response {
    let lookup = match Uuid::parse_str(&target) {
        Ok(id) => state.dashboards.get(id).await.map(|_| ()),
        Err(_) => Err(RecordError::dashboard_not_found(Uuid::nil())),
    };
    match lookup {
        Ok(()) => Html(state.index_html.to_string()).into_response(),
        Err(e) => shell_with_error(&state, &target, &e),
    }
}

#[must_use]
pub fn editor_path(id: Uuid) -> String {
    format!("/dashboard/{id}")
}

/// The shell still renders on failure so the client can show its error
/// state and a retry; the status tells it which.
fn shell_with_error(state: &AppState, target: &str, err: &RecordError) -> Response {
    let status = status_for(err);
    if status == StatusCode::NOT_FOUND {
        info!(route_id = target, "dashboard page not found");
    } else {
        warn!(route_id = target, error = %err, "dashboard page load failed");
    }
    (status, Html(state.index_html.to_string())).into_response()
}

#[cfg(test)]
#[path = "pages_test.rs"]
mod tests;
