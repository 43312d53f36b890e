//! JSON API over the dashboard and block record services.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::Json;
use canvas::block::{Block, PartialBlock};
use serde::Deserialize;
use uuid::Uuid;

use crate::routes::ApiError;
use crate::routes::extract::{ApiJson, ApiPath, ApiQuery};
use crate::services::block::NewBlock;
use crate::services::dashboard::NewDashboard;
use crate::state::AppState;
use crate::store::{Dashboard, DashboardPatch, RecordError};

#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    /// Case-insensitive title filter.
    pub q: Option<String>,
}

// =============================================================================
// DASHBOARDS
// =============================================================================

/// `GET /api/dashboards?q=`: list, most recently updated first.
pub async fn list_dashboards(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<ListQuery>,
) -> Result<Json<Vec<Dashboard>>, ApiError> {
    let rows = match query.q.as_deref() {
        Some(term) => state.dashboards.search(term).await?,
        None => state.dashboards.list().await?,
    };
    Ok(Json(rows))
}

/// `POST /api/dashboards`
pub async fn create_dashboard(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<NewDashboard>,
) -> Result<(StatusCode, Json<Dashboard>), ApiError> {
    let dashboard = state.dashboards.create(body).await?;
    Ok((StatusCode::CREATED, Json(dashboard)))
}

/// `GET /api/dashboards/{id}`
pub async fn get_dashboard(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Uuid>,
) -> Result<Json<Dashboard>, ApiError> {
    Ok(Json(state.dashboards.get(id).await?))
}

/// `PATCH /api/dashboards/{id}`
pub async fn update_dashboard(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(patch): ApiJson<DashboardPatch>,
) -> Result<Json<Dashboard>, ApiError> {
    Ok(Json(state.dashboards.update(id, patch).await?))
}

/// `DELETE /api/dashboards/{id}`: also removes its blocks.
pub async fn delete_dashboard(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Uuid>,
) -> Result<StatusCode, ApiError> {
    if state.dashboards.delete(id).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(RecordError::dashboard_not_found(id).into())
    }
}

/// `POST /api/dashboards/{id}/duplicate`
pub async fn duplicate_dashboard(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Uuid>,
) -> Result<(StatusCode, Json<Dashboard>), ApiError> {
    let copy = state.dashboards.duplicate(id).await?;
    Ok((StatusCode::CREATED, Json(copy)))
}

// =============================================================================
// BLOCKS
// =============================================================================

/// `GET /api/dashboards/{id}/blocks`: ascending stacking order.
pub async fn list_blocks(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Uuid>,
) -> Result<Json<Vec<Block>>, ApiError> {
    // An unknown dashboard is a 404, not an empty list.
    state.dashboards.get(id).await?;
    Ok(Json(state.blocks.list(id).await?))
}

/// `POST /api/dashboards/{id}/blocks`
pub async fn create_block(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(body): ApiJson<NewBlock>,
) -> Result<(StatusCode, Json<Block>), ApiError> {
    let block = state.blocks.create(id, body).await?;
    Ok((StatusCode::CREATED, Json(block)))
}

/// `GET /api/blocks/{id}`
pub async fn get_block(State(state): State<AppState>, ApiPath(id): ApiPath<Uuid>) -> Result<Json<Block>, ApiError> {
    Ok(Json(state.blocks.get(id).await?))
}

/// `PATCH /api/blocks/{id}`
pub async fn update_block(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(update): ApiJson<PartialBlock>,
) -> Result<Json<Block>, ApiError> {
    Ok(Json(state.blocks.update(id, update).await?))
}

/// `DELETE /api/blocks/{id}`
pub async fn delete_block(State(state): State<AppState>, ApiPath(id): ApiPath<Uuid>) -> Result<StatusCode, ApiError> {
    if state.blocks.delete(id).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(RecordError::block_not_found(id).into())
    }
}

#[cfg(test)]
#[path = "dashboards_test.rs"]
mod tests;
