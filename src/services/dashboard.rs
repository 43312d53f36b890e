//! Dashboard service: list, search, CRUD, visibility and duplication.
//!
//! DESIGN
//! ======
//! The service assigns ids and timestamps and applies title defaults; the
//! store persists what it is handed. `updated_at` is refreshed on every
//! update but never moves backwards, even if the wall clock does.

use std::sync::Arc;

use canvas::block::DashboardId;
use serde::Deserialize;
use tracing::info;
use uuid::Uuid;

use crate::services::now_ms;
use crate::store::{Dashboard, DashboardPatch, DashboardRecords, RecordError, RecordStore};

pub const DEFAULT_DASHBOARD_TITLE: &str = "Untitled Dashboard";
const COPY_SUFFIX: &str = " (Copy)";

/// Fields accepted when creating a dashboard.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewDashboard {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub is_public: bool,
    #[serde(default)]
    pub owner_id: Option<Uuid>,
    #[serde(default)]
    pub thumbnail_url: Option<String>,
}

#[derive(Clone)]
pub struct DashboardService {
    store: Arc<dyn RecordStore>,
}

impl DashboardService {
    #[must_use]
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        Self { store }
    }

    /// All dashboards, most recently updated first.
    ///
    /// # Errors
    ///
    /// Returns a persistence error if the store fails.
    pub async fn list(&self) -> Result<Vec<Dashboard>, RecordError> {
        let mut dashboards = self.store.list_dashboards().await?;
        dashboards.sort_by(|a, b| b.updated_at.cmp(&a.updated_at).then_with(|| a.id.cmp(&b.id)));
        Ok(dashboards)
    }

    /// Dashboards whose title contains `term`, ignoring case. An empty term
    /// matches everything.
    ///
    /// # Errors
    ///
    /// Returns a persistence error if the store fails.
    pub async fn search(&self, term: &str) -> Result<Vec<Dashboard>, RecordError> {
        let needle = term.trim().to_lowercase();
        let dashboards = self.list().await?;
        if needle.is_empty() {
            return Ok(dashboards);
        }
        Ok(dashboards
            .into_iter()
            .filter(|d| d.title.to_lowercase().contains(&needle))
            .collect())
    }

    /// # Errors
    ///
    /// Returns `NotFound` if no dashboard has this id.
    pub async fn get(&self, id: DashboardId) -> Result<Dashboard, RecordError> {
        self.store.get_dashboard(id).await
    }

    /// Create a dashboard. A missing or blank title becomes
    /// `"Untitled Dashboard"`.
    ///
    /// # Errors
    ///
    /// Returns a persistence error if the insert fails.
    pub async fn create(&self, input: NewDashboard) -> Result<Dashboard, RecordError> {
        let now = now_ms();
        let title = input
            .title
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .unwrap_or_else(|| DEFAULT_DASHBOARD_TITLE.to_string());
        let dashboard = Dashboard {
            id: Uuid::new_v4(),
            title,
            is_public: input.is_public,
            owner_id: input.owner_id,
            thumbnail_url: input.thumbnail_url,
            created_at: now,
            updated_at: now,
        };
        self.store.insert_dashboard(&dashboard).await?;
        info!(dashboard_id = %dashboard.id, title = %dashboard.title, "dashboard created");
        Ok(dashboard)
    }

    /// Apply a sparse update and refresh `updated_at`.
    ///
    /// # Errors
    ///
    /// Returns `Validation` for a blank title and `NotFound` for an unknown id.
    pub async fn update(&self, id: DashboardId, mut patch: DashboardPatch) -> Result<Dashboard, RecordError> {
        if let Some(ref title) = patch.title {
            let trimmed = title.trim();
            if trimmed.is_empty() {
                return Err(RecordError::Validation("dashboard title must not be empty".into()));
            }
            patch.title = Some(trimmed.to_string());
        }
        let current = self.store.get_dashboard(id).await?;
        let updated_at = now_ms().max(current.updated_at);
        self.store.update_dashboard(id, &patch, updated_at).await
    }

    /// # Errors
    ///
    /// Returns `NotFound` for an unknown id.
    pub async fn set_visibility(&self, id: DashboardId, is_public: bool) -> Result<Dashboard, RecordError> {
        self.update(id, DashboardPatch { is_public: Some(is_public), ..Default::default() })
            .await
    }

    /// Create a private copy titled `"<title> (Copy)"`. Blocks are not copied.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` for an unknown id.
    pub async fn duplicate(&self, id: DashboardId) -> Result<Dashboard, RecordError> {
        let source = self.store.get_dashboard(id).await?;
        self.create(NewDashboard {
            title: Some(format!("{}{COPY_SUFFIX}", source.title)),
            is_public: false,
            owner_id: source.owner_id,
            thumbnail_url: source.thumbnail_url,
        })
        .await
    }

    /// Delete a dashboard and its blocks. Returns whether it existed.
    ///
    /// # Errors
    ///
    /// Returns a persistence error if the store fails.
    pub async fn delete(&self, id: DashboardId) -> Result<bool, RecordError> {
        let deleted = self.store.delete_dashboard(id).await?;
        if deleted {
            info!(dashboard_id = %id, "dashboard deleted");
        }
        Ok(deleted)
    }
}

#[cfg(test)]
#[path = "dashboard_test.rs"]
mod tests;
