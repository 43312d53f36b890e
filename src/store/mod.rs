//! Record store: durable home of dashboards and blocks.
//!
//! DESIGN
//! ======
//! The record services never talk to a backend directly. They hold an
//! `Arc<dyn RecordStore>` chosen once at startup from [`crate::config`]:
//!
//! - [`memory::MemoryStore`]: process-local maps, used in development and tests
//! - [`postgres::PgStore`]: SQLx Postgres with embedded migrations
//! - [`hosted::HostedStore`]: JSON over HTTP to a hosted record service
//!
//! Stores persist exactly what they are given. Defaults, validation, clamping
//! and ordering belong to the services; stores return rows unordered.
//!
//! ERROR HANDLING
//! ==============
//! Every backend failure maps into [`RecordError`]. Persistence failures are
//! retryable; validation and not-found are not.

pub mod hosted;
pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use canvas::block::{Block, BlockId, DashboardId, PartialBlock};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// =============================================================================
// RECORD TYPES
// =============================================================================

/// A dashboard record. Blocks reference it by `dashboard_id`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dashboard {
    pub id: DashboardId,
    pub title: String,
    pub is_public: bool,
    pub owner_id: Option<Uuid>,
    pub thumbnail_url: Option<String>,
    /// Milliseconds since the Unix epoch.
    pub created_at: i64,
    /// Milliseconds since the Unix epoch. Never decreases.
    pub updated_at: i64,
}

/// Sparse dashboard update.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DashboardPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_public: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thumbnail_url: Option<String>,
}

impl Dashboard {
    /// Apply the present fields of `patch` and stamp `updated_at`.
    pub fn apply(&mut self, patch: &DashboardPatch, updated_at: i64) {
        if let Some(ref title) = patch.title {
            self.title.clone_from(title);
        }
        if let Some(is_public) = patch.is_public {
            self.is_public = is_public;
        }
        if let Some(ref url) = patch.thumbnail_url {
            self.thumbnail_url = Some(url.clone());
        }
        self.updated_at = updated_at;
    }
}

// =============================================================================
// ERRORS
// =============================================================================

#[derive(Debug, thiserror::Error)]
pub enum RecordError {
    #[error("validation failed: {0}")]
    Validation(String),
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: Uuid },
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("record service request failed: {0}")]
    Remote(#[from] reqwest::Error),
    #[error("record service returned {status}: {body}")]
    RemoteStatus { status: u16, body: String },
    #[error("malformed record: {0}")]
    Decode(String),
}

impl RecordError {
    pub fn dashboard_not_found(id: DashboardId) -> Self {
        Self::NotFound { entity: "dashboard", id }
    }

    pub fn block_not_found(id: BlockId) -> Self {
        Self::NotFound { entity: "block", id }
    }

    /// Stable wire code for clients.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Validation(_) => "E_VALIDATION",
            Self::NotFound { .. } => "E_NOT_FOUND",
            Self::Database(_) | Self::Remote(_) | Self::RemoteStatus { .. } | Self::Decode(_) => "E_PERSISTENCE",
        }
    }

    /// Whether repeating the same call may succeed.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Database(_) | Self::Remote(_) | Self::RemoteStatus { .. } | Self::Decode(_))
    }
}

// =============================================================================
// TRAITS
// =============================================================================

#[async_trait]
pub trait DashboardRecords: Send + Sync {
    async fn list_dashboards(&self) -> Result<Vec<Dashboard>, RecordError>;
    async fn get_dashboard(&self, id: DashboardId) -> Result<Dashboard, RecordError>;
    async fn insert_dashboard(&self, dashboard: &Dashboard) -> Result<(), RecordError>;
    async fn update_dashboard(
        &self,
        id: DashboardId,
        patch: &DashboardPatch,
        updated_at: i64,
    ) -> Result<Dashboard, RecordError>;
    /// Delete a dashboard and every block on it. `false` if it did not exist.
    async fn delete_dashboard(&self, id: DashboardId) -> Result<bool, RecordError>;
}

#[async_trait]
pub trait BlockRecords: Send + Sync {
    async fn list_blocks(&self, dashboard_id: DashboardId) -> Result<Vec<Block>, RecordError>;
    async fn get_block(&self, id: BlockId) -> Result<Block, RecordError>;
    async fn insert_block(&self, block: &Block) -> Result<(), RecordError>;
    async fn update_block(&self, id: BlockId, update: &PartialBlock) -> Result<Block, RecordError>;
    async fn delete_block(&self, id: BlockId) -> Result<bool, RecordError>;
}

/// Both record families behind one handle.
pub trait RecordStore: DashboardRecords + BlockRecords {}

impl<T: DashboardRecords + BlockRecords> RecordStore for T {}

#[cfg(test)]
#[path = "mod_test.rs"]
mod tests;
