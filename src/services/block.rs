//! Block service: validated CRUD over block records.
//!
//! DESIGN
//! ======
//! One canonical service for every block kind. Creation fills in defaults
//! (origin, 400x300, `z_index` 1, `"Untitled <kind>"`), and both create and
//! update clamp geometry to the canvas bounds before anything is written.
//!
//! ERROR HANDLING
//! ==============
//! Validation runs before the store is touched, so a rejected request never
//! leaves a partial write behind.

use std::sync::Arc;

use canvas::block::{Block, BlockContent, BlockId, DashboardId, PartialBlock};
use canvas::consts::{DEFAULT_BLOCK_HEIGHT, DEFAULT_BLOCK_WIDTH, DEFAULT_Z_INDEX};
use canvas::geom::Geometry;
use serde::Deserialize;
use tracing::info;
use uuid::Uuid;

use crate::services::now_ms;
use crate::store::{BlockRecords, RecordError, RecordStore};

/// Fields accepted when creating a block. Content is flattened, so the wire
/// form is `{"kind": "embed", "url": "…", "title": …, "x": …}`.
#[derive(Debug, Clone, Deserialize)]
pub struct NewBlock {
    #[serde(flatten)]
    pub content: BlockContent,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub x: Option<f64>,
    #[serde(default)]
    pub y: Option<f64>,
    #[serde(default)]
    pub width: Option<f64>,
    #[serde(default)]
    pub height: Option<f64>,
    #[serde(default)]
    pub z_index: Option<i64>,
}

impl NewBlock {
    /// A block with content only; every other field takes its default.
    #[must_use]
    pub fn with_content(content: BlockContent) -> Self {
        Self { content, title: None, x: None, y: None, width: None, height: None, z_index: None }
    }
}

// =============================================================================
// VALIDATION
// =============================================================================

/// Check that content carries a usable payload for its kind.
///
/// # Errors
///
/// Returns `Validation` for an empty payload, or for a URL kind whose payload
/// does not parse as an absolute URL.
pub fn validate_content(content: &BlockContent) -> Result<(), RecordError> {
    let kind = content.kind();
    let payload = content.payload().trim();
    if payload.is_empty() {
        return Err(RecordError::Validation(format!("{} block requires a payload", kind.as_str())));
    }
    if kind.requires_absolute_url() && reqwest::Url::parse(payload).is_err() {
        return Err(RecordError::Validation(format!(
            "{} block requires an absolute URL, got {payload:?}",
            kind.as_str()
        )));
    }
    Ok(())
}

fn ensure_finite(values: &[Option<f64>]) -> Result<(), RecordError> {
    if values.iter().flatten().all(|v| v.is_finite()) {
        Ok(())
    } else {
        Err(RecordError::Validation("block geometry must be finite".into()))
    }
}

// =============================================================================
// SERVICE
// =============================================================================

#[derive(Clone)]
pub struct BlockService {
    store: Arc<dyn RecordStore>,
}

impl BlockService {
    #[must_use]
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        Self { store }
    }

    /// Blocks on a dashboard in ascending stacking order.
    ///
    /// # Errors
    ///
    /// Returns a persistence error if the store fails.
    pub async fn list(&self, dashboard_id: DashboardId) -> Result<Vec<Block>, RecordError> {
        let mut blocks = self.store.list_blocks(dashboard_id).await?;
        blocks.sort_by(Block::cmp_stacking);
        Ok(blocks)
    }

    /// # Errors
    ///
    /// Returns `NotFound` if no block has this id.
    pub async fn get(&self, id: BlockId) -> Result<Block, RecordError> {
        self.store.get_block(id).await
    }

    /// Create a block on a dashboard.
    ///
    /// # Errors
    ///
    /// Returns `Validation` for bad content or non-finite geometry, and
    /// `NotFound` if the dashboard does not exist.
    pub async fn create(&self, dashboard_id: DashboardId, input: NewBlock) -> Result<Block, RecordError> {
        validate_content(&input.content)?;
        ensure_finite(&[input.x, input.y, input.width, input.height])?;

        let kind = input.content.kind();
        let title = input
            .title
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .unwrap_or_else(|| format!("Untitled {}", kind.as_str()));
        let geometry = Geometry::new(
            input.x.unwrap_or(0.0),
            input.y.unwrap_or(0.0),
            input.width.unwrap_or(DEFAULT_BLOCK_WIDTH),
            input.height.unwrap_or(DEFAULT_BLOCK_HEIGHT),
        )
        .clamped();

        let block = Block {
            id: Uuid::new_v4(),
            dashboard_id,
            content: input.content,
            title,
            x: geometry.x,
            y: geometry.y,
            width: geometry.width,
            height: geometry.height,
            z_index: input.z_index.unwrap_or(DEFAULT_Z_INDEX),
            created_at: now_ms(),
        };
        self.store.insert_block(&block).await?;
        info!(block_id = %block.id, %dashboard_id, kind = kind.as_str(), "block created");
        Ok(block)
    }

    /// Apply a sparse update. Geometry is clamped; an empty update returns
    /// the current record unchanged.
    ///
    /// # Errors
    ///
    /// Returns `Validation` for bad content or non-finite geometry, and
    /// `NotFound` for an unknown id.
    pub async fn update(&self, id: BlockId, update: PartialBlock) -> Result<Block, RecordError> {
        if let Some(ref content) = update.content {
            validate_content(content)?;
        }
        if !update.has_finite_geometry() {
            return Err(RecordError::Validation("block geometry must be finite".into()));
        }
        if update.is_empty() {
            return self.store.get_block(id).await;
        }
        self.store.update_block(id, &update.clamped()).await
    }

    /// Delete a block. Returns whether it existed.
    ///
    /// # Errors
    ///
    /// Returns a persistence error if the store fails.
    pub async fn delete(&self, id: BlockId) -> Result<bool, RecordError> {
        let deleted = self.store.delete_block(id).await?;
        if deleted {
            info!(block_id = %id, "block deleted");
        }
        Ok(deleted)
    }
}

#[cfg(test)]
#[path = "block_test.rs"]
mod tests;
