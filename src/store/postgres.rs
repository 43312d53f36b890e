//! Postgres record store.
//!
//! Block content is stored as a `kind` column plus a `payload` column; the
//! pair is decoded back into [`BlockContent`] on read and an unknown kind is
//! reported as [`RecordError::Decode`]. Updates read the row `FOR UPDATE`,
//! apply the sparse change in Rust, then write the full row in the same
//! transaction.

use async_trait::async_trait;
use canvas::block::{Block, BlockContent, BlockId, DashboardId, ElementKind, PartialBlock};
use sqlx::PgPool;
use uuid::Uuid;

use super::{BlockRecords, Dashboard, DashboardPatch, DashboardRecords, RecordError};

type DashboardRow = (Uuid, String, bool, Option<Uuid>, Option<String>, i64, i64);
type BlockRow = (Uuid, Uuid, String, String, String, f64, f64, f64, f64, i64, i64);

const DASHBOARD_COLUMNS: &str = "id, title, is_public, owner_id, thumbnail_url, created_at, updated_at";
const BLOCK_COLUMNS: &str = "id, dashboard_id, kind, payload, title, x, y, width, height, z_index, created_at";

#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn dashboard_from_row(row: DashboardRow) -> Dashboard {
    let (id, title, is_public, owner_id, thumbnail_url, created_at, updated_at) = row;
    Dashboard { id, title, is_public, owner_id, thumbnail_url, created_at, updated_at }
}

fn block_from_row(row: BlockRow) -> Result<Block, RecordError> {
    let (id, dashboard_id, kind, payload, title, x, y, width, height, z_index, created_at) = row;
    let kind = ElementKind::parse(&kind).ok_or_else(|| RecordError::Decode(format!("unknown block kind: {kind}")))?;
    Ok(Block {
        id,
        dashboard_id,
        content: BlockContent::from_parts(kind, payload),
        title,
        x,
        y,
        width,
        height,
        z_index,
        created_at,
    })
}

// =============================================================================
// DASHBOARDS
// =============================================================================

#[async_trait]
impl DashboardRecords for PgStore {
    async fn list_dashboards(&self) -> Result<Vec<Dashboard>, RecordError> {
        let rows = sqlx::query_as::<_, DashboardRow>(&format!("SELECT {DASHBOARD_COLUMNS} FROM dashboards"))
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.into_iter().map(dashboard_from_row).collect())
    }

    async fn get_dashboard(&self, id: DashboardId) -> Result<Dashboard, RecordError> {
        sqlx::query_as::<_, DashboardRow>(&format!("SELECT {DASHBOARD_COLUMNS} FROM dashboards WHERE id = $1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .map(dashboard_from_row)
            .ok_or_else(|| RecordError::dashboard_not_found(id))
    }

    async fn insert_dashboard(&self, dashboard: &Dashboard) -> Result<(), RecordError> {
        sqlx::query(
            "INSERT INTO dashboards (id, title, is_public, owner_id, thumbnail_url, created_at, updated_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7)",
        )
        .bind(dashboard.id)
        .bind(&dashboard.title)
        .bind(dashboard.is_public)
        .bind(dashboard.owner_id)
        .bind(&dashboard.thumbnail_url)
        .bind(dashboard.created_at)
        .bind(dashboard.updated_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn update_dashboard(
        &self,
        id: DashboardId,
        patch: &DashboardPatch,
        updated_at: i64,
    ) -> Result<Dashboard, RecordError> {
        let mut tx = self.pool.begin().await?;
        let row = sqlx::query_as::<_, DashboardRow>(&format!(
            "SELECT {DASHBOARD_COLUMNS} FROM dashboards WHERE id = $1 FOR UPDATE"
        ))
        .bind(id)
        .fetch_optional(tx.as_mut())
        .await?
        .ok_or_else(|| RecordError::dashboard_not_found(id))?;

        let mut dashboard = dashboard_from_row(row);
        dashboard.apply(patch, updated_at);

        sqlx::query("UPDATE dashboards SET title = $2, is_public = $3, thumbnail_url = $4, updated_at = $5 WHERE id = $1")
            .bind(id)
            .bind(&dashboard.title)
            .bind(dashboard.is_public)
            .bind(&dashboard.thumbnail_url)
            .bind(dashboard.updated_at)
            .execute(tx.as_mut())
            .await?;
        tx.commit().await?;
        Ok(dashboard)
    }

    async fn delete_dashboard(&self, id: DashboardId) -> Result<bool, RecordError> {
        // blocks.dashboard_id is ON DELETE CASCADE.
        let result = sqlx::query("DELETE FROM dashboards WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

// =============================================================================
// BLOCKS
// =============================================================================

#[async_trait]
impl BlockRecords for PgStore {
    async fn list_blocks(&self, dashboard_id: DashboardId) -> Result<Vec<Block>, RecordError> {
        let rows = sqlx::query_as::<_, BlockRow>(&format!("SELECT {BLOCK_COLUMNS} FROM blocks WHERE dashboard_id = $1"))
            .bind(dashboard_id)
            .fetch_all(&self.pool)
            .await?;
        rows.into_iter().map(block_from_row).collect()
    }

    async fn get_block(&self, id: BlockId) -> Result<Block, RecordError> {
        let row = sqlx::query_as::<_, BlockRow>(&format!("SELECT {BLOCK_COLUMNS} FROM blocks WHERE id = $1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| RecordError::block_not_found(id))?;
        block_from_row(row)
    }

    async fn insert_block(&self, block: &Block) -> Result<(), RecordError> {
        let exists = sqlx::query_scalar::<_, bool>("SELECT EXISTS (SELECT 1 FROM dashboards WHERE id = $1)")
            .bind(block.dashboard_id)
            .fetch_one(&self.pool)
            .await?;
        if !exists {
            return Err(RecordError::dashboard_not_found(block.dashboard_id));
        }

        sqlx::query(
            "INSERT INTO blocks (id, dashboard_id, kind, payload, title, x, y, width, height, z_index, created_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)",
        )
        .bind(block.id)
        .bind(block.dashboard_id)
        .bind(block.kind().as_str())
        .bind(block.content.payload())
        .bind(&block.title)
        .bind(block.x)
        .bind(block.y)
        .bind(block.width)
        .bind(block.height)
        .bind(block.z_index)
        .bind(block.created_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn update_block(&self, id: BlockId, update: &PartialBlock) -> Result<Block, RecordError> {
        let mut tx = self.pool.begin().await?;
        let row = sqlx::query_as::<_, BlockRow>(&format!("SELECT {BLOCK_COLUMNS} FROM blocks WHERE id = $1 FOR UPDATE"))
            .bind(id)
            .fetch_optional(tx.as_mut())
            .await?
            .ok_or_else(|| RecordError::block_not_found(id))?;

        let mut block = block_from_row(row)?;
        block.apply(update);

        sqlx::query(
            "UPDATE blocks
             SET kind = $2, payload = $3, title = $4, x = $5, y = $6, width = $7, height = $8, z_index = $9
             WHERE id = $1",
        )
        .bind(id)
        .bind(block.kind().as_str())
        .bind(block.content.payload())
        .bind(&block.title)
        .bind(block.x)
        .bind(block.y)
        .bind(block.width)
        .bind(block.height)
        .bind(block.z_index)
        .execute(tx.as_mut())
        .await?;
        tx.commit().await?;
        Ok(block)
    }

    async fn delete_block(&self, id: BlockId) -> Result<bool, RecordError> {
        let result = sqlx::query("DELETE FROM blocks WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
#[path = "postgres_test.rs"]
mod tests;
