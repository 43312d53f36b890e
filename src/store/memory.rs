//! In-process record store.

use std::collections::HashMap;

use async_trait::async_trait;
use canvas::block::{Block, BlockId, DashboardId, PartialBlock};
use tokio::sync::RwLock;

use super::{BlockRecords, Dashboard, DashboardPatch, DashboardRecords, RecordError};

/// Record store backed by two `RwLock`ed maps. Contents are lost on exit.
#[derive(Default)]
pub struct MemoryStore {
    dashboards: RwLock<HashMap<DashboardId, Dashboard>>,
    blocks: RwLock<HashMap<BlockId, Block>>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl DashboardRecords for MemoryStore {
    async fn list_dashboards(&self) -> Result<Vec<Dashboard>, RecordError> {
        Ok(self.dashboards.read().await.values().cloned().collect())
    }

    async fn get_dashboard(&self, id: DashboardId) -> Result<Dashboard, RecordError> {
        self.dashboards
            .read()
            .await
            .get(&id)
            .cloned()
            .ok_or_else(|| RecordError::dashboard_not_found(id))
    }

    async fn insert_dashboard(&self, dashboard: &Dashboard) -> Result<(), RecordError> {
        self.dashboards.write().await.insert(dashboard.id, dashboard.clone());
        Ok(())
    }

    async fn update_dashboard(
        &self,
        id: DashboardId,
        patch: &DashboardPatch,
        updated_at: i64,
    ) -> Result<Dashboard, RecordError> {
        let mut dashboards = self.dashboards.write().await;
        let dashboard = dashboards.get_mut(&id).ok_or_else(|| RecordError::dashboard_not_found(id))?;
        dashboard.apply(patch, updated_at);
        Ok(dashboard.clone())
    }

    async fn delete_dashboard(&self, id: DashboardId) -> Result<bool, RecordError> {
        // Lock order: dashboards, then blocks.
        let mut dashboards = self.dashboards.write().await;
        if dashboards.remove(&id).is_none() {
            return Ok(false);
        }
        self.blocks.write().await.retain(|_, block| block.dashboard_id != id);
        Ok(true)
    }
}

#[async_trait]
impl BlockRecords for MemoryStore {
    async fn list_blocks(&self, dashboard_id: DashboardId) -> Result<Vec<Block>, RecordError> {
        Ok(self
            .blocks
            .read()
            .await
            .values()
            .filter(|block| block.dashboard_id == dashboard_id)
            .cloned()
            .collect())
    }

    async fn get_block(&self, id: BlockId) -> Result<Block, RecordError> {
        self.blocks
            .read()
            .await
            .get(&id)
            .cloned()
            .ok_or_else(|| RecordError::block_not_found(id))
    }

    async fn insert_block(&self, block: &Block) -> Result<(), RecordError> {
        if !self.dashboards.read().await.contains_key(&block.dashboard_id) {
            return Err(RecordError::dashboard_not_found(block.dashboard_id));
        }
        self.blocks.write().await.insert(block.id, block.clone());
        Ok(())
    }

    async fn update_block(&self, id: BlockId, update: &PartialBlock) -> Result<Block, RecordError> {
        let mut blocks = self.blocks.write().await;
        let block = blocks.get_mut(&id).ok_or_else(|| RecordError::block_not_found(id))?;
        block.apply(update);
        Ok(block.clone())
    }

    async fn delete_block(&self, id: BlockId) -> Result<bool, RecordError> {
        Ok(self.blocks.write().await.remove(&id).is_some())
    }
}

#[cfg(test)]
#[path = "memory_test.rs"]
mod tests;
