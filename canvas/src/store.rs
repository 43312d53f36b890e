//! In-memory store of the blocks on the active dashboard.
//!
//! Data flows into this layer from the record service (snapshots, creates)
//! and from the interaction engine (optimistic geometry updates). Consumers
//! read through `sorted_blocks`, which yields ascending stacking order: the
//! paint order and the iteration order used for persistence and queries.

#[cfg(test)]
#[path = "store_test.rs"]
mod store_test;

use std::collections::HashMap;

use crate::block::{Block, BlockId, PartialBlock};

/// In-memory store of blocks keyed by id.
#[derive(Debug, Clone, Default)]
pub struct BlockStore {
    blocks: HashMap<BlockId, Block>,
}

impl BlockStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self { blocks: HashMap::new() }
    }

    /// Insert or replace a block. An existing block with the same `id` is
    /// overwritten.
    pub fn insert(&mut self, block: Block) {
        self.blocks.insert(block.id, block);
    }

    /// Remove a block by id, returning it if it was present.
    pub fn remove(&mut self, id: &BlockId) -> Option<Block> {
        self.blocks.remove(id)
    }

    #[must_use]
    pub fn get(&self, id: &BlockId) -> Option<&Block> {
        self.blocks.get(id)
    }

    #[must_use]
    pub fn contains(&self, id: &BlockId) -> bool {
        self.blocks.contains_key(id)
    }

    /// Apply a partial update to an existing block. Returns false if the
    /// block doesn't exist.
    pub fn apply_partial(&mut self, id: &BlockId, partial: &PartialBlock) -> bool {
        let Some(block) = self.blocks.get_mut(id) else {
            return false;
        };
        block.apply(partial);
        true
    }

    /// Replace all blocks with a full snapshot.
    pub fn load_snapshot(&mut self, blocks: Vec<Block>) {
        self.blocks.clear();
        for block in blocks {
            self.blocks.insert(block.id, block);
        }
    }

    /// All blocks sorted by `(z_index, created_at, id)`, bottom first.
    #[must_use]
    pub fn sorted_blocks(&self) -> Vec<&Block> {
        let mut blocks: Vec<&Block> = self.blocks.values().collect();
        blocks.sort_by(|a, b| a.cmp_stacking(b));
        blocks
    }

    /// Stacking index for the next block added from the editor.
    ///
    /// This is `len + 1`, not `max + 1`: after deletions two blocks may share
    /// an index, and ties fall back to creation order.
    #[must_use]
    pub fn next_z_index(&self) -> i64 {
        i64::try_from(self.blocks.len()).map_or(i64::MAX, |n| n.saturating_add(1))
    }

    /// Number of blocks currently in the store.
    #[must_use]
    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    /// Returns `true` if the store contains no blocks.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }
}
