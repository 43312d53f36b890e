//! Canvas engine: the block store, single selection, and gesture routing.
//!
//! The engine owns one [`InteractionController`] per block and routes pointer
//! events to them. Geometry changes are applied to the store immediately
//! (optimistic) and reported as [`Action`]s; the host persists those actions
//! and feeds confirmed server state back through the `apply_*` inputs.

#[cfg(test)]
#[path = "engine_test.rs"]
mod engine_test;

use std::collections::HashMap;

use crate::block::{Block, BlockId, PartialBlock};
use crate::controller::{Gesture, InteractionController};
use crate::geom::Point;
use crate::hit::{self, HitPart};
use crate::input::{Corner, Key, UiState};
use crate::store::BlockStore;

/// Actions returned from input handlers for the host to process.
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    /// Selection moved to a block, or was cleared.
    SelectionChanged(Option<BlockId>),
    /// A block was moved locally; the host should persist the position.
    BlockMoved { id: BlockId, x: f64, y: f64 },
    /// A block was resized locally; the host should persist the size.
    BlockResized { id: BlockId, width: f64, height: f64 },
    /// The user asked to delete a block. The block stays in the store until
    /// the host confirms with [`Engine::apply_delete`].
    DeleteRequested { id: BlockId },
}

/// Canvas state for one dashboard view.
#[derive(Debug, Default)]
pub struct Engine {
    pub doc: BlockStore,
    pub ui: UiState,
    controllers: HashMap<BlockId, InteractionController>,
}

impl Engine {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// An engine that renders but never mutates.
    #[must_use]
    pub fn view_only() -> Self {
        let mut engine = Self::new();
        engine.ui.view_only = true;
        engine
    }

    // --- Data inputs ---

    /// Hydrate the canvas from a server snapshot.
    pub fn load_snapshot(&mut self, blocks: Vec<Block>) {
        self.doc.load_snapshot(blocks);
        self.controllers = self
            .doc
            .sorted_blocks()
            .into_iter()
            .map(|b| (b.id, InteractionController::new(b.id)))
            .collect();
        if let Some(id) = self.ui.selected_id {
            if !self.doc.contains(&id) {
                self.ui.selected_id = None;
            }
        }
    }

    /// A block was created.
    pub fn apply_create(&mut self, block: Block) {
        self.controllers
            .entry(block.id)
            .or_insert_with(|| InteractionController::new(block.id));
        self.doc.insert(block);
    }

    /// A block was updated. Returns false if the block is unknown.
    pub fn apply_update(&mut self, id: &BlockId, fields: &PartialBlock) -> bool {
        self.doc.apply_partial(id, fields)
    }

    /// A block was deleted.
    pub fn apply_delete(&mut self, id: &BlockId) -> Option<Block> {
        self.controllers.remove(id);
        if self.ui.selected_id.as_ref() == Some(id) {
            self.ui.selected_id = None;
        }
        self.doc.remove(id)
    }

    /// Switch view-only mode. Entering it ends any gesture and clears the
    /// selection.
    pub fn set_view_only(&mut self, view_only: bool) -> Vec<Action> {
        self.ui.view_only = view_only;
        if !view_only {
            return Vec::new();
        }
        self.end();
        self.clear_selection()
    }

    // --- Selection ---

    /// Select a block. No-op when it is already selected, unknown, or the
    /// canvas is view-only.
    pub fn select_block(&mut self, id: BlockId) -> Vec<Action> {
        if self.ui.view_only || self.ui.selected_id == Some(id) || !self.doc.contains(&id) {
            return Vec::new();
        }
        self.ui.selected_id = Some(id);
        vec![Action::SelectionChanged(Some(id))]
    }

    /// Click on the canvas background.
    pub fn click_empty(&mut self) -> Vec<Action> {
        self.clear_selection()
    }

    /// Pointer down anywhere outside the canvas.
    pub fn click_outside(&mut self) -> Vec<Action> {
        self.clear_selection()
    }

    fn clear_selection(&mut self) -> Vec<Action> {
        if self.ui.selected_id.take().is_some() {
            vec![Action::SelectionChanged(None)]
        } else {
            Vec::new()
        }
    }

    // --- Gestures ---

    /// Start dragging a block. Selects it first.
    pub fn begin_drag(&mut self, id: BlockId, pointer: Point) -> Vec<Action> {
        if self.ui.view_only || self.is_interacting() {
            return Vec::new();
        }
        let Some(geometry) = self.doc.get(&id).map(Block::geometry) else {
            return Vec::new();
        };
        let actions = self.select_block(id);
        let view_only = self.ui.view_only;
        if let Some(controller) = self.controllers.get_mut(&id) {
            controller.begin_drag(pointer, &geometry, view_only);
        }
        actions
    }

    /// Start resizing a block by one of its corners. Returns whether the
    /// resize began. Handles exist only on the selected block.
    pub fn begin_resize(&mut self, id: BlockId, pointer: Point, corner: Corner) -> bool {
        if self.ui.selected_id != Some(id) || self.is_interacting() {
            return false;
        }
        let Some(geometry) = self.doc.get(&id).map(Block::geometry) else {
            return false;
        };
        let view_only = self.ui.view_only;
        self.controllers
            .get_mut(&id)
            .is_some_and(|c| c.begin_resize(pointer, corner, &geometry, view_only))
    }

    /// Feed a pointer move to the active gesture, if any.
    pub fn pointer_move(&mut self, pointer: Point) -> Vec<Action> {
        let Some(controller) = self.controllers.values().find(|c| !c.is_idle()) else {
            return Vec::new();
        };
        let id = controller.block_id();
        let Some(gesture) = controller.on_pointer_move(pointer) else {
            return Vec::new();
        };

        match gesture {
            Gesture::Moved { x, y } => {
                self.doc.apply_partial(&id, &PartialBlock::moved(x, y));
                vec![Action::BlockMoved { id, x, y }]
            }
            Gesture::Resized { width, height } => {
                self.doc.apply_partial(&id, &PartialBlock::resized(width, height));
                vec![Action::BlockResized { id, width, height }]
            }
        }
    }

    /// End every gesture. Pending persistence is the host's concern and is
    /// not affected.
    pub fn end(&mut self) {
        for controller in self.controllers.values_mut() {
            controller.end();
        }
    }

    // --- Deletion ---

    /// Request deletion of the selected block and clear the selection.
    pub fn delete_selected(&mut self) -> Vec<Action> {
        match self.ui.selected_id {
            Some(id) => self.delete_block(id),
            None => Vec::new(),
        }
    }

    /// Request deletion of `id`. Only the selected block can be deleted.
    pub fn delete_block(&mut self, id: BlockId) -> Vec<Action> {
        let selected = self.ui.selected_id == Some(id);
        let Some(target) = self
            .controllers
            .get(&id)
            .and_then(|c| c.delete(selected, self.ui.view_only))
        else {
            return Vec::new();
        };
        let mut actions = vec![Action::DeleteRequested { id: target }];
        actions.extend(self.clear_selection());
        actions
    }

    // --- Raw input ---

    /// Pointer pressed. `inside_canvas` is false when the press landed
    /// outside the canvas region entirely.
    pub fn on_pointer_down(&mut self, pointer: Point, inside_canvas: bool) -> Vec<Action> {
        if !inside_canvas {
            return self.click_outside();
        }
        match hit::hit_test(pointer, &self.doc, self.ui.selected_id, self.ui.view_only) {
            Some(h) => match h.part {
                HitPart::ResizeHandle(corner) => {
                    self.begin_resize(h.block_id, pointer, corner);
                    Vec::new()
                }
                HitPart::Body => self.begin_drag(h.block_id, pointer),
            },
            None => self.click_empty(),
        }
    }

    pub fn on_pointer_move(&mut self, pointer: Point) -> Vec<Action> {
        self.pointer_move(pointer)
    }

    pub fn on_pointer_up(&mut self) {
        self.end();
    }

    pub fn on_key_down(&mut self, key: &Key) -> Vec<Action> {
        if key.is_delete() {
            self.delete_selected()
        } else if key.is_escape() {
            self.click_empty()
        } else {
            Vec::new()
        }
    }

    // --- Queries ---

    /// The currently selected block, if any.
    #[must_use]
    pub fn selection(&self) -> Option<BlockId> {
        self.ui.selected_id
    }

    #[must_use]
    pub fn is_view_only(&self) -> bool {
        self.ui.view_only
    }

    /// Whether any block is mid-drag or mid-resize.
    #[must_use]
    pub fn is_interacting(&self) -> bool {
        self.controllers.values().any(|c| !c.is_idle())
    }

    /// The controller for a block.
    #[must_use]
    pub fn controller(&self, id: &BlockId) -> Option<&InteractionController> {
        self.controllers.get(id)
    }

    /// Look up a block by id.
    #[must_use]
    pub fn block(&self, id: &BlockId) -> Option<&Block> {
        self.doc.get(id)
    }

    /// All blocks in ascending stacking order.
    #[must_use]
    pub fn blocks(&self) -> Vec<&Block> {
        self.doc.sorted_blocks()
    }
}
