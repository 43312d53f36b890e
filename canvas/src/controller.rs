//! Per-block interaction controller.
//!
//! One controller exists for each block on the canvas. It translates pointer
//! positions into new geometry for that block only and knows nothing about
//! sibling blocks or selection. Its effects are observed solely through the
//! returned [`Gesture`]s; the only state it keeps is the current interaction.

#[cfg(test)]
#[path = "controller_test.rs"]
mod controller_test;

use crate::block::BlockId;
use crate::geom::{Geometry, Point, clamp_height, clamp_position, clamp_width};
use crate::input::{Corner, InteractionState};

/// Geometry change produced by a pointer move.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Gesture {
    /// New top-left corner, already clamped to the origin.
    Moved { x: f64, y: f64 },
    /// New size, already clamped to the block minimums.
    Resized { width: f64, height: f64 },
}

/// Drag/resize state machine for a single block.
#[derive(Debug, Clone)]
pub struct InteractionController {
    block_id: BlockId,
    state: InteractionState,
}

impl InteractionController {
    #[must_use]
    pub fn new(block_id: BlockId) -> Self {
        Self { block_id, state: InteractionState::Idle }
    }

    #[must_use]
    pub fn block_id(&self) -> BlockId {
        self.block_id
    }

    #[must_use]
    pub fn state(&self) -> InteractionState {
        self.state
    }

    #[must_use]
    pub fn is_idle(&self) -> bool {
        self.state.is_idle()
    }

    /// Start dragging from `pointer`. Returns false (and changes nothing) in
    /// view-only mode or while another gesture is active.
    pub fn begin_drag(&mut self, pointer: Point, geometry: &Geometry, view_only: bool) -> bool {
        if view_only || !self.state.is_idle() {
            return false;
        }
        self.state = InteractionState::Dragging {
            offset_x: pointer.x - geometry.x,
            offset_y: pointer.y - geometry.y,
        };
        true
    }

    /// Start resizing from `pointer` by the given corner. Same rejection
    /// rules as [`Self::begin_drag`].
    pub fn begin_resize(&mut self, pointer: Point, corner: Corner, geometry: &Geometry, view_only: bool) -> bool {
        if view_only || !self.state.is_idle() {
            return false;
        }
        self.state = InteractionState::Resizing {
            corner,
            start: pointer,
            orig_w: geometry.width,
            orig_h: geometry.height,
        };
        true
    }

    /// Compute the geometry change for a pointer move. `None` when idle.
    #[must_use]
    pub fn on_pointer_move(&self, pointer: Point) -> Option<Gesture> {
        match self.state {
            InteractionState::Idle => None,
            InteractionState::Dragging { offset_x, offset_y } => Some(Gesture::Moved {
                x: clamp_position(pointer.x - offset_x),
                y: clamp_position(pointer.y - offset_y),
            }),
            InteractionState::Resizing { corner, start, orig_w, orig_h } => {
                let dx = pointer.x - start.x;
                let dy = pointer.y - start.y;
                let width = if corner.is_west() { orig_w - dx } else { orig_w + dx };
                let height = if corner.is_north() { orig_h - dy } else { orig_h + dy };
                Some(Gesture::Resized { width: clamp_width(width), height: clamp_height(height) })
            }
        }
    }

    /// Return to idle from any state.
    pub fn end(&mut self) {
        self.state = InteractionState::Idle;
    }

    /// Request deletion of this block. Only honored for the selected block
    /// outside view-only mode.
    #[must_use]
    pub fn delete(&self, selected: bool, view_only: bool) -> Option<BlockId> {
        (selected && !view_only).then_some(self.block_id)
    }
}
