//! Input model: resize corners, keys, UI state, and the gesture state machine.
//!
//! `InteractionState` is the gesture a block's controller is tracking between
//! pointer-down and pointer-up. Each active variant carries what was captured
//! at the start of the gesture so every pointer-move can be computed from the
//! origin rather than accumulated from deltas.

#[cfg(test)]
#[path = "input_test.rs"]
mod input_test;

use serde::{Deserialize, Serialize};

use crate::block::BlockId;
use crate::geom::Point;

/// Which corner handle a resize is dragging.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Corner {
    Nw,
    Ne,
    Sw,
    Se,
}

impl Corner {
    pub const ALL: [Self; 4] = [Self::Nw, Self::Ne, Self::Sw, Self::Se];

    /// Dragging this corner moves the right edge.
    #[must_use]
    pub fn is_east(self) -> bool {
        matches!(self, Self::Ne | Self::Se)
    }

    /// Dragging this corner moves the left edge.
    #[must_use]
    pub fn is_west(self) -> bool {
        matches!(self, Self::Nw | Self::Sw)
    }

    /// Dragging this corner moves the bottom edge.
    #[must_use]
    pub fn is_south(self) -> bool {
        matches!(self, Self::Sw | Self::Se)
    }

    /// Dragging this corner moves the top edge.
    #[must_use]
    pub fn is_north(self) -> bool {
        matches!(self, Self::Nw | Self::Ne)
    }
}

/// A keyboard key as reported by the host (e.g. `"Delete"`, `"Escape"`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Key(pub String);

impl Key {
    /// Keys that delete the selected block.
    #[must_use]
    pub fn is_delete(&self) -> bool {
        matches!(self.0.as_str(), "Delete" | "Backspace")
    }

    #[must_use]
    pub fn is_escape(&self) -> bool {
        self.0 == "Escape"
    }
}

/// Per-view UI state. Never persisted.
#[derive(Debug, Clone, Default)]
pub struct UiState {
    /// The single selected block, if any.
    pub selected_id: Option<BlockId>,
    /// Read-only rendering: no selection, drag, resize or delete.
    pub view_only: bool,
}

/// Gesture tracked by one block's interaction controller.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum InteractionState {
    /// No gesture in progress.
    #[default]
    Idle,
    /// The block follows the pointer.
    Dragging {
        /// Pointer x minus block x at drag start.
        offset_x: f64,
        /// Pointer y minus block y at drag start.
        offset_y: f64,
    },
    /// One corner of the block follows the pointer.
    Resizing {
        /// Which corner handle is being dragged.
        corner: Corner,
        /// Pointer position at resize start.
        start: Point,
        /// Block width at resize start.
        orig_w: f64,
        /// Block height at resize start.
        orig_h: f64,
    },
}

impl InteractionState {
    #[must_use]
    pub fn is_idle(&self) -> bool {
        matches!(self, Self::Idle)
    }
}
