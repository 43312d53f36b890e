//! Hit testing: which block, or which corner handle of the selected block,
//! lies under a point.

#[cfg(test)]
#[path = "hit_test.rs"]
mod hit_test;

use crate::block::BlockId;
use crate::consts::HANDLE_RADIUS_PX;
use crate::geom::{Geometry, Point};
use crate::input::Corner;
use crate::store::BlockStore;

/// Which part of a block was hit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HitPart {
    Body,
    ResizeHandle(Corner),
}

/// Result of a hit test.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Hit {
    pub block_id: BlockId,
    pub part: HitPart,
}

/// Canvas position of a corner handle.
#[must_use]
pub fn corner_point(geometry: &Geometry, corner: Corner) -> Point {
    let x = if corner.is_east() { geometry.x + geometry.width } else { geometry.x };
    let y = if corner.is_south() { geometry.y + geometry.height } else { geometry.y };
    Point::new(x, y)
}

/// Test which block (if any) is under `pt`.
///
/// Resize handles only exist on the selected block and only outside view-only
/// mode, so they are checked first; then bodies from the topmost down.
#[must_use]
pub fn hit_test(pt: Point, doc: &BlockStore, selected_id: Option<BlockId>, view_only: bool) -> Option<Hit> {
    if !view_only {
        if let Some(block) = selected_id.and_then(|id| doc.get(&id)) {
            let geometry = block.geometry();
            for corner in Corner::ALL {
                let handle = corner_point(&geometry, corner);
                if (pt.x - handle.x).abs() <= HANDLE_RADIUS_PX && (pt.y - handle.y).abs() <= HANDLE_RADIUS_PX {
                    return Some(Hit { block_id: block.id, part: HitPart::ResizeHandle(corner) });
                }
            }
        }
    }

    doc.sorted_blocks()
        .into_iter()
        .rev()
        .find(|block| block.geometry().contains(pt))
        .map(|block| Hit { block_id: block.id, part: HitPart::Body })
}
