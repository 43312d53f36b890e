//! Shared numeric constants for the canvas crate.

// ── Geometry limits ─────────────────────────────────────────────

/// Smallest width a block may be resized to, in canvas pixels.
pub const MIN_BLOCK_WIDTH: f64 = 200.0;

/// Smallest height a block may be resized to, in canvas pixels.
pub const MIN_BLOCK_HEIGHT: f64 = 150.0;

// ── Defaults for new blocks ─────────────────────────────────────

/// Width assigned when a block is created without one.
pub const DEFAULT_BLOCK_WIDTH: f64 = 400.0;

/// Height assigned when a block is created without one.
pub const DEFAULT_BLOCK_HEIGHT: f64 = 300.0;

/// Stacking index assigned when a block is created without one.
pub const DEFAULT_Z_INDEX: i64 = 1;

/// Where the editor drops newly added blocks (both axes).
pub const NEW_BLOCK_OFFSET: f64 = 100.0;

// ── Hit-testing ─────────────────────────────────────────────────

/// Hit slop in pixels around each corner resize handle.
pub const HANDLE_RADIUS_PX: f64 = 8.0;
