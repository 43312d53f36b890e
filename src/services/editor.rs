//! Editor session: one open dashboard on one connection.
//!
//! DESIGN
//! ======
//! The session owns a canvas [`Engine`] loaded from the record services and
//! a [`SaveScheduler`] for its blocks. Input is applied to the canvas first
//! (optimistic), then the resulting actions are turned into scheduled saves
//! and record-service calls. Every method returns the [`Update`]s the client
//! must reflect; the session never talks to the socket itself.
//!
//! LIFECYCLE
//! =========
//! 1. `resolve` the route target (`new` creates, then redirects)
//! 2. `open` loads dashboard + blocks concurrently
//! 3. pointer/key/command calls mutate the canvas and schedule saves
//! 4. `close` flushes pending saves
//!
//! ERROR HANDLING
//! ==============
//! Load failures are returned to the caller (the page shows an error with a
//! retry). Mutation failures become [`Notice::Error`] updates and leave
//! local state as it was before the request.

use canvas::block::{Block, BlockId, DashboardId, PartialBlock};
use canvas::consts::NEW_BLOCK_OFFSET;
use canvas::engine::{Action, Engine};
use canvas::geom::Point;
use canvas::input::{Corner, Key};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::{info, warn};
use uuid::Uuid;

use crate::services::block::{BlockService, NewBlock};
use crate::services::dashboard::{DashboardService, NewDashboard};
use crate::services::persistence::{SaveConfig, SaveEvent, SaveScheduler};
use crate::store::{Dashboard, DashboardPatch, RecordError};

/// Route segment that creates a fresh dashboard.
pub const NEW_DASHBOARD_SEGMENT: &str = "new";

// =============================================================================
// TYPES
// =============================================================================

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EditorMode {
    #[default]
    Edit,
    View,
}

impl EditorMode {
    #[must_use]
    pub fn is_view_only(self) -> bool {
        self == Self::View
    }
}

/// Where an editor route target points.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolved {
    /// An existing dashboard; open it in place.
    Existing(DashboardId),
    /// A dashboard was just created; navigate to its own route.
    Redirect(DashboardId),
}

/// Non-blocking message for the user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "level", rename_all = "snake_case")]
pub enum Notice {
    Error { code: &'static str, message: String },
}

impl Notice {
    fn from_error(context: &str, err: &RecordError) -> Self {
        Self::Error { code: err.error_code(), message: format!("{context}: {err}") }
    }

    fn view_only(action: &str) -> Self {
        Self::Error { code: "E_VIEW_ONLY", message: format!("cannot {action} in view-only mode") }
    }
}

/// Change the client must reflect.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Update {
    Selection { block_id: Option<BlockId> },
    BlockAdded { block: Block },
    BlockChanged { block: Block },
    BlockRemoved { block_id: BlockId },
    Dashboard { dashboard: Dashboard },
    Notice { notice: Notice },
}

impl Update {
    fn notice(notice: Notice) -> Self {
        Self::Notice { notice }
    }
}

// =============================================================================
// RESOLVE
// =============================================================================

/// Resolve an editor route segment.
///
/// # Errors
///
/// Returns `NotFound` for a malformed id or an id with no dashboard, and
/// persistence errors from the store.
pub async fn resolve(dashboards: &DashboardService, target: &str) -> Result<Resolved, RecordError> {
    if target == NEW_DASHBOARD_SEGMENT {
        let dashboard = dashboards.create(NewDashboard::default()).await?;
        info!(dashboard_id = %dashboard.id, "editor created dashboard");
        return Ok(Resolved::Redirect(dashboard.id));
    }
    let id = Uuid::parse_str(target).map_err(|_| RecordError::dashboard_not_found(Uuid::nil()))?;
    dashboards.get(id).await?;
    Ok(Resolved::Existing(id))
}

// =============================================================================
// SESSION
// =============================================================================

pub struct EditorSession {
    dashboard: Dashboard,
    mode: EditorMode,
    engine: Engine,
    dashboards: DashboardService,
    blocks: BlockService,
    saver: SaveScheduler,
}

impl EditorSession {
    /// Load a dashboard and its blocks. Returns the session and the receiver
    /// for its save events.
    ///
    /// # Errors
    ///
    /// Returns the first load failure; retrying means calling `open` again.
    pub async fn open(
        dashboards: DashboardService,
        blocks: BlockService,
        save_config: SaveConfig,
        id: DashboardId,
        mode: EditorMode,
    ) -> Result<(Self, mpsc::Receiver<SaveEvent>), RecordError> {
        let (dashboard, snapshot) = tokio::try_join!(dashboards.get(id), blocks.list(id))?;

        let mut engine = if mode.is_view_only() { Engine::view_only() } else { Engine::new() };
        engine.load_snapshot(snapshot);
        let (saver, events) = SaveScheduler::new(blocks.clone(), save_config);

        info!(dashboard_id = %id, ?mode, blocks = engine.doc.len(), "editor session opened");
        Ok((Self { dashboard, mode, engine, dashboards, blocks, saver }, events))
    }

    #[must_use]
    pub fn dashboard(&self) -> &Dashboard {
        &self.dashboard
    }

    #[must_use]
    pub fn mode(&self) -> EditorMode {
        self.mode
    }

    /// Blocks in ascending stacking order.
    #[must_use]
    pub fn blocks(&self) -> Vec<Block> {
        self.engine.blocks().into_iter().cloned().collect()
    }

    #[must_use]
    pub fn selection(&self) -> Option<BlockId> {
        self.engine.selection()
    }

    #[must_use]
    pub fn saver(&self) -> &SaveScheduler {
        &self.saver
    }

    // =========================================================================
    // POINTER / KEYS
    // =========================================================================

    pub async fn pointer_down(&mut self, pointer: Point, inside_canvas: bool) -> Vec<Update> {
        let actions = self.engine.on_pointer_down(pointer, inside_canvas);
        self.apply_actions(actions).await
    }

    pub async fn pointer_move(&mut self, pointer: Point) -> Vec<Update> {
        let actions = self.engine.on_pointer_move(pointer);
        self.apply_actions(actions).await
    }

    /// End the current gesture. Pending saves are untouched.
    pub fn pointer_up(&mut self) {
        self.engine.on_pointer_up();
    }

    pub async fn key_down(&mut self, key: &Key) -> Vec<Update> {
        let actions = self.engine.on_key_down(key);
        self.apply_actions(actions).await
    }

    pub async fn select(&mut self, id: BlockId) -> Vec<Update> {
        let actions = self.engine.select_block(id);
        self.apply_actions(actions).await
    }

    pub async fn click_empty(&mut self) -> Vec<Update> {
        let actions = self.engine.click_empty();
        self.apply_actions(actions).await
    }

    pub async fn click_outside(&mut self) -> Vec<Update> {
        let actions = self.engine.click_outside();
        self.apply_actions(actions).await
    }

    /// Grab a block's corner handle directly.
    pub fn begin_resize(&mut self, id: BlockId, pointer: Point, corner: Corner) -> bool {
        self.engine.begin_resize(id, pointer, corner)
    }

    // =========================================================================
    // COMMANDS
    // =========================================================================

    /// Add a block at the standard drop point on top of the stack.
    pub async fn add_block(&mut self, draft: NewBlock) -> Vec<Update> {
        if self.mode.is_view_only() {
            return vec![Update::notice(Notice::view_only("add blocks"))];
        }
        let input = NewBlock {
            x: Some(NEW_BLOCK_OFFSET),
            y: Some(NEW_BLOCK_OFFSET),
            width: None,
            height: None,
            z_index: Some(self.engine.doc.next_z_index()),
            ..draft
        };
        match self.blocks.create(self.dashboard.id, input).await {
            Ok(block) => {
                self.engine.apply_create(block.clone());
                vec![Update::BlockAdded { block }]
            }
            Err(e) => {
                warn!(error = %e, dashboard_id = %self.dashboard.id, "add block failed");
                vec![Update::notice(Notice::from_error("could not add block", &e))]
            }
        }
    }

    pub async fn delete_selected(&mut self) -> Vec<Update> {
        let actions = self.engine.delete_selected();
        self.apply_actions(actions).await
    }

    pub async fn delete_block(&mut self, id: BlockId) -> Vec<Update> {
        let actions = self.engine.delete_block(id);
        self.apply_actions(actions).await
    }

    pub async fn set_visibility(&mut self, is_public: bool) -> Vec<Update> {
        if self.mode.is_view_only() {
            return vec![Update::notice(Notice::view_only("change sharing"))];
        }
        let result = self.dashboards.set_visibility(self.dashboard.id, is_public).await;
        self.apply_dashboard_result(result, "could not update sharing")
    }

    pub async fn rename(&mut self, title: String) -> Vec<Update> {
        if self.mode.is_view_only() {
            return vec![Update::notice(Notice::view_only("rename"))];
        }
        let patch = DashboardPatch { title: Some(title), ..Default::default() };
        let result = self.dashboards.update(self.dashboard.id, patch).await;
        self.apply_dashboard_result(result, "could not rename dashboard")
    }

    /// Flush pending saves. Returns how many blocks are still unsaved.
    pub async fn close(&mut self) -> usize {
        self.engine.end();
        let unsaved = self.saver.flush().await;
        if unsaved > 0 {
            warn!(dashboard_id = %self.dashboard.id, unsaved, "editor closed with unsaved blocks");
        }
        unsaved
    }

    // =========================================================================
    // ACTION HANDLING
    // =========================================================================

    async fn apply_actions(&mut self, actions: Vec<Action>) -> Vec<Update> {
        let mut updates = Vec::with_capacity(actions.len());
        for action in actions {
            match action {
                Action::SelectionChanged(block_id) => updates.push(Update::Selection { block_id }),
                Action::BlockMoved { id, x, y } => {
                    self.saver.schedule_save(id, PartialBlock::moved(x, y)).await;
                    updates.extend(self.changed(id));
                }
                Action::BlockResized { id, width, height } => {
                    self.saver.schedule_save(id, PartialBlock::resized(width, height)).await;
                    updates.extend(self.changed(id));
                }
                Action::DeleteRequested { id } => updates.push(self.perform_delete(id).await),
            }
        }
        updates
    }

    fn changed(&self, id: BlockId) -> Option<Update> {
        self.engine.block(&id).map(|block| Update::BlockChanged { block: block.clone() })
    }

    async fn perform_delete(&mut self, id: BlockId) -> Update {
        self.saver.hold(id).await;
        match self.blocks.delete(id).await {
            Ok(_) => {
                self.engine.apply_delete(&id);
                self.saver.cancel(id).await;
                Update::BlockRemoved { block_id: id }
            }
            Err(e) => {
                self.saver.release(id).await;
                warn!(error = %e, block_id = %id, "delete block failed");
                Update::notice(Notice::from_error("could not delete block", &e))
            }
        }
    }

    fn apply_dashboard_result(&mut self, result: Result<Dashboard, RecordError>, context: &str) -> Vec<Update> {
        match result {
            Ok(dashboard) => {
                self.dashboard = dashboard.clone();
                vec![Update::Dashboard { dashboard }]
            }
            Err(e) => {
                warn!(error = %e, dashboard_id = %self.dashboard.id, "{context}");
                vec![Update::notice(Notice::from_error(context, &e))]
            }
        }
    }
}

#[cfg(test)]
#[path = "editor_test.rs"]
mod tests;
