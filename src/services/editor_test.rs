#![allow(clippy::float_cmp)]

use std::sync::Arc;
use std::sync::atomic::Ordering;

use canvas::block::BlockContent;
use tokio::time::{Duration, sleep, timeout};

use super::*;
use crate::store::{BlockRecords, DashboardRecords};
use crate::test_helpers::{self, ScriptedStore};

struct Fixture {
    store: Arc<ScriptedStore>,
    dashboards: DashboardService,
    blocks: BlockService,
    dashboard_id: DashboardId,
    block_id: BlockId,
}

async fn fixture() -> Fixture {
    let store = ScriptedStore::new();
    let dashboard = test_helpers::seed_dashboard(&*store).await;
    let block = test_helpers::seed_block(&*store, dashboard.id).await;
    Fixture {
        dashboards: DashboardService::new(store.clone()),
        blocks: BlockService::new(store.clone()),
        store,
        dashboard_id: dashboard.id,
        block_id: block.id,
    }
}

async fn open(f: &Fixture, mode: EditorMode) -> (EditorSession, mpsc::Receiver<SaveEvent>) {
    EditorSession::open(
        f.dashboards.clone(),
        f.blocks.clone(),
        test_helpers::test_save_config(),
        f.dashboard_id,
        mode,
    )
    .await
    .unwrap()
}

fn note_code(updates: &[Update]) -> Option<&'static str> {
    updates.iter().find_map(|u| match u {
        Update::Notice { notice: Notice::Error { code, .. } } => Some(*code),
        _ => None,
    })
}

// =============================================================================
// resolve
// =============================================================================

#[tokio::test]
async fn resolve_new_creates_once_and_redirects() {
    let f = fixture().await;
    let Resolved::Redirect(id) = resolve(&f.dashboards, "new").await.unwrap() else {
        panic!("expected redirect");
    };
    assert_eq!(f.store.get_dashboard(id).await.unwrap().title, "Untitled Dashboard");

    // Following the redirect resolves in place and creates nothing more.
    assert_eq!(resolve(&f.dashboards, &id.to_string()).await.unwrap(), Resolved::Existing(id));
    assert_eq!(f.store.list_dashboards().await.unwrap().len(), 2);
}

#[tokio::test]
async fn resolve_existing_id() {
    let f = fixture().await;
    let target = f.dashboard_id.to_string();
    assert_eq!(resolve(&f.dashboards, &target).await.unwrap(), Resolved::Existing(f.dashboard_id));
}

#[tokio::test]
async fn resolve_malformed_or_unknown_is_not_found() {
    let f = fixture().await;
    let unknown = Uuid::new_v4().to_string();
    for target in ["not-a-uuid", "", unknown.as_str()] {
        let err = resolve(&f.dashboards, target).await.unwrap_err();
        assert_eq!(err.error_code(), "E_NOT_FOUND", "{target}");
    }
}

// =============================================================================
// open
// =============================================================================

#[tokio::test]
async fn open_loads_dashboard_and_blocks() {
    let f = fixture().await;
    let (session, _events) = open(&f, EditorMode::Edit).await;
    assert_eq!(session.dashboard().id, f.dashboard_id);
    assert_eq!(session.mode(), EditorMode::Edit);
    assert_eq!(session.blocks().len(), 1);
    assert_eq!(session.selection(), None);
}

#[tokio::test]
async fn open_reports_load_failure() {
    let f = fixture().await;
    f.store.fail_loads.store(true, Ordering::SeqCst);
    let result = EditorSession::open(
        f.dashboards.clone(),
        f.blocks.clone(),
        test_helpers::test_save_config(),
        f.dashboard_id,
        EditorMode::Edit,
    )
    .await;
    assert!(matches!(result, Err(RecordError::RemoteStatus { status: 503, .. })));
}

#[tokio::test]
async fn open_unknown_dashboard_is_not_found() {
    let f = fixture().await;
    let result = EditorSession::open(
        f.dashboards.clone(),
        f.blocks.clone(),
        test_helpers::test_save_config(),
        Uuid::new_v4(),
        EditorMode::View,
    )
    .await;
    assert!(matches!(result, Err(RecordError::NotFound { .. })));
}

// =============================================================================
// Drag / resize
// =============================================================================

#[tokio::test(start_paused = true)]
async fn drag_updates_locally_then_saves_after_quiet_window() {
    let f = fixture().await;
    let (mut session, mut events) = open(&f, EditorMode::Edit).await;

    let down = session.pointer_down(Point::new(50.0, 50.0), true).await;
    assert_eq!(down, vec![Update::Selection { block_id: Some(f.block_id) }]);

    session.pointer_move(Point::new(100.0, 70.0)).await;
    let moved = session.pointer_move(Point::new(150.0, 80.0)).await;
    session.pointer_up();
    let [Update::BlockChanged { block }] = moved.as_slice() else {
        panic!("expected block change, got {moved:?}");
    };
    assert_eq!((block.x, block.y), (100.0, 30.0));

    // Optimistic: local state moved, store still untouched.
    assert_eq!(f.store.get_block(f.block_id).await.unwrap().x, 0.0);

    let event = timeout(Duration::from_secs(5), events.recv()).await.unwrap().unwrap();
    assert_eq!(event, SaveEvent::Saved { block_id: f.block_id });
    assert_eq!(f.store.recorded_updates().len(), 1);
    let saved = f.store.get_block(f.block_id).await.unwrap();
    assert_eq!((saved.x, saved.y), (100.0, 30.0));
}

#[tokio::test(start_paused = true)]
async fn resize_from_se_handle_saves_size() {
    let f = fixture().await;
    let (mut session, mut events) = open(&f, EditorMode::Edit).await;
    session.select(f.block_id).await;

    // SE corner of the 400x300 block sits at (400, 300).
    session.pointer_down(Point::new(400.0, 300.0), true).await;
    let resized = session.pointer_move(Point::new(450.0, 320.0)).await;
    session.pointer_up();
    assert!(matches!(
        resized.as_slice(),
        [Update::BlockChanged { block }] if block.width == 450.0 && block.height == 320.0
    ));

    timeout(Duration::from_secs(5), events.recv()).await.unwrap().unwrap();
    let saved = f.store.get_block(f.block_id).await.unwrap();
    assert_eq!((saved.x, saved.y, saved.width, saved.height), (0.0, 0.0, 450.0, 320.0));
}

#[tokio::test(start_paused = true)]
async fn view_mode_ignores_gestures() {
    let f = fixture().await;
    let (mut session, _events) = open(&f, EditorMode::View).await;

    assert!(session.pointer_down(Point::new(50.0, 50.0), true).await.is_empty());
    assert!(session.pointer_move(Point::new(150.0, 80.0)).await.is_empty());
    assert!(!session.begin_resize(f.block_id, Point::new(400.0, 300.0), Corner::Se));
    assert!(session.select(f.block_id).await.is_empty());

    sleep(Duration::from_secs(5)).await;
    assert!(f.store.recorded_updates().is_empty());
}

#[tokio::test]
async fn click_outside_and_escape_clear_selection() {
    let f = fixture().await;
    let (mut session, _events) = open(&f, EditorMode::Edit).await;

    session.select(f.block_id).await;
    assert_eq!(session.click_outside().await, vec![Update::Selection { block_id: None }]);

    session.select(f.block_id).await;
    let escaped = session.key_down(&Key("Escape".into())).await;
    assert_eq!(escaped, vec![Update::Selection { block_id: None }]);
    assert!(session.click_empty().await.is_empty());
}

// =============================================================================
// Commands
// =============================================================================

#[tokio::test]
async fn add_block_lands_at_drop_point_on_top() {
    let f = fixture().await;
    let (mut session, _events) = open(&f, EditorMode::Edit).await;

    let mut draft = NewBlock::with_content(BlockContent::Text { text: "hello".into() });
    draft.x = Some(900.0);
    draft.width = Some(10.0);
    let updates = session.add_block(draft).await;

    let [Update::BlockAdded { block }] = updates.as_slice() else {
        panic!("expected block added, got {updates:?}");
    };
    assert_eq!((block.x, block.y), (100.0, 100.0));
    assert_eq!((block.width, block.height), (400.0, 300.0));
    assert_eq!(block.z_index, 2);
    assert_eq!(session.blocks().last().map(|b| b.id), Some(block.id));
    assert!(f.store.get_block(block.id).await.is_ok());
}

#[tokio::test]
async fn add_block_rejects_invalid_content() {
    let f = fixture().await;
    let (mut session, _events) = open(&f, EditorMode::Edit).await;
    let draft = NewBlock::with_content(BlockContent::Link { url: "not a url".into() });
    let updates = session.add_block(draft).await;
    assert_eq!(note_code(&updates), Some("E_VALIDATION"));
    assert_eq!(session.blocks().len(), 1);
}

#[tokio::test]
async fn view_mode_rejects_commands() {
    let f = fixture().await;
    let (mut session, _events) = open(&f, EditorMode::View).await;

    let draft = NewBlock::with_content(BlockContent::Text { text: "x".into() });
    assert_eq!(note_code(&session.add_block(draft).await), Some("E_VIEW_ONLY"));
    assert_eq!(note_code(&session.set_visibility(true).await), Some("E_VIEW_ONLY"));
    assert_eq!(note_code(&session.rename("New".into()).await), Some("E_VIEW_ONLY"));
    assert!(session.delete_block(f.block_id).await.is_empty());
    assert!(f.store.get_block(f.block_id).await.is_ok());
}

#[tokio::test(start_paused = true)]
async fn delete_key_removes_selected_block_and_cancels_its_save() {
    let f = fixture().await;
    let (mut session, _events) = open(&f, EditorMode::Edit).await;

    session.pointer_down(Point::new(50.0, 50.0), true).await;
    session.pointer_move(Point::new(60.0, 60.0)).await;
    session.pointer_up();
    assert!(session.saver().is_dirty(f.block_id).await);

    let updates = session.key_down(&Key("Delete".into())).await;
    assert_eq!(
        updates,
        vec![Update::BlockRemoved { block_id: f.block_id }, Update::Selection { block_id: None }]
    );
    assert!(session.blocks().is_empty());
    assert!(!session.saver().is_dirty(f.block_id).await);

    sleep(Duration::from_secs(5)).await;
    assert!(f.store.recorded_updates().is_empty());
    assert!(f.store.get_block(f.block_id).await.is_err());
}

#[tokio::test]
async fn delete_requires_selection() {
    let f = fixture().await;
    let (mut session, _events) = open(&f, EditorMode::Edit).await;
    assert!(session.delete_block(f.block_id).await.is_empty());
    assert!(session.delete_selected().await.is_empty());
    assert_eq!(session.blocks().len(), 1);
}

#[tokio::test]
async fn failed_delete_keeps_block_and_reports() {
    let f = fixture().await;
    f.store.fail_deletes.store(true, Ordering::SeqCst);
    let (mut session, _events) = open(&f, EditorMode::Edit).await;

    session.select(f.block_id).await;
    let updates = session.delete_selected().await;
    assert_eq!(note_code(&updates), Some("E_PERSISTENCE"));
    assert_eq!(session.blocks().len(), 1);
    assert_eq!(session.selection(), None);
}

#[tokio::test(start_paused = true)]
async fn failed_delete_still_saves_pending_drag() {
    let f = fixture().await;
    f.store.fail_deletes.store(true, Ordering::SeqCst);
    let (mut session, mut events) = open(&f, EditorMode::Edit).await;

    session.pointer_down(Point::new(50.0, 50.0), true).await;
    session.pointer_move(Point::new(60.0, 70.0)).await;
    session.pointer_up();
    let updates = session.key_down(&Key("Delete".into())).await;
    assert_eq!(note_code(&updates), Some("E_PERSISTENCE"));

    let event = timeout(Duration::from_secs(5), events.recv()).await.unwrap().unwrap();
    assert_eq!(event, SaveEvent::Saved { block_id: f.block_id });
    let saved = f.store.get_block(f.block_id).await.unwrap();
    assert_eq!((saved.x, saved.y), (10.0, 20.0));
}

#[tokio::test]
async fn rename_and_share_update_dashboard() {
    let f = fixture().await;
    let (mut session, _events) = open(&f, EditorMode::Edit).await;

    let renamed = session.rename("Ops".into()).await;
    assert!(matches!(renamed.as_slice(), [Update::Dashboard { dashboard }] if dashboard.title == "Ops"));

    session.set_visibility(true).await;
    assert!(session.dashboard().is_public);
    assert_eq!(session.dashboard().title, "Ops");

    assert_eq!(note_code(&session.rename("   ".into()).await), Some("E_VALIDATION"));
    assert_eq!(session.dashboard().title, "Ops");
}

#[tokio::test(start_paused = true)]
async fn close_flushes_pending_saves() {
    let f = fixture().await;
    let (mut session, _events) = open(&f, EditorMode::Edit).await;

    session.pointer_down(Point::new(50.0, 50.0), true).await;
    session.pointer_move(Point::new(250.0, 50.0)).await;

    assert_eq!(session.close().await, 0);
    assert_eq!(f.store.get_block(f.block_id).await.unwrap().x, 200.0);
}

#[test]
fn update_serializes_with_type_tag() {
    let update = Update::Selection { block_id: None };
    let json = serde_json::to_value(&update).unwrap();
    assert_eq!(json, serde_json::json!({ "type": "selection", "block_id": null }));
}
