//! WebSocket handler: one editor session per connection.
//!
//! DESIGN
//! ======
//! The dashboard is loaded before the upgrade, so a missing dashboard or a
//! failed load is an ordinary HTTP error and "retry" means reconnecting. On
//! upgrade the connection task owns the [`EditorSession`] and enters a
//! `select!` loop:
//! - Incoming client messages → parse + apply to the session
//! - Save outcomes from the session's scheduler → forward to client
//! - Saving indicator changes → forward to client
//!
//! Message handling is pure with respect to the socket: it returns the
//! messages for the client and the loop sends them.
//!
//! LIFECYCLE
//! =========
//! 1. Load → upgrade → send `snapshot`
//! 2. Client messages → session → `Update`s back to the client
//! 3. Close → flush pending saves

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::response::{IntoResponse, Response};
use canvas::block::{Block, BlockId};
use canvas::geom::Point;
use canvas::input::{Corner, Key};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::routes::ApiError;
use crate::routes::extract::{ApiPath, ApiQuery};
use crate::services::block::NewBlock;
use crate::services::editor::{EditorMode, EditorSession, Notice, Update};
use crate::services::persistence::SaveEvent;
use crate::state::AppState;
use crate::store::{Dashboard, RecordError};

// =============================================================================
// MESSAGES
// =============================================================================

#[derive(Debug, Default, Deserialize)]
pub struct EditorParams {
    #[serde(default)]
    pub mode: EditorMode,
}

fn default_inside_canvas() -> bool {
    true
}

/// Client → server.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    PointerDown {
        x: f64,
        y: f64,
        #[serde(default = "default_inside_canvas")]
        inside_canvas: bool,
    },
    PointerMove { x: f64, y: f64 },
    PointerUp,
    KeyDown { key: String },
    Select { block_id: BlockId },
    ClickEmpty,
    ClickOutside,
    BeginResize { block_id: BlockId, corner: Corner, x: f64, y: f64 },
    AddBlock { block: NewBlock },
    DeleteSelected,
    DeleteBlock { block_id: BlockId },
    SetVisibility { is_public: bool },
    Rename { title: String },
}

/// Server → client messages owned by the connection.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    Snapshot { dashboard: Dashboard, mode: EditorMode, blocks: Vec<Block> },
    Saving { active: bool },
    Saved { block_id: BlockId },
    SaveFailed { block_id: BlockId, code: &'static str, message: String },
}

impl From<SaveEvent> for ServerMessage {
    fn from(event: SaveEvent) -> Self {
        match event {
            SaveEvent::Saved { block_id } => Self::Saved { block_id },
            SaveEvent::Failed { block_id, code, message } => Self::SaveFailed { block_id, code, message },
        }
    }
}

/// Anything sent to the client. Both sides carry their own `type` tag.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Outbound {
    Connection(ServerMessage),
    Editor(Update),
}

// =============================================================================
// UPGRADE
// =============================================================================

/// `GET /api/dashboards/{id}/editor?mode=edit|view`
pub async fn handle_editor(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<String>,
    ApiQuery(params): ApiQuery<EditorParams>,
    ws: WebSocketUpgrade,
) -> Response {
    match open_session(&state, &id, params.mode).await {
        Ok((session, events)) => ws.on_upgrade(move |socket| run_editor(socket, session, events)),
        Err(e) => e.into_response(),
    }
}

/// Load the session for a route id.
pub(crate) async fn open_session(
    state: &AppState,
    id: &str,
    mode: EditorMode,
) -> Result<(EditorSession, mpsc::Receiver<SaveEvent>), ApiError> {
    let id = Uuid::parse_str(id).map_err(|_| RecordError::dashboard_not_found(Uuid::nil()))?;
    let opened = EditorSession::open(state.dashboards.clone(), state.blocks.clone(), state.save, id, mode).await?;
    Ok(opened)
}

// =============================================================================
// CONNECTION
// =============================================================================

async fn run_editor(mut socket: WebSocket, mut session: EditorSession, mut events: mpsc::Receiver<SaveEvent>) {
    let dashboard_id = session.dashboard().id;
    let mut saving = session.saver().subscribe_saving();

    if send(&mut socket, &snapshot(&session)).await.is_err() {
        session.close().await;
        return;
    }
    info!(%dashboard_id, mode = ?session.mode(), "ws: editor connected");

    loop {
        tokio::select! {
            msg = socket.recv() => {
                let Some(Ok(msg)) = msg else { break };
                match msg {
                    Message::Text(text) => {
                        let replies = process_inbound_text(&mut session, text.as_str()).await;
                        if send_all(&mut socket, &replies).await.is_err() {
                            break;
                        }
                    }
                    Message::Close(_) => break,
                    _ => {}
                }
            }
            Some(event) = events.recv() => {
                if send(&mut socket, &Outbound::Connection(event.into())).await.is_err() {
                    break;
                }
            }
            Ok(()) = saving.changed() => {
                let active = *saving.borrow_and_update();
                if send(&mut socket, &Outbound::Connection(ServerMessage::Saving { active })).await.is_err() {
                    break;
                }
            }
        }
    }

    let unsaved = session.close().await;
    info!(%dashboard_id, unsaved, "ws: editor disconnected");
}

fn snapshot(session: &EditorSession) -> Outbound {
    Outbound::Connection(ServerMessage::Snapshot {
        dashboard: session.dashboard().clone(),
        mode: session.mode(),
        blocks: session.blocks(),
    })
}

// =============================================================================
// MESSAGE DISPATCH
// =============================================================================

/// Parse and apply one inbound text message; return messages for the client.
pub(crate) async fn process_inbound_text(session: &mut EditorSession, text: &str) -> Vec<Outbound> {
    let msg: ClientMessage = match serde_json::from_str(text) {
        Ok(m) => m,
        Err(e) => {
            warn!(error = %e, "ws: invalid inbound message");
            let notice = Notice::Error { code: "E_BAD_MESSAGE", message: format!("invalid message: {e}") };
            return vec![Outbound::Editor(Update::Notice { notice })];
        }
    };

    let updates = match msg {
        ClientMessage::PointerDown { x, y, inside_canvas } => session.pointer_down(Point::new(x, y), inside_canvas).await,
        ClientMessage::PointerMove { x, y } => session.pointer_move(Point::new(x, y)).await,
        ClientMessage::PointerUp => {
            session.pointer_up();
            Vec::new()
        }
        ClientMessage::KeyDown { key } => session.key_down(&Key(key)).await,
        ClientMessage::Select { block_id } => session.select(block_id).await,
        ClientMessage::ClickEmpty => session.click_empty().await,
        ClientMessage::ClickOutside => session.click_outside().await,
        ClientMessage::BeginResize { block_id, corner, x, y } => {
            if !session.begin_resize(block_id, Point::new(x, y), corner) {
                debug!(%block_id, ?corner, "ws: resize not started");
            }
            Vec::new()
        }
        ClientMessage::AddBlock { block } => session.add_block(block).await,
        ClientMessage::DeleteSelected => session.delete_selected().await,
        ClientMessage::DeleteBlock { block_id } => session.delete_block(block_id).await,
        ClientMessage::SetVisibility { is_public } => session.set_visibility(is_public).await,
        ClientMessage::Rename { title } => session.rename(title).await,
    };
    updates.into_iter().map(Outbound::Editor).collect()
}

async fn send_all(socket: &mut WebSocket, messages: &[Outbound]) -> Result<(), ()> {
    for message in messages {
        send(socket, message).await?;
    }
    Ok(())
}

async fn send(socket: &mut WebSocket, message: &Outbound) -> Result<(), ()> {
    let json = match serde_json::to_string(message) {
        Ok(j) => j,
        Err(e) => {
            warn!(error = %e, "ws: failed to serialize message");
            return Err(());
        }
    };
    socket.send(Message::Text(json.into())).await.map_err(|_| ())
}

#[cfg(test)]
#[path = "ws_test.rs"]
mod tests;
