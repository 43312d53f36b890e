//! Shared fixtures for unit tests.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::Router;
use axum::body::Body;
use axum::http::{Method, Request, StatusCode, header};
use canvas::block::{Block, BlockContent, BlockId, DashboardId, PartialBlock};
use http_body_util::BodyExt;
use tower::ServiceExt;
use uuid::Uuid;

use crate::routes;
use crate::services::persistence::SaveConfig;
use crate::state::AppState;
use crate::store::memory::MemoryStore;
use crate::store::{BlockRecords, Dashboard, DashboardPatch, DashboardRecords, RecordError};

pub fn memory_store() -> Arc<MemoryStore> {
    Arc::new(MemoryStore::new())
}

pub fn test_save_config() -> SaveConfig {
    SaveConfig { debounce_ms: 1000, retries: 2, retry_base_ms: 200, event_capacity: 64 }
}

pub fn test_app_state() -> AppState {
    AppState::new(memory_store(), test_save_config(), "<!doctype html><title>test</title>".into())
}

/// Router over `state` with no static directory.
pub fn test_app(state: AppState) -> Router {
    routes::app(state, std::path::Path::new("/nonexistent/dashboards-static"))
}

/// Send one request through the router. Returns the status, headers and
/// raw body.
pub async fn send(
    app: Router,
    method: Method,
    uri: &str,
    json: Option<serde_json::Value>,
) -> (StatusCode, axum::http::HeaderMap, Vec<u8>) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match json {
        Some(value) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(value.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let headers = response.headers().clone();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    (status, headers, bytes.to_vec())
}

/// Like [`send`] but parses the body as JSON (`Null` when empty).
pub async fn send_json(
    app: Router,
    method: Method,
    uri: &str,
    json: Option<serde_json::Value>,
) -> (StatusCode, serde_json::Value) {
    let (status, _, body) = send(app, method, uri, json).await;
    let value = if body.is_empty() { serde_json::Value::Null } else { serde_json::from_slice(&body).unwrap() };
    (status, value)
}

pub async fn seed_dashboard<S: DashboardRecords + ?Sized>(store: &S) -> Dashboard {
    let dashboard = Dashboard {
        id: Uuid::new_v4(),
        title: "Seeded".into(),
        is_public: false,
        owner_id: None,
        thumbnail_url: None,
        created_at: 1,
        updated_at: 1,
    };
    store.insert_dashboard(&dashboard).await.unwrap();
    dashboard
}

pub async fn seed_block<S: BlockRecords + ?Sized>(store: &S, dashboard_id: DashboardId) -> Block {
    let block = Block {
        id: Uuid::new_v4(),
        dashboard_id,
        content: BlockContent::Embed { url: "https://example.com/chart".into() },
        title: "Chart".into(),
        x: 0.0,
        y: 0.0,
        width: 400.0,
        height: 300.0,
        z_index: 1,
        created_at: 1,
    };
    store.insert_block(&block).await.unwrap();
    block
}

// =============================================================================
// SCRIPTED STORE
// =============================================================================

/// Memory store that records block updates and can be told to fail.
#[derive(Default)]
pub struct ScriptedStore {
    pub inner: MemoryStore,
    /// Number of upcoming `update_block` calls that fail.
    pub failing_updates: AtomicUsize,
    pub fail_deletes: AtomicBool,
    pub fail_loads: AtomicBool,
    pub updates: Mutex<Vec<(BlockId, PartialBlock)>>,
}

impl ScriptedStore {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn fail_next_updates(&self, n: usize) {
        self.failing_updates.store(n, Ordering::SeqCst);
    }

    pub fn recorded_updates(&self) -> Vec<(BlockId, PartialBlock)> {
        self.updates.lock().unwrap().clone()
    }

    fn unavailable() -> RecordError {
        RecordError::RemoteStatus { status: 503, body: "unavailable".into() }
    }
}

#[async_trait]
impl DashboardRecords for ScriptedStore {
    async fn list_dashboards(&self) -> Result<Vec<Dashboard>, RecordError> {
        self.inner.list_dashboards().await
    }

    async fn get_dashboard(&self, id: DashboardId) -> Result<Dashboard, RecordError> {
        if self.fail_loads.load(Ordering::SeqCst) {
            return Err(Self::unavailable());
        }
        self.inner.get_dashboard(id).await
    }

    async fn insert_dashboard(&self, dashboard: &Dashboard) -> Result<(), RecordError> {
        self.inner.insert_dashboard(dashboard).await
    }

    async fn update_dashboard(
        &self,
        id: DashboardId,
        patch: &DashboardPatch,
        updated_at: i64,
    ) -> Result<Dashboard, RecordError> {
        self.inner.update_dashboard(id, patch, updated_at).await
    }

    async fn delete_dashboard(&self, id: DashboardId) -> Result<bool, RecordError> {
        self.inner.delete_dashboard(id).await
    }
}

#[async_trait]
impl BlockRecords for ScriptedStore {
    async fn list_blocks(&self, dashboard_id: DashboardId) -> Result<Vec<Block>, RecordError> {
        self.inner.list_blocks(dashboard_id).await
    }

    async fn get_block(&self, id: BlockId) -> Result<Block, RecordError> {
        self.inner.get_block(id).await
    }

    async fn insert_block(&self, block: &Block) -> Result<(), RecordError> {
        self.inner.insert_block(block).await
    }

    async fn update_block(&self, id: BlockId, update: &PartialBlock) -> Result<Block, RecordError> {
        self.updates.lock().unwrap().push((id, update.clone()));
        let failing = self.failing_updates.load(Ordering::SeqCst);
        if failing > 0 {
            self.failing_updates.store(failing - 1, Ordering::SeqCst);
            return Err(Self::unavailable());
        }
        self.inner.update_block(id, update).await
    }

    async fn delete_block(&self, id: BlockId) -> Result<bool, RecordError> {
        if self.fail_deletes.load(Ordering::SeqCst) {
            return Err(Self::unavailable());
        }
        self.inner.delete_block(id).await
    }
}
