//! Hosted record service client.
//!
//! DESIGN
//! ======
//! A thin JSON-over-HTTP wrapper. Every request is scoped to a project and
//! authenticated with the project's public key in `x-api-key`:
//!
//! ```text
//! GET    {base}/projects/{project}/dashboards
//! GET    {base}/projects/{project}/dashboards/{id}
//! POST   {base}/projects/{project}/dashboards
//! PATCH  {base}/projects/{project}/dashboards/{id}
//! DELETE {base}/projects/{project}/dashboards/{id}
//! GET    {base}/projects/{project}/blocks?dashboard_id={id}
//! ...and the same shape for /blocks/{id}
//! ```
//!
//! Bodies use the same serde shapes as the REST API. A 404 maps to
//! [`RecordError::NotFound`]; any other non-success status becomes
//! [`RecordError::RemoteStatus`]. Pure response handling lives in
//! [`read_json`] and [`read_deleted`] for testability.

use std::time::Duration;

use async_trait::async_trait;
use canvas::block::{Block, BlockId, DashboardId, PartialBlock};
use reqwest::StatusCode;
use serde::Serialize;
use serde::de::DeserializeOwned;
use uuid::Uuid;

use super::{BlockRecords, Dashboard, DashboardPatch, DashboardRecords, RecordError};

const REQUEST_TIMEOUT_SECS: u64 = 30;
const CONNECT_TIMEOUT_SECS: u64 = 10;
const API_KEY_HEADER: &str = "x-api-key";

// =============================================================================
// CLIENT
// =============================================================================

pub struct HostedStore {
    http: reqwest::Client,
    base_url: String,
    project_id: String,
    public_key: String,
}

impl HostedStore {
    /// Build a client for one hosted project.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be constructed.
    pub fn new(base_url: &str, project_id: &str, public_key: &str) -> Result<Self, RecordError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .connect_timeout(Duration::from_secs(CONNECT_TIMEOUT_SECS))
            .build()?;
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            project_id: project_id.to_string(),
            public_key: public_key.to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/projects/{}/{path}", self.base_url, self.project_id)
    }

    async fn get<T: DeserializeOwned>(&self, path: &str, entity: &'static str, id: Uuid) -> Result<T, RecordError> {
        let response = self
            .http
            .get(self.url(path))
            .header(API_KEY_HEADER, &self.public_key)
            .send()
            .await?;
        let status = response.status();
        read_json(status, &response.text().await?, entity, id)
    }

    async fn send_json<B: Serialize + Sync, T: DeserializeOwned>(
        &self,
        method: reqwest::Method,
        path: &str,
        body: &B,
        entity: &'static str,
        id: Uuid,
    ) -> Result<T, RecordError> {
        let response = self
            .http
            .request(method, self.url(path))
            .header(API_KEY_HEADER, &self.public_key)
            .json(body)
            .send()
            .await?;
        let status = response.status();
        read_json(status, &response.text().await?, entity, id)
    }

    async fn delete(&self, path: &str) -> Result<bool, RecordError> {
        let response = self
            .http
            .delete(self.url(path))
            .header(API_KEY_HEADER, &self.public_key)
            .send()
            .await?;
        let status = response.status();
        read_deleted(status, &response.text().await?)
    }
}

// =============================================================================
// RESPONSE HANDLING
// =============================================================================

/// Decode a JSON response body, mapping failure statuses to record errors.
fn read_json<T: DeserializeOwned>(
    status: StatusCode,
    body: &str,
    entity: &'static str,
    id: Uuid,
) -> Result<T, RecordError> {
    if status == StatusCode::NOT_FOUND {
        return Err(RecordError::NotFound { entity, id });
    }
    if !status.is_success() {
        return Err(RecordError::RemoteStatus { status: status.as_u16(), body: body.to_string() });
    }
    serde_json::from_str(body).map_err(|e| RecordError::Decode(e.to_string()))
}

/// A delete of a missing record is not an error; it reports `false`.
fn read_deleted(status: StatusCode, body: &str) -> Result<bool, RecordError> {
    if status == StatusCode::NOT_FOUND {
        return Ok(false);
    }
    if !status.is_success() {
        return Err(RecordError::RemoteStatus { status: status.as_u16(), body: body.to_string() });
    }
    Ok(true)
}

#[derive(Serialize)]
struct DashboardUpdate<'a> {
    #[serde(flatten)]
    patch: &'a DashboardPatch,
    updated_at: i64,
}

// =============================================================================
// RECORDS
// =============================================================================

#[async_trait]
impl DashboardRecords for HostedStore {
    async fn list_dashboards(&self) -> Result<Vec<Dashboard>, RecordError> {
        self.get("dashboards", "dashboard", Uuid::nil()).await
    }

    async fn get_dashboard(&self, id: DashboardId) -> Result<Dashboard, RecordError> {
        self.get(&format!("dashboards/{id}"), "dashboard", id).await
    }

    async fn insert_dashboard(&self, dashboard: &Dashboard) -> Result<(), RecordError> {
        let _created: Dashboard = self
            .send_json(reqwest::Method::POST, "dashboards", dashboard, "dashboard", dashboard.id)
            .await?;
        Ok(())
    }

    async fn update_dashboard(
        &self,
        id: DashboardId,
        patch: &DashboardPatch,
        updated_at: i64,
    ) -> Result<Dashboard, RecordError> {
        let body = DashboardUpdate { patch, updated_at };
        self.send_json(reqwest::Method::PATCH, &format!("dashboards/{id}"), &body, "dashboard", id)
            .await
    }

    async fn delete_dashboard(&self, id: DashboardId) -> Result<bool, RecordError> {
        // The hosted service has no foreign keys; remove blocks first.
        for block in self.list_blocks(id).await? {
            self.delete(&format!("blocks/{}", block.id)).await?;
        }
        self.delete(&format!("dashboards/{id}")).await
    }
}

#[async_trait]
impl BlockRecords for HostedStore {
    async fn list_blocks(&self, dashboard_id: DashboardId) -> Result<Vec<Block>, RecordError> {
        self.get(&format!("blocks?dashboard_id={dashboard_id}"), "dashboard", dashboard_id)
            .await
    }

    async fn get_block(&self, id: BlockId) -> Result<Block, RecordError> {
        self.get(&format!("blocks/{id}"), "block", id).await
    }

    async fn insert_block(&self, block: &Block) -> Result<(), RecordError> {
        self.get_dashboard(block.dashboard_id).await?;
        let _created: Block = self
            .send_json(reqwest::Method::POST, "blocks", block, "block", block.id)
            .await?;
        Ok(())
    }

    async fn update_block(&self, id: BlockId, update: &PartialBlock) -> Result<Block, RecordError> {
        self.send_json(reqwest::Method::PATCH, &format!("blocks/{id}"), update, "block", id)
            .await
    }

    async fn delete_block(&self, id: BlockId) -> Result<bool, RecordError> {
        self.delete(&format!("blocks/{id}")).await
    }
}

#[cfg(test)]
#[path = "hosted_test.rs"]
mod tests;
