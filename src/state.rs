//! Shared application state.
//!
//! DESIGN
//! ======
//! `AppState` is injected into Axum handlers via the `State` extractor. It
//! holds the two record services (over one injected record store), the save
//! tuning handed to each editor session, and the HTML shell served for page
//! routes. Editor sessions are per connection and are not stored here.

use std::path::Path;
use std::sync::Arc;

use tracing::{info, warn};

use crate::services::block::BlockService;
use crate::services::dashboard::DashboardService;
use crate::services::persistence::SaveConfig;
use crate::store::RecordStore;

/// Served when the static directory has no `index.html`.
pub const FALLBACK_INDEX_HTML: &str = concat!(
    "<!doctype html>\n",
    "<html lang=\"en\">\n",
    "<head><meta charset=\"utf-8\"><title>Dashboards</title></head>\n",
    "<body><div id=\"app\"></div><script type=\"module\" src=\"/app.js\"></script></body>\n",
    "</html>\n",
);

/// Shared application state. Clone is required by Axum; every field is
/// `Arc`-backed or `Copy`.
#[derive(Clone)]
pub struct AppState {
    pub dashboards: DashboardService,
    pub blocks: BlockService,
    pub save: SaveConfig,
    pub index_html: Arc<str>,
}

impl AppState {
    #[must_use]
    pub fn new(store: Arc<dyn RecordStore>, save: SaveConfig, index_html: Arc<str>) -> Self {
        Self {
            dashboards: DashboardService::new(store.clone()),
            blocks: BlockService::new(store),
            save,
            index_html,
        }
    }
}

/// Read `index.html` from the static directory, falling back to a minimal
/// shell so the server still starts without a built client.
pub async fn load_index_html(static_dir: &Path) -> Arc<str> {
    let path = static_dir.join("index.html");
    match tokio::fs::read_to_string(&path).await {
        Ok(html) => {
            info!(path = %path.display(), "loaded page shell");
            html.into()
        }
        Err(e) => {
            warn!(path = %path.display(), error = %e, "page shell missing; using fallback");
            FALLBACK_INDEX_HTML.into()
        }
    }
}

#[cfg(test)]
#[path = "state_test.rs"]
mod tests;
