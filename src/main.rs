mod config;
mod db;
mod routes;
mod services;
mod state;
mod store;

#[cfg(test)]
mod test_helpers;

use std::sync::Arc;

use config::{AppConfig, StoreConfig};
use store::RecordStore;
use store::hosted::HostedStore;
use store::memory::MemoryStore;
use store::postgres::PgStore;

#[tokio::main]
async fn main() {
    // A missing .env is normal outside development.
    if let Err(e) = dotenvy::dotenv() {
        if !e.not_found() {
            eprintln!("failed to read .env: {e}");
        }
    }
    tracing_subscriber::fmt::init();

    let config = AppConfig::from_env().expect("invalid configuration");
    let store = build_store(&config.store).await;
    let index_html = state::load_index_html(&config.static_dir).await;
    let state = state::AppState::new(store, config.save, index_html);

    let app = routes::app(state, &config.static_dir);
    let port = config.port;
    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{port}"))
        .await
        .expect("failed to bind");

    tracing::info!(%port, debounce_ms = config.save.debounce_ms, "dashboards listening");
    axum::serve(listener, app).await.expect("server failed");
}

async fn build_store(config: &StoreConfig) -> Arc<dyn RecordStore> {
    match config {
        StoreConfig::Memory => {
            tracing::warn!("using in-memory record store; data is lost on restart");
            Arc::new(MemoryStore::new())
        }
        StoreConfig::Postgres { database_url, max_connections } => {
            let pool = db::init_pool(database_url, *max_connections)
                .await
                .expect("database init failed");
            tracing::info!(max_connections, "postgres record store ready");
            Arc::new(PgStore::new(pool))
        }
        StoreConfig::Hosted { base_url, project_id, public_key } => {
            let store = HostedStore::new(base_url, project_id, public_key).expect("record service client init failed");
            tracing::info!(%base_url, %project_id, "hosted record store ready");
            Arc::new(store)
        }
    }
}
