//! contacts-api server: settings from the environment, PostgreSQL or in-memory storage, axum on tokio.

use contacts_api::{app, ensure_database_exists, ensure_schema, load_api_config, AppState, MemoryStore, PgStore, Settings, Store, StoreKind};
use std::path::Path;
use std::sync::Arc;
use tokio::net::TcpListener;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("contacts_api=info,tower_http=info")),
        )
        .init();

    let mut settings = Settings::from_env()?;
    // A policy file replaces the policy read from DEFAULT_* variables.
    if let Ok(path) = std::env::var("API_CONFIG_PATH") {
        settings.api = load_api_config(Path::new(&path)).await?;
    }

    let store: Arc<dyn Store> = match settings.store {
        StoreKind::Memory => {
            tracing::warn!("using the in-memory store; data is lost on exit");
            Arc::new(MemoryStore::new())
        }
        StoreKind::Postgres => {
            ensure_database_exists(&settings.database_url).await?;
            let pool = sqlx::postgres::PgPoolOptions::new()
                .max_connections(settings.max_connections)
                .connect(&settings.database_url)
                .await?;
            ensure_schema(&pool).await?;
            Arc::new(PgStore::new(pool))
        }
    };

    tracing::info!(
        paginator = ?settings.api.default_paginator,
        page_size = settings.api.default_page_size,
        max_page_size = settings.api.maximum_page_size,
        caching = settings.api.default_caching,
        "api policy loaded"
    );
    let state = AppState::new(store, settings.api.clone());
    let router = app(state, settings.max_body_bytes);

    let listener = TcpListener::bind(&settings.bind_addr).await?;
    tracing::info!("contacts-api listening on http://{}", listener.local_addr()?);
    axum::serve(listener, router).await?;
    Ok(())
}
