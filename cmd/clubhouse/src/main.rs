//! Clubhouse server binary.
//!
//! Wires the adapters to the services and serves the API. The storage
//! backend is chosen at compile time: the default build runs on the
//! in-memory store, `--features db-postgres` persists to Postgres.

use std::sync::Arc;

use anyhow::Result;
use chrono::Duration;
use secrecy::ExposeSecret;
use tracing::info;
use tracing_subscriber::EnvFilter;

use api_adapters::{AppState, CookiePolicy, Ports};
use auth_adapters::{Argon2Verifier, MemorySessionStore};
use configs::AppConfig;

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = AppConfig::load()?;
    let ports = build_ports(&config).await?;
    let cookies = CookiePolicy {
        max_age_secs: config.session.ttl_secs,
        secure: config.session.secure_cookies,
    };
    let state = AppState::new(ports, cookies);

    if let Some(admin) = state
        .users
        .seed_admin_if_empty(config.seed.admin_password.expose_secret())
        .await?
    {
        info!(user_id = admin.id, "seeded initial admin account");
    }

    let addr = format!("{}:{}", config.http.host, config.http.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!(%addr, "clubhouse listening");
    axum::serve(listener, api_adapters::router(state)).await?;
    Ok(())
}

fn session_store(config: &AppConfig) -> Arc<MemorySessionStore> {
    Arc::new(MemorySessionStore::new(Duration::seconds(
        config.session.ttl_secs,
    )))
}

#[cfg(feature = "db-postgres")]
async fn build_ports(config: &AppConfig) -> Result<Ports> {
    use anyhow::Context;
    use storage_adapters::PgStore;

    let database = config
        .database
        .as_ref()
        .context("database.url is required for the Postgres backend")?;
    let store = PgStore::connect(database.url.expose_secret()).await?;
    store.migrate().await?;
    info!("connected to Postgres, migrations applied");

    let store = Arc::new(store);
    Ok(Ports {
        users: store.clone(),
        messages: store.clone(),
        pages: store.clone(),
        events: store.clone(),
        battles: store.clone(),
        announcements: store.clone(),
        settings: store,
        verifier: Arc::new(Argon2Verifier),
        sessions: session_store(config),
    })
}

#[cfg(not(feature = "db-postgres"))]
async fn build_ports(config: &AppConfig) -> Result<Ports> {
    use storage_adapters::MemoryStore;

    info!("running on the in-memory store; data is lost on shutdown");
    let store = Arc::new(MemoryStore::new());
    Ok(Ports {
        users: store.clone(),
        messages: store.clone(),
        pages: store.clone(),
        events: store.clone(),
        battles: store.clone(),
        announcements: store.clone(),
        settings: store,
        verifier: Arc::new(Argon2Verifier),
        sessions: session_store(config),
    })
}
