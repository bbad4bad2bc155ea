//! One-shot provisioning tool: applies migrations and creates the initial
//! admin account if the user table is empty. Safe to run repeatedly.

use std::sync::Arc;

use anyhow::{Context, Result};
use secrecy::ExposeSecret;

use auth_adapters::Argon2Verifier;
use configs::AppConfig;
use services::UserService;
use storage_adapters::PgStore;

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let config = AppConfig::load()?;
    let database = config
        .database
        .as_ref()
        .context("database.url must be configured to seed Postgres")?;

    let store = PgStore::connect(database.url.expose_secret()).await?;
    store.migrate().await?;
    println!("migrations applied");

    let users = UserService::new(Arc::new(store), Arc::new(Argon2Verifier));
    match users
        .seed_admin_if_empty(config.seed.admin_password.expose_secret())
        .await?
    {
        Some(admin) => println!("seeded admin account (id {})", admin.id),
        None => println!("users already present, nothing to seed"),
    }
    Ok(())
}
