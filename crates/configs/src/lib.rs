//! Layered application configuration: defaults, an optional
//! `clubhouse.toml`, then `CLUBHOUSE__*` environment variables (loaded
//! through `.env` when present). Secrets stay wrapped in `SecretString`
//! so they never land in logs or debug output.

use secrecy::SecretString;
use serde::Deserialize;
use thiserror::Error;
use tracing::debug;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("configuration error: {0}")]
    Load(#[from] config::ConfigError),
}

#[derive(Debug, Clone, Deserialize)]
pub struct HttpConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    pub url: SecretString,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SessionConfig {
    /// Session lifetime in seconds. Also drives the login cookie's
    /// `Max-Age`.
    pub ttl_secs: i64,
    /// Mark login cookies `Secure`. Off by default for plain-HTTP local
    /// runs; turn on behind TLS.
    pub secure_cookies: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SeedConfig {
    /// Password for the bootstrap admin created on an empty user table.
    pub admin_password: SecretString,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub http: HttpConfig,
    /// Absent means the in-memory store (single-process deployments and
    /// tests); present means Postgres via the `db-postgres` feature.
    pub database: Option<DatabaseConfig>,
    pub session: SessionConfig,
    pub seed: SeedConfig,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        let settings = config::Config::builder()
            .set_default("http.host", "127.0.0.1")?
            .set_default("http.port", 8080)?
            .set_default("session.ttl_secs", 7 * 24 * 60 * 60)?
            .set_default("session.secure_cookies", false)?
            .set_default("seed.admin_password", "admin123")?
            .add_source(config::File::with_name("clubhouse").required(false))
            .add_source(config::Environment::with_prefix("CLUBHOUSE").separator("__"))
            .build()?;
        let app: Self = settings.try_deserialize()?;
        debug!(host = %app.http.host, port = app.http.port, "configuration loaded");
        Ok(app)
    }
}
