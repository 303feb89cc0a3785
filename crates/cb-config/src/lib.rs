//! # cb-config
//!
//! Layered runtime settings for Complaint Box.
//!
//! Sources, later ones winning:
//! 1. built-in defaults
//! 2. `config/default.{toml,yaml,json}` if present
//! 3. environment variables (a `.env` file is loaded first), prefixed `CB`
//!    with `__` between segments, e.g. `CB__AUTH__JWT_SECRET`

use config::builder::DefaultState;
use config::{Config, ConfigBuilder, Environment, File};
use secrecy::SecretString;
use serde::Deserialize;
use thiserror::Error;
use tracing::debug;

#[derive(Error, Debug)]
pub enum SettingsError {
    #[error("failed to load settings: {0}")]
    Load(#[from] config::ConfigError),
}

#[derive(Debug, Deserialize)]
pub struct Settings {
    /// `production` turns on `Secure` cookies.
    pub environment: String,
    pub server: ServerSettings,
    pub database: DatabaseSettings,
    pub auth: AuthSettings,
    pub cors: CorsSettings,
    pub log: LogSettings,
}

#[derive(Debug, Deserialize)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Deserialize)]
pub struct DatabaseSettings {
    pub url: String,
    pub max_connections: u32,
}

#[derive(Debug, Deserialize)]
pub struct AuthSettings {
    pub jwt_secret: SecretString,
    pub token_ttl_hours: i64,
}

#[derive(Debug, Deserialize)]
pub struct CorsSettings {
    /// The front-end origin allowed to send credentialed requests.
    pub allowed_origin: String,
}

#[derive(Debug, Deserialize)]
pub struct LogSettings {
    pub json: bool,
}

impl Settings {
    /// Loads `.env`, the optional config file and the environment on top of defaults.
    pub fn load() -> Result<Self, SettingsError> {
        dotenvy::dotenv().ok();

        let builder = Self::defaults()?
            .add_source(File::with_name("config/default").required(false))
            .add_source(
                Environment::with_prefix("CB")
                    .separator("__")
                    .try_parsing(true),
            );
        Self::from_builder(builder)
    }

    /// Built-in defaults. `auth.jwt_secret` deliberately has none.
    pub fn defaults() -> Result<ConfigBuilder<DefaultState>, SettingsError> {
        Ok(Config::builder()
            .set_default("environment", "development")?
            .set_default("server.host", "0.0.0.0")?
            .set_default("server.port", 3000_i64)?
            .set_default("database.url", "sqlite:complaints.db?mode=rwc")?
            .set_default("database.max_connections", 5_i64)?
            .set_default("auth.token_ttl_hours", 24_i64)?
            .set_default("cors.allowed_origin", "http://localhost:5173")?
            .set_default("log.json", false)?)
    }

    pub fn from_builder(builder: ConfigBuilder<DefaultState>) -> Result<Self, SettingsError> {
        let settings: Settings = builder.build()?.try_deserialize()?;
        debug!(
            environment = %settings.environment,
            port = settings.server.port,
            "settings loaded"
        );
        Ok(settings)
    }

    pub fn is_production(&self) -> bool {
        self.environment.eq_ignore_ascii_case("production")
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}
