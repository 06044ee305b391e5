use std::env;

use auth::jwt::MIN_SECRET_LENGTH;
use chrono::Duration;
use config::Config as ConfigBuilder;
use config::ConfigError;
use config::Environment;
use config::File;
use serde::Deserialize;

/// Longest accepted access token lifetime (one year).
const MAX_ACCESS_TOKEN_TTL_HOURS: i64 = 24 * 365;

/// Longest accepted refresh token lifetime (ten years).
const MAX_REFRESH_TOKEN_TTL_DAYS: i64 = 3650;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub database: DatabaseConfig,
    pub server: ServerConfig,
    pub jwt: JwtConfig,
    pub session: SessionConfig,
    pub storage: StorageConfig,
    pub notifier: NotifierConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub acquire_timeout_secs: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub http_port: u16,
}

#[derive(Deserialize, Clone)]
pub struct JwtConfig {
    pub secret: String,
    pub access_token_ttl_hours: i64,
}

impl JwtConfig {
    pub fn access_token_ttl(&self) -> Duration {
        Duration::hours(self.access_token_ttl_hours)
    }
}

// The signing secret must never reach the logs.
impl std::fmt::Debug for JwtConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtConfig")
            .field("secret", &"<redacted>")
            .field("access_token_ttl_hours", &self.access_token_ttl_hours)
            .finish()
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct SessionConfig {
    pub refresh_token_ttl_days: i64,
}

impl SessionConfig {
    pub fn refresh_token_ttl(&self) -> Duration {
        Duration::days(self.refresh_token_ttl_days)
    }
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    Postgres,
    Memory,
}

#[derive(Debug, Deserialize, Clone)]
pub struct StorageConfig {
    pub backend: StorageBackend,
}

#[derive(Debug, Deserialize, Clone)]
pub struct NotifierConfig {
    pub queue_capacity: usize,
}

impl Config {
    /// Load configuration from files with environment variable overrides
    ///
    /// Priority (highest to lowest):
    /// 1. Environment variables (DATABASE__URL, JWT__SECRET, etc.)
    /// 2. Environment-specific config file (config/{environment}.toml)
    /// 3. Default config file (config/default.toml)
    ///
    /// No file carries a signing secret: `JWT__SECRET` must be provided.
    ///
    /// # Errors
    /// Sources cannot be read or deserialized, or `validate` fails
    pub fn load() -> Result<Self, ConfigError> {
        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".to_string());

        let configuration = ConfigBuilder::builder()
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{}", run_mode)).required(false))
            // Example: JWT__SECRET=... overrides jwt.secret
            .add_source(Environment::default().separator("__"))
            .build()?;

        let config: Config = configuration.try_deserialize()?;
        config.validate()?;

        Ok(config)
    }

    /// Reject settings the service cannot run with.
    ///
    /// # Errors
    /// * Signing secret shorter than 32 bytes
    /// * Token lifetimes that are not positive or exceed their upper bound
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.jwt.secret.len() < MIN_SECRET_LENGTH {
            return Err(ConfigError::Message(format!(
                "jwt.secret must be set through JWT__SECRET and be at least {} bytes",
                MIN_SECRET_LENGTH
            )));
        }

        if !(1..=MAX_ACCESS_TOKEN_TTL_HOURS).contains(&self.jwt.access_token_ttl_hours) {
            return Err(ConfigError::Message(format!(
                "jwt.access_token_ttl_hours must be between 1 and {}, got {}",
                MAX_ACCESS_TOKEN_TTL_HOURS, self.jwt.access_token_ttl_hours
            )));
        }

        if !(1..=MAX_REFRESH_TOKEN_TTL_DAYS).contains(&self.session.refresh_token_ttl_days) {
            return Err(ConfigError::Message(format!(
                "session.refresh_token_ttl_days must be between 1 and {}, got {}",
                MAX_REFRESH_TOKEN_TTL_DAYS, self.session.refresh_token_ttl_days
            )));
        }

        Ok(())
    }
}
