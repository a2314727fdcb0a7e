use std::env;
use thiserror::Error;

pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8080";
pub const DEFAULT_ADMIN_USERNAME: &str = "admin@admin.com";
pub const DEFAULT_USER_ID_PREFIX: &str = "2025";

/// AppConfig
///
/// Immutable once loaded and shared with every request through the
/// application state.
///
/// The token signing secret is not configurable: it is generated in memory at
/// startup and never persisted.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Runtime environment marker. Selects log format and which settings are mandatory.
    pub env: Env,
    /// Postgres connection string. `None` runs on in-memory stores (local only).
    pub db_url: Option<String>,
    /// Socket address the HTTP server binds to.
    pub bind_addr: String,
    /// Signing up with this username (case-insensitive) always yields an ADMIN account.
    pub admin_username: String,
    /// Prepended to the zero-padded "user" sequence value to form account ids.
    pub user_id_prefix: String,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Env {
    Local,
    Production,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} must be set in production")]
    Missing(&'static str),
}

impl Default for AppConfig {
    /// Safe values for tests: local mode, in-memory stores.
    fn default() -> Self {
        Self {
            env: Env::Local,
            db_url: None,
            bind_addr: DEFAULT_BIND_ADDR.to_string(),
            admin_username: DEFAULT_ADMIN_USERNAME.to_string(),
            user_id_prefix: DEFAULT_USER_ID_PREFIX.to_string(),
        }
    }
}

impl AppConfig {
    /// load
    ///
    /// Reads the configuration from the process environment. Production
    /// refuses to start without `DATABASE_URL`; local mode falls back to
    /// in-memory stores.
    pub fn load() -> Result<Self, ConfigError> {
        let env = match env::var("APP_ENV").as_deref() {
            Ok("production") => Env::Production,
            _ => Env::Local,
        };

        let db_url = non_empty_var("DATABASE_URL");
        if env == Env::Production && db_url.is_none() {
            return Err(ConfigError::Missing("DATABASE_URL"));
        }

        Ok(Self {
            env,
            db_url,
            bind_addr: non_empty_var("BIND_ADDR").unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string()),
            admin_username: non_empty_var("ADMIN_USERNAME")
                .unwrap_or_else(|| DEFAULT_ADMIN_USERNAME.to_string()),
            user_id_prefix: non_empty_var("USER_ID_PREFIX")
                .unwrap_or_else(|| DEFAULT_USER_ID_PREFIX.to_string()),
        })
    }
}

fn non_empty_var(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}
