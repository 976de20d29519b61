//! Runtime settings from environment variables (`.env` is loaded by the binary via dotenvy).

use crate::error::ConfigError;
use std::net::SocketAddr;
use std::str::FromStr;
use url::Url;
use validator::Validate;

pub const DEFAULT_DATABASE_URL: &str = "postgres://localhost/directory";
pub const DEFAULT_BIND_ADDRESS: &str = "0.0.0.0:3000";
pub const DEFAULT_APP_URL: &str = "http://localhost:3000";
pub const DEFAULT_PAGE_SIZE: u32 = 15;

#[derive(Clone, Debug, Validate)]
pub struct Settings {
    #[validate(length(min = 1, message = "DATABASE_URL cannot be empty"))]
    pub database_url: String,
    pub bind_address: SocketAddr,
    /// Base URL for pagination links.
    pub app_url: Url,
    #[validate(range(min = 1, max = 1000, message = "PAGE_SIZE must be between 1 and 1000"))]
    pub page_size: u32,
    #[validate(range(min = 1, max = 100, message = "DB_MAX_CONNECTIONS must be between 1 and 100"))]
    pub db_max_connections: u32,
    pub run_migrations: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            database_url: DEFAULT_DATABASE_URL.to_string(),
            bind_address: SocketAddr::from(([0, 0, 0, 0], 3000)),
            app_url: Url::parse(DEFAULT_APP_URL).expect("default app url is valid"),
            page_size: DEFAULT_PAGE_SIZE,
            db_max_connections: 5,
            run_migrations: true,
        }
    }
}

impl Settings {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build settings from an arbitrary key lookup. Missing keys take defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let settings = Settings {
            database_url: lookup("DATABASE_URL").unwrap_or_else(|| DEFAULT_DATABASE_URL.into()),
            bind_address: parse_var(&lookup, "BIND_ADDRESS", DEFAULT_BIND_ADDRESS)?,
            app_url: parse_var(&lookup, "APP_URL", DEFAULT_APP_URL)?,
            page_size: parse_var(&lookup, "PAGE_SIZE", "15")?,
            db_max_connections: parse_var(&lookup, "DB_MAX_CONNECTIONS", "5")?,
            run_migrations: parse_var(&lookup, "RUN_MIGRATIONS", "true")?,
        };
        settings.validate()?;
        Ok(settings)
    }
}

fn parse_var<F, T>(lookup: &F, key: &'static str, default: &str) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: std::fmt::Display,
{
    let raw = lookup(key).unwrap_or_else(|| default.to_string());
    raw.trim().parse().map_err(|e: T::Err| ConfigError::Env {
        var: key,
        message: e.to_string(),
    })
}
