//! services/web/src/config.rs
//!
//! Defines the application's configuration structure and loading logic.
//!
//! All configuration is loaded from environment variables at startup. The `.env`
//! file is used for local development.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;
use tracing::Level;

/// Shortest accepted session signing secret, in bytes.
pub const SESSION_SECRET_MIN_BYTES: usize = 64;

/// A custom error type for configuration loading failures.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing the environment variable {0}")]
    MissingVar(String),
    #[error("Invalid value for the environment variable {0}: {1}")]
    InvalidValue(String, String),
}

/// Holds all configuration loaded from the environment at startup.
#[derive(Clone, Debug)]
pub struct Config {
    pub bind_address: SocketAddr,
    pub database_url: String,
    pub log_level: Level,
    pub static_dir: PathBuf,
    pub db_max_connections: u32,
    pub db_timeout: Duration,
    pub session: SessionConfig,
}

/// Cookie and lifetime settings for the session layer.
#[derive(Clone)]
pub struct SessionConfig {
    /// Signing key material; `None` means a random key per process.
    pub secret: Option<Vec<u8>>,
    pub lifetime: Duration,
    pub secure_cookie: bool,
}

impl std::fmt::Debug for SessionConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionConfig")
            .field("secret", &self.secret.as_ref().map(|_| "<redacted>"))
            .field("lifetime", &self.lifetime)
            .field("secure_cookie", &self.secure_cookie)
            .finish()
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            secret: None,
            lifetime: Duration::from_secs(12 * 60 * 60),
            secure_cookie: true,
        }
    }
}

impl Config {
    /// Loads configuration from environment variables.
    ///
    /// It will look for a `.env` file in the current directory for development,
    /// but this is skipped in test environments to ensure tests are hermetic.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Only load from .env in non-test mode to avoid contamination.
        if !cfg!(test) {
            dotenvy::dotenv().ok();
        }
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the configuration from any key lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        // --- Load Server and Database Settings ---
        let bind_address_str =
            lookup("BIND_ADDRESS").unwrap_or_else(|| "0.0.0.0:4000".to_string());
        let bind_address = bind_address_str.parse::<SocketAddr>().map_err(|e| {
            ConfigError::InvalidValue("BIND_ADDRESS".to_string(), e.to_string())
        })?;

        let database_url = lookup("DATABASE_URL")
            .ok_or_else(|| ConfigError::MissingVar("DATABASE_URL".to_string()))?;

        let log_level_str = lookup("RUST_LOG").unwrap_or_else(|| "INFO".to_string());
        let log_level = log_level_str.parse::<Level>().map_err(|_| {
            ConfigError::InvalidValue(
                "RUST_LOG".to_string(),
                format!("'{}' is not a valid log level", log_level_str),
            )
        })?;

        let static_dir = lookup("STATIC_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("./ui/static"));

        let db_max_connections = parse_or(&lookup, "DB_MAX_CONNECTIONS", 5u32)?;
        let db_timeout = Duration::from_secs(parse_or(&lookup, "DB_TIMEOUT_SECS", 3u64)?);

        // --- Load Session Settings ---
        let secret = match lookup("SESSION_SECRET") {
            Some(secret) if secret.len() < SESSION_SECRET_MIN_BYTES => {
                return Err(ConfigError::InvalidValue(
                    "SESSION_SECRET".to_string(),
                    format!("must be at least {SESSION_SECRET_MIN_BYTES} bytes"),
                ))
            }
            Some(secret) => Some(secret.into_bytes()),
            None => None,
        };
        let lifetime_hours = parse_or(&lookup, "SESSION_LIFETIME_HOURS", 12u64)?;
        let lifetime_secs = lifetime_hours.checked_mul(60 * 60).ok_or_else(|| {
            ConfigError::InvalidValue(
                "SESSION_LIFETIME_HOURS".to_string(),
                format!("{lifetime_hours} hours is out of range"),
            )
        })?;
        let secure_cookie = parse_or(&lookup, "SESSION_SECURE_COOKIE", true)?;

        Ok(Self {
            bind_address,
            database_url,
            log_level,
            static_dir,
            db_max_connections,
            db_timeout,
            session: SessionConfig {
                secret,
                lifetime: Duration::from_secs(lifetime_secs),
                secure_cookie,
            },
        })
    }
}

fn parse_or<T>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
    default: T,
) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(key) {
        Some(raw) => raw
            .parse::<T>()
            .map_err(|e| ConfigError::InvalidValue(key.to_string(), e.to_string())),
        None => Ok(default),
    }
}
