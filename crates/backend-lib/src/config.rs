// ============================
// authgate-backend/src/config.rs
// ============================
//! Configuration management.
//!
//! Sources are layered, later ones winning: built-in defaults, `config.toml`,
//! `config.<APP_ENV>.toml`, an optional explicit file, then `AUTHGATE_*`
//! environment variables (`__` separates nested keys, e.g.
//! `AUTHGATE_JWT__SECRET`).
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{bail, Result};
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

use crate::auth::{HashParams, ServerSecret, SESSION_TTL};
use crate::logging::LogFormat;

/// Environment variable selecting the deployment environment
pub const ENV_VAR: &str = "APP_ENV";

/// Prefix of environment variable overrides
pub const ENV_PREFIX: &str = "AUTHGATE_";

/// Signing secret used when none is configured. Refused in production.
pub const DEV_SECRET: &str = "dev-secret-key";

/// Shortest secret accepted in production
const MIN_PRODUCTION_SECRET_LEN: usize = 16;

const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// Deployment environment
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    Development,
    Production,
}

impl Environment {
    /// Read `APP_ENV`, defaulting to development
    pub fn from_env() -> Self {
        Self::parse(std::env::var(ENV_VAR).ok().as_deref().unwrap_or_default())
    }

    pub fn parse(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "production" | "prod" | "release" => Environment::Production,
            _ => Environment::Development,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Environment::Development => "development",
            Environment::Production => "production",
        }
    }
}

/// Application settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Server bind address
    pub bind_addr: SocketAddr,
    /// Data directory path
    pub data_dir: PathBuf,
    /// Log level
    pub log_level: String,
    pub log_format: LogFormat,
    pub jwt: JwtSettings,
    /// Scrypt cost for new password hashes
    pub password: HashParams,
    /// Create the `admin` user at startup if missing
    pub seed_admin: bool,
    pub admin_password: String,
    /// Allow any origin; meant for local development
    pub cors_permissive: bool,
}

/// Token signing settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct JwtSettings {
    pub secret: String,
    /// Session TTL in seconds
    pub ttl_secs: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([127, 0, 0, 1], 8080)),
            data_dir: PathBuf::from("data"),
            log_level: "info".to_string(),
            log_format: LogFormat::Text,
            jwt: JwtSettings::default(),
            password: HashParams::default(),
            seed_admin: true,
            admin_password: "admin123".to_string(),
            cors_permissive: false,
        }
    }
}

impl Default for JwtSettings {
    fn default() -> Self {
        Self {
            secret: DEV_SECRET.to_string(),
            ttl_secs: SESSION_TTL.as_secs(),
        }
    }
}

impl Settings {
    /// Layered sources for `env`, plus an optional explicit file
    pub fn figment(env: Environment, extra: Option<&Path>) -> Figment {
        let mut figment = Figment::from(Serialized::defaults(Settings::default()))
            .merge(Toml::file("config.toml"))
            .merge(Toml::file(format!("config.{}.toml", env.name())));
        if let Some(path) = extra {
            figment = figment.merge(Toml::file(path));
        }
        figment.merge(Env::prefixed(ENV_PREFIX).split("__"))
    }

    /// Load settings, layering `extra` above the standard files
    pub fn load_from(extra: Option<&Path>) -> Result<Self> {
        let settings: Settings = Self::figment(Environment::from_env(), extra).extract()?;
        Ok(settings)
    }

    /// Reject settings the service must not start with
    pub fn validate(&self, env: Environment) -> Result<()> {
        if !LOG_LEVELS.contains(&self.log_level.to_ascii_lowercase().as_str()) {
            bail!("unknown log level {:?}", self.log_level);
        }
        if self.jwt.ttl_secs == 0 {
            bail!("jwt.ttl_secs must be greater than zero");
        }
        if self.jwt.secret.is_empty() {
            bail!("jwt.secret must not be empty");
        }
        if env == Environment::Production {
            if self.jwt.secret == DEV_SECRET {
                bail!("jwt.secret must be changed from the development default in production");
            }
            if self.jwt.secret.len() < MIN_PRODUCTION_SECRET_LEN {
                bail!("jwt.secret must be at least {MIN_PRODUCTION_SECRET_LEN} bytes in production");
            }
        }
        self.password.to_scrypt()?;
        Ok(())
    }

    pub fn server_secret(&self) -> ServerSecret {
        ServerSecret::from(self.jwt.secret.as_str())
    }

    pub fn session_ttl(&self) -> Duration {
        Duration::from_secs(self.jwt.ttl_secs)
    }
}
