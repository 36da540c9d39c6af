use std::env;
use std::path::PathBuf;

use thiserror::Error;

const DEFAULT_DATABASE_URL: &str = "app.db";
const DEFAULT_ADDRESS: &str = "127.0.0.1";
const DEFAULT_PORT: u16 = 8080;
const DEFAULT_STATIC_DIR: &str = "./wwwroot";
const DEFAULT_UPLOADS_DIR: &str = "./wwwroot/uploads";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} environment variable not set")]
    Missing(&'static str),
}

/// Runtime settings shared with every handler.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub database_url: String,
    pub address: String,
    pub port: u16,
    /// HMAC secret bearer tokens are signed with.
    pub secret: String,
    /// Front-end bundle served for non-API paths.
    pub static_dir: PathBuf,
    /// Root of the attachment store, served under `/uploads`.
    pub uploads_dir: PathBuf,
}

impl ServerConfig {
    /// Read the configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let secret = lookup("SECRET_KEY")
            .filter(|value| !value.is_empty())
            .ok_or(ConfigError::Missing("SECRET_KEY"))?;

        let port = lookup("PORT")
            .and_then(|value| value.parse::<u16>().ok())
            .unwrap_or(DEFAULT_PORT);

        Ok(Self {
            database_url: lookup("DATABASE_URL").unwrap_or(DEFAULT_DATABASE_URL.to_string()),
            address: lookup("ADDRESS").unwrap_or(DEFAULT_ADDRESS.to_string()),
            port,
            secret,
            static_dir: lookup("STATIC_DIR")
                .unwrap_or(DEFAULT_STATIC_DIR.to_string())
                .into(),
            uploads_dir: lookup("UPLOADS_DIR")
                .unwrap_or(DEFAULT_UPLOADS_DIR.to_string())
                .into(),
        })
    }
}
