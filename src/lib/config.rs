use crate::domain::audit::DEFAULT_SENTINEL;
use crate::outbound::mysql::{DEFAULT_HOST, DEFAULT_PORT, MySqlSettings};
use anyhow::Context;
use std::path::PathBuf;

#[derive(Debug, Clone)]
pub struct Config {
    pub log_level: tracing::Level,
    pub log_dir: PathBuf,
    pub sentinel_marker: String,
    pub mysql: MySqlSettings,
}

const LOG_LEVEL_KEY: &str = "LOG_LEVEL";
const LOG_DIR_KEY: &str = "LOG_DIR";
const SENTINEL_MARKER_KEY: &str = "SENTINEL_MARKER";

const MYSQL_HOST_KEY: &str = "MYSQL_HOST";
const MYSQL_PORT_KEY: &str = "MYSQL_PORT";
const MYSQL_USER_KEY: &str = "MYSQL_USER";
const MYSQL_PASSWORD_KEY: &str = "MYSQL_PASSWORD";

const DEFAULT_LOG_DIR: &str = "log";

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let log_level = match lookup(LOG_LEVEL_KEY) {
            Some(level) => level
                .parse::<tracing::Level>()
                .with_context(|| format!("invalid {}: {}", LOG_LEVEL_KEY, level))?,
            None => tracing::Level::INFO,
        };
        let log_dir = lookup(LOG_DIR_KEY)
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_LOG_DIR));
        let sentinel_marker =
            lookup(SENTINEL_MARKER_KEY).unwrap_or_else(|| DEFAULT_SENTINEL.to_string());

        let port = match lookup(MYSQL_PORT_KEY) {
            Some(port) => port
                .parse::<u16>()
                .with_context(|| format!("invalid {}: {}", MYSQL_PORT_KEY, port))?,
            None => DEFAULT_PORT,
        };
        let mysql = MySqlSettings {
            host: lookup(MYSQL_HOST_KEY).unwrap_or_else(|| DEFAULT_HOST.to_string()),
            port,
            user: lookup(MYSQL_USER_KEY).unwrap_or_default(),
            password: lookup(MYSQL_PASSWORD_KEY),
        };

        Ok(Self {
            log_level,
            log_dir,
            sentinel_marker,
            mysql,
        })
    }
}
