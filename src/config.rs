use std::env;

use sqlx::postgres::PgConnectOptions;

use crate::{Error, Result, DEFAULT_BASE_URL, DEFAULT_EXPORT_PATH, DEFAULT_QUERY};

/// Everything the run needs from the environment, read once at startup.
/// Loading `.env` files is the caller's job; this only consumes whatever
/// is already in the process environment.
#[derive(Debug, Clone)]
pub struct Config {
    pub base_url: String,
    pub query: String,
    pub export_path: String,
    /// Explicit Chrome/Chromium binary, if the default discovery isn't enough.
    pub chrome_path: Option<String>,
    pub db: DbConfig,
}

#[derive(Debug, Clone)]
pub struct DbConfig {
    pub host: String,
    pub name: String,
    pub user: String,
    pub password: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            base_url: env_or("SCRAPE_URL", DEFAULT_BASE_URL),
            query: env_or("SCRAPE_QUERY", DEFAULT_QUERY),
            export_path: env_or("EXPORT_PATH", DEFAULT_EXPORT_PATH),
            chrome_path: env::var("CHROME_PATH").ok(),
            db: DbConfig::from_env()?,
        })
    }
}

impl DbConfig {
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            host: require("DB_HOST")?,
            name: require("DB_NAME")?,
            user: require("DB_USER")?,
            password: require("DB_PASS")?,
        })
    }

    /// Discrete fields instead of a connection URL, so credentials never
    /// need percent-escaping.
    pub fn connect_options(&self) -> PgConnectOptions {
        PgConnectOptions::new()
            .host(&self.host)
            .database(&self.name)
            .username(&self.user)
            .password(&self.password)
    }
}

fn env_or(var: &str, default: &str) -> String {
    env::var(var).unwrap_or_else(|_| default.to_owned())
}

fn require(var: &'static str) -> Result<String> {
    env::var(var).map_err(|_| Error::ConfigMissingVar(var))
}
