//! Process configuration, read from environment variables.

use std::{env, fmt::Display, net::SocketAddr, str::FromStr};

use anyhow::anyhow;

pub const BIND_ADDR_ENV: &str = "WAREHOUSE_BIND_ADDR";
pub const DATABASE_URL_ENV: &str = "DATABASE_URL";
pub const DB_MAX_CONNECTIONS_ENV: &str = "WAREHOUSE_DB_MAX_CONNECTIONS";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub bind_addr: SocketAddr,
    /// Postgres connection string; the in-memory store is used when absent.
    pub database_url: Option<String>,
    pub db_max_connections: u32,
}

impl Config {
    pub fn load() -> anyhow::Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build a config from an arbitrary key lookup (the environment in production).
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        Ok(Self {
            bind_addr: try_load(&lookup, BIND_ADDR_ENV, "0.0.0.0:8080")?,
            database_url: lookup(DATABASE_URL_ENV).filter(|url| !url.trim().is_empty()),
            db_max_connections: try_load(&lookup, DB_MAX_CONNECTIONS_ENV, "5")?,
        })
    }
}

fn try_load<T: FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
    default: &str,
) -> anyhow::Result<T>
where
    T::Err: Display,
{
    let raw = lookup(key).unwrap_or_else(|| {
        tracing::info!("{key} not set, using default: {default}");
        default.to_string()
    });

    raw.trim()
        .parse()
        .map_err(|e| anyhow!("invalid {key} value {raw:?}: {e}"))
}
