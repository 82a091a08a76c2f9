use std::net::SocketAddr;

use anyhow::Context;

const DEFAULT_CONFLICT_RETRIES: usize = 3;

pub struct ServerConfig {
    pub addr: SocketAddr,
    /// `None` runs against the in-memory store.
    pub database_url: Option<String>,
    pub conflict_retries: usize,
}

impl ServerConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let host = std::env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port: u16 = std::env::var("PORT")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(8001);
        let addr: SocketAddr = format!("{}:{}", host, port)
            .parse()
            .with_context(|| format!("invalid HOST/PORT {}:{}", host, port))?;

        let database_url = std::env::var("DATABASE_URL")
            .ok()
            .filter(|url| !url.trim().is_empty());

        let conflict_retries = match std::env::var("CONFLICT_RETRIES") {
            Ok(raw) => raw
                .trim()
                .parse()
                .with_context(|| format!("CONFLICT_RETRIES must be a count, got {raw:?}"))?,
            Err(_) => DEFAULT_CONFLICT_RETRIES,
        };

        Ok(Self {
            addr,
            database_url,
            conflict_retries,
        })
    }
}
